//! Flow identity: normalized 5-tuple keys and per-packet observations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use super::packet::{IpProtocol, PacketMeta, TcpFlags};

/// Port that multicast/broadcast flows are normalized to (mDNS convention).
pub const MDNS_PORT: u16 = 5353;

/// A flow endpoint address.
///
/// Multicast and broadcast destinations collapse into the single
/// `Multicast` bucket so chatty discovery traffic cannot explode the
/// flow table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowAddr {
    Ip(IpAddr),
    Multicast,
}

impl FlowAddr {
    /// Normalize a destination address: 224.0.0.0/8 and the limited
    /// broadcast address map to the `Multicast` bucket.
    pub fn normalize_dst(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(v4) if v4.octets()[0] == 224 || v4.is_broadcast() => FlowAddr::Multicast,
            other => FlowAddr::Ip(other),
        }
    }

    /// True for the multicast bucket and for IPv4 addresses ending in
    /// .255 (directed broadcast), the destinations the broadcast-storm
    /// classifier rule applies to.
    pub fn is_broadcast_like(&self) -> bool {
        match self {
            FlowAddr::Multicast => true,
            FlowAddr::Ip(IpAddr::V4(v4)) => v4.octets()[3] == 255,
            FlowAddr::Ip(IpAddr::V6(_)) => false,
        }
    }
}

impl std::fmt::Display for FlowAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowAddr::Ip(ip) => write!(f, "{}", ip),
            FlowAddr::Multicast => write!(f, "MULTICAST"),
        }
    }
}

impl From<IpAddr> for FlowAddr {
    fn from(addr: IpAddr) -> Self {
        FlowAddr::Ip(addr)
    }
}

/// Normalized 5-tuple identifying a flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowKey {
    pub src: FlowAddr,
    pub dst: FlowAddr,
    pub src_port: u16,
    pub dst_port: u16,
    pub protocol: IpProtocol,
}

impl FlowKey {
    /// Build the flow key for a packet.
    ///
    /// Ports come from the transport header (already 0 in `PacketMeta`
    /// for non-TCP/UDP packets). Multicast/broadcast normalization runs
    /// after port extraction and overwrites both ports with 5353.
    pub fn from_meta(meta: &PacketMeta) -> Self {
        let dst = FlowAddr::normalize_dst(meta.dst_ip);
        let (src_port, dst_port) = if dst == FlowAddr::Multicast {
            (MDNS_PORT, MDNS_PORT)
        } else {
            (meta.src_port, meta.dst_port)
        };

        Self {
            src: FlowAddr::Ip(meta.src_ip),
            dst,
            src_port,
            dst_port,
            protocol: meta.protocol,
        }
    }
}

impl std::fmt::Display for FlowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{} ({})",
            self.src, self.src_port, self.dst, self.dst_port, self.protocol
        )
    }
}

/// One packet as observed by a flow record.
#[derive(Debug, Clone)]
pub struct PacketObservation {
    pub timestamp: DateTime<Utc>,
    pub byte_len: u32,
    /// TCP flag bit-set; `None` for non-TCP packets
    pub tcp_flags: Option<TcpFlags>,
}

impl PacketObservation {
    pub fn from_meta(meta: &PacketMeta) -> Self {
        Self {
            timestamp: meta.timestamp,
            byte_len: meta.raw_len,
            tcp_flags: meta.tcp_flags,
        }
    }
}
