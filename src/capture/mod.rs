//! Packet capture boundary
//!
//! The rest of the engine only sees `PacketMeta`; everything about
//! devices, pcap handles and raw frames stays behind the
//! `PacketCapture` trait.

pub mod iface;
pub mod parser;

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::PacketMeta;
use crate::error::{FlowSentryError, Result};

pub use iface::choose_interface;
pub use parser::parse_frame;

/// Capture configuration (`[capture]` section of the config file).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Interface override; when unset the device is auto-selected.
    pub interface: Option<String>,
    /// Snapshot length
    pub snaplen: i32,
    /// Enable promiscuous mode
    pub promiscuous: bool,
    /// pcap read timeout in milliseconds
    pub timeout_ms: i32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interface: None,
            snaplen: 65535,
            promiscuous: true,
            timeout_ms: 100,
        }
    }
}

/// A source of parsed packet metadata.
///
/// `next_packet` returning `Ok(None)` means "nothing right now" (read
/// timeout, or a frame that was filtered out); the ingestion loop just
/// calls again.
pub trait PacketCapture: Send {
    fn next_packet(&mut self) -> Result<Option<PacketMeta>>;
}

/// Live capture from a network device via libpcap.
pub struct PcapCapture {
    capture: pcap::Capture<pcap::Active>,
    interface: String,
}

impl PcapCapture {
    /// Open the configured (or auto-selected) device for live capture.
    pub fn open(config: &CaptureConfig) -> Result<Self> {
        let device = choose_interface(config)?;
        let interface = device.name.clone();

        let capture = pcap::Capture::from_device(device)
            .map_err(|e| FlowSentryError::Capture(e.to_string()))?
            .promisc(config.promiscuous)
            .snaplen(config.snaplen)
            .timeout(config.timeout_ms)
            .open()
            .map_err(|e| FlowSentryError::Capture(e.to_string()))?;

        info!("Capturing on interface {}", interface);
        Ok(Self { capture, interface })
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }
}

impl PacketCapture for PcapCapture {
    fn next_packet(&mut self) -> Result<Option<PacketMeta>> {
        let packet = match self.capture.next_packet() {
            Ok(packet) => packet,
            Err(pcap::Error::TimeoutExpired) => return Ok(None),
            Err(e) => return Err(FlowSentryError::Capture(e.to_string())),
        };

        let ts = Utc
            .timestamp_opt(
                packet.header.ts.tv_sec as i64,
                (packet.header.ts.tv_usec as u32).saturating_mul(1000),
            )
            .single()
            .unwrap_or_else(Utc::now);

        // Non-IP frames parse to None: filtered, not an error.
        Ok(parse_frame(packet.data, ts))
    }
}
