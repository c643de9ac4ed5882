//! Raw frame -> `PacketMeta` parsing via etherparse.

use chrono::{DateTime, Utc};
use etherparse::SlicedPacket;

use crate::core::{IpProtocol, PacketMeta, TcpFlags};

/// Parse one ethernet frame into packet metadata.
///
/// Returns `None` for frames without an IP layer (ARP and friends) and
/// for frames etherparse rejects as malformed. Both are filtering
/// outcomes, never errors.
pub fn parse_frame(data: &[u8], timestamp: DateTime<Utc>) -> Option<PacketMeta> {
    let sliced = SlicedPacket::from_ethernet(data).ok()?;

    let (src_ip, dst_ip, protocol) = match &sliced.net {
        Some(etherparse::NetSlice::Ipv4(ipv4)) => {
            let header = ipv4.header();
            (
                header.source_addr().into(),
                header.destination_addr().into(),
                IpProtocol::from(header.protocol().0),
            )
        }
        Some(etherparse::NetSlice::Ipv6(ipv6)) => {
            let header = ipv6.header();
            (
                header.source_addr().into(),
                header.destination_addr().into(),
                IpProtocol::from(header.next_header().0),
            )
        }
        _ => return None,
    };

    let mut meta = PacketMeta {
        timestamp,
        src_ip,
        dst_ip,
        protocol,
        src_port: 0,
        dst_port: 0,
        tcp_flags: None,
        raw_len: data.len() as u32,
    };

    match &sliced.transport {
        Some(etherparse::TransportSlice::Tcp(tcp)) => {
            meta.src_port = tcp.source_port();
            meta.dst_port = tcp.destination_port();
            meta.tcp_flags = Some(TcpFlags {
                fin: tcp.fin(),
                syn: tcp.syn(),
                rst: tcp.rst(),
                psh: tcp.psh(),
                ack: tcp.ack(),
                urg: tcp.urg(),
                ece: tcp.ece(),
                cwr: tcp.cwr(),
            });
        }
        Some(etherparse::TransportSlice::Udp(udp)) => {
            meta.src_port = udp.source_port();
            meta.dst_port = udp.destination_port();
        }
        _ => {}
    }

    Some(meta)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Ethernet + IPv4 + TCP SYN, hand-assembled
    fn make_tcp_syn_frame() -> Vec<u8> {
        let mut pkt = vec![
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, // dst mac
            0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, // src mac
            0x08, 0x00, // ethertype IPv4
        ];

        // IPv4 header (20 bytes)
        pkt.extend_from_slice(&[
            0x45, // version=4, ihl=5
            0x00, // dscp/ecn
            0x00, 0x28, // total length (40)
            0x12, 0x34, // identification
            0x40, 0x00, // flags (DF), fragment offset
            0x40, // TTL
            0x06, // protocol TCP
            0x00, 0x00, // checksum (ignored)
            192, 168, 1, 100, // src IP
            10, 0, 0, 1, // dst IP
        ]);

        // TCP header (20 bytes) - SYN
        pkt.extend_from_slice(&[
            0x30, 0x39, // src port 12345
            0x00, 0x50, // dst port 80
            0x00, 0x00, 0x00, 0x01, // seq
            0x00, 0x00, 0x00, 0x00, // ack
            0x50, 0x02, // data offset=5, flags=SYN
            0xff, 0xff, // window
            0x00, 0x00, // checksum
            0x00, 0x00, // urgent pointer
        ]);

        pkt
    }

    // Ethernet + ARP request: no IP layer
    fn make_arp_frame() -> Vec<u8> {
        let mut pkt = vec![
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // broadcast
            0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, // src mac
            0x08, 0x06, // ethertype ARP
        ];
        pkt.extend_from_slice(&[
            0x00, 0x01, // hardware type
            0x08, 0x00, // protocol type
            0x06, 0x04, // sizes
            0x00, 0x01, // opcode request
            0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, // sender mac
            192, 168, 1, 1, // sender ip
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // target mac
            192, 168, 1, 2, // target ip
        ]);
        pkt
    }

    #[test]
    fn test_parse_tcp_syn() {
        let data = make_tcp_syn_frame();
        let meta = parse_frame(&data, Utc::now()).unwrap();

        assert_eq!(meta.src_ip.to_string(), "192.168.1.100");
        assert_eq!(meta.dst_ip.to_string(), "10.0.0.1");
        assert_eq!(meta.protocol, IpProtocol::Tcp);
        assert_eq!(meta.src_port, 12345);
        assert_eq!(meta.dst_port, 80);
        assert_eq!(meta.raw_len, data.len() as u32);

        let flags = meta.tcp_flags.unwrap();
        assert!(flags.syn);
        assert!(!flags.ack);
    }

    #[test]
    fn test_non_ip_frame_filtered() {
        let meta = parse_frame(&make_arp_frame(), Utc::now());
        assert!(meta.is_none());
    }

    #[test]
    fn test_truncated_frame_filtered() {
        let meta = parse_frame(&[0x00, 0x01, 0x02], Utc::now());
        assert!(meta.is_none());
    }
}
