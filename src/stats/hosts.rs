//! Per-host byte/packet counters for the top-talkers view.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::core::{FlowAddr, FlowKey};

/// Counters for one host. Values never decrease.
#[derive(Debug, Default)]
struct HostStat {
    bytes: u64,
    packets: u64,
    flows: HashSet<FlowKey>,
    /// First-seen sequence, used to keep equal-byte ordering stable.
    order: u64,
}

/// One row of the top-talkers ranking.
#[derive(Debug, Clone, Serialize)]
pub struct TopTalker {
    pub ip: String,
    pub bytes: u64,
    pub packets: u64,
    pub flows: usize,
}

/// Tracks cumulative traffic per host address.
///
/// Both endpoints of every accepted packet are counted, including the
/// MULTICAST bucket for normalized destinations.
#[derive(Default)]
pub struct HostStatsTracker {
    hosts: HashMap<FlowAddr, HostStat>,
    next_order: u64,
}

impl HostStatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account one packet against its source and destination hosts.
    pub fn record(&mut self, key: &FlowKey, byte_len: u32) {
        for addr in [&key.src, &key.dst] {
            let next_order = &mut self.next_order;
            let stat = self.hosts.entry(addr.clone()).or_insert_with(|| {
                let order = *next_order;
                *next_order += 1;
                HostStat {
                    order,
                    ..HostStat::default()
                }
            });
            stat.bytes += byte_len as u64;
            stat.packets += 1;
            stat.flows.insert(key.clone());
        }
    }

    /// Number of distinct hosts seen.
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Hosts ranked by cumulative bytes, descending; equal-byte hosts
    /// keep first-seen order.
    pub fn top_talkers(&self, limit: usize) -> Vec<TopTalker> {
        let mut rows: Vec<(&FlowAddr, &HostStat)> = self.hosts.iter().collect();
        rows.sort_by(|a, b| b.1.bytes.cmp(&a.1.bytes).then(a.1.order.cmp(&b.1.order)));

        rows.into_iter()
            .take(limit)
            .map(|(addr, stat)| TopTalker {
                ip: addr.to_string(),
                bytes: stat.bytes,
                packets: stat.packets,
                flows: stat.flows.len(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::IpProtocol;
    use std::net::{IpAddr, Ipv4Addr};

    fn key(src: [u8; 4], dst: [u8; 4], dst_port: u16) -> FlowKey {
        FlowKey {
            src: FlowAddr::Ip(IpAddr::V4(Ipv4Addr::from(src))),
            dst: FlowAddr::Ip(IpAddr::V4(Ipv4Addr::from(dst))),
            src_port: 40000,
            dst_port,
            protocol: IpProtocol::Tcp,
        }
    }

    #[test]
    fn test_both_endpoints_counted() {
        let mut tracker = HostStatsTracker::new();
        tracker.record(&key([10, 0, 0, 1], [10, 0, 0, 2], 80), 100);

        assert_eq!(tracker.len(), 2);
        let rows = tracker.top_talkers(10);
        assert!(rows.iter().all(|r| r.bytes == 100 && r.packets == 1 && r.flows == 1));
    }

    #[test]
    fn test_top_talkers_sorted_descending() {
        let mut tracker = HostStatsTracker::new();
        // 10.0.0.1 talks on two flows, 300 bytes total
        tracker.record(&key([10, 0, 0, 1], [10, 0, 0, 2], 80), 100);
        tracker.record(&key([10, 0, 0, 1], [10, 0, 0, 3], 443), 200);
        // 10.0.0.4 sends one large packet
        tracker.record(&key([10, 0, 0, 4], [10, 0, 0, 5], 80), 250);

        let rows = tracker.top_talkers(10);
        assert_eq!(rows[0].ip, "10.0.0.1");
        assert_eq!(rows[0].bytes, 300);
        assert_eq!(rows[0].flows, 2);
        assert_eq!(rows[1].ip, "10.0.0.4");
        for pair in rows.windows(2) {
            assert!(pair[0].bytes >= pair[1].bytes);
        }
    }

    #[test]
    fn test_equal_bytes_keep_insertion_order() {
        let mut tracker = HostStatsTracker::new();
        tracker.record(&key([10, 0, 0, 1], [10, 0, 0, 2], 80), 100);
        tracker.record(&key([10, 0, 0, 3], [10, 0, 0, 4], 80), 100);

        let rows = tracker.top_talkers(10);
        let ips: Vec<&str> = rows.iter().map(|r| r.ip.as_str()).collect();
        assert_eq!(ips, ["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.4"]);
    }

    #[test]
    fn test_limit_truncates() {
        let mut tracker = HostStatsTracker::new();
        for i in 1..=6u8 {
            tracker.record(&key([10, 0, 0, i], [10, 0, 1, i], 80), 100);
        }
        assert_eq!(tracker.top_talkers(3).len(), 3);
    }

    #[test]
    fn test_counters_monotonic() {
        let mut tracker = HostStatsTracker::new();
        let k = key([10, 0, 0, 1], [10, 0, 0, 2], 80);

        let mut last_bytes = 0;
        let mut last_packets = 0;
        for _ in 0..5 {
            tracker.record(&k, 50);
            let row = &tracker.top_talkers(1)[0];
            assert!(row.bytes > last_bytes);
            assert!(row.packets > last_packets);
            last_bytes = row.bytes;
            last_packets = row.packets;
        }
    }

    #[test]
    fn test_multicast_bucket_accumulates() {
        let mut tracker = HostStatsTracker::new();
        let mut k = key([10, 0, 0, 1], [0, 0, 0, 0], 5353);
        k.dst = FlowAddr::Multicast;

        tracker.record(&k, 100);
        tracker.record(&k, 100);

        let rows = tracker.top_talkers(10);
        let mcast = rows.iter().find(|r| r.ip == "MULTICAST").unwrap();
        assert_eq!(mcast.bytes, 200);
        assert_eq!(mcast.packets, 2);
    }
}
