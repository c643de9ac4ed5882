//! Flow table keyed by normalized 5-tuple.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use crate::core::{FlowKey, PacketObservation};

use super::features::{extract_features, FeatureVector};

/// One flow's feature vector for the current window.
#[derive(Debug, Clone)]
pub struct FlowWindow {
    pub key: FlowKey,
    pub features: FeatureVector,
}

/// Per-flow packet history with windowed extraction.
///
/// Records are append-only; a record is removed as a whole once every
/// observation in it has aged past the window.
pub struct FlowStore {
    flows: HashMap<FlowKey, Vec<PacketObservation>>,
    window: Duration,
}

impl FlowStore {
    pub fn new(window_secs: u64) -> Self {
        Self {
            flows: HashMap::new(),
            window: Duration::seconds(window_secs as i64),
        }
    }

    /// Append one observation, creating the flow on first sight.
    pub fn add(&mut self, key: FlowKey, observation: PacketObservation) {
        self.flows.entry(key).or_default().push(observation);
    }

    /// Number of tracked flows.
    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Build one feature vector per flow from the observations still
    /// inside the window. Flows with no live observations are removed;
    /// deletions are applied only after the full snapshot pass so the
    /// map is never mutated while iterating.
    pub fn extract_window(&mut self, now: DateTime<Utc>) -> Vec<FlowWindow> {
        let mut windows = Vec::new();
        let mut stale = Vec::new();

        for (key, observations) in &self.flows {
            let live: Vec<&PacketObservation> = observations
                .iter()
                .filter(|obs| now - obs.timestamp <= self.window)
                .collect();

            if live.is_empty() {
                stale.push(key.clone());
                continue;
            }

            windows.push(FlowWindow {
                key: key.clone(),
                features: extract_features(&live),
            });
        }

        for key in stale {
            self.flows.remove(&key);
        }

        windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FlowAddr, IpProtocol};
    use chrono::TimeZone;
    use std::net::{IpAddr, Ipv4Addr};

    fn key(dst_port: u16) -> FlowKey {
        FlowKey {
            src: FlowAddr::Ip(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10))),
            dst: FlowAddr::Ip(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))),
            src_port: 40000,
            dst_port,
            protocol: IpProtocol::Tcp,
        }
    }

    fn obs(ts: DateTime<Utc>, len: u32) -> PacketObservation {
        PacketObservation {
            timestamp: ts,
            byte_len: len,
            tcp_flags: None,
        }
    }

    fn base_time() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_live_flow_produces_vector() {
        let mut store = FlowStore::new(2);
        let t0 = base_time();

        store.add(key(80), obs(t0, 60));
        store.add(key(80), obs(t0 + Duration::milliseconds(500), 1500));

        let windows = store.extract_window(t0 + Duration::seconds(1));
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].features[1], 2.0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_stale_flow_removed_and_excluded() {
        let mut store = FlowStore::new(2);
        let t0 = base_time();

        store.add(key(80), obs(t0, 60));
        store.add(key(80), obs(t0 + Duration::milliseconds(100), 60));

        // Every observation is older than the window: no vector, flow gone.
        let windows = store.extract_window(t0 + Duration::seconds(10));
        assert!(windows.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_window_filters_old_observations() {
        let mut store = FlowStore::new(2);
        let t0 = base_time();

        store.add(key(80), obs(t0, 100));
        store.add(key(80), obs(t0 + Duration::seconds(5), 200));

        // Only the second observation is live at t0+6s.
        let windows = store.extract_window(t0 + Duration::seconds(6));
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].features[1], 1.0);
        assert_eq!(windows[0].features[2], 200.0);
    }

    #[test]
    fn test_stale_removal_spares_live_flows() {
        let mut store = FlowStore::new(2);
        let t0 = base_time();

        store.add(key(80), obs(t0, 60));
        store.add(key(443), obs(t0 + Duration::seconds(9), 60));

        let windows = store.extract_window(t0 + Duration::seconds(10));
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].key.dst_port, 443);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_observation_exactly_at_window_edge_is_live() {
        let mut store = FlowStore::new(2);
        let t0 = base_time();

        store.add(key(80), obs(t0, 60));

        let windows = store.extract_window(t0 + Duration::seconds(2));
        assert_eq!(windows.len(), 1);
    }
}
