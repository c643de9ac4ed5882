//! Rule-based threat categorization from recent alert history.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

use crate::alerts::{AlertLog, AlertRecord, Severity, ThreatCategory};
use crate::core::{FlowKey, IpProtocol};

/// Trailing alert-history window the rules look at.
const HISTORY_WINDOW_SECS: i64 = 30;

/// Distinct TCP destination ports (including the current event) that make
/// a port scan.
const PORT_SCAN_PORTS: usize = 8;

/// Same-destination broadcast alerts (including the current event) that
/// make a broadcast storm.
const BROADCAST_STORM_COUNT: usize = 10;

/// Medium/high same-pair alerts (including the current event) that make a
/// dos-like pattern.
const DOS_PAIR_COUNT: usize = 10;

/// Maps an anomalous flow plus recent alerts to a coarse category.
///
/// Rules are evaluated in strict order; the first match wins.
#[derive(Default)]
pub struct ThreatClassifier;

impl ThreatClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(
        &self,
        key: &FlowKey,
        severity: Severity,
        now: DateTime<Utc>,
        alerts: &AlertLog,
    ) -> ThreatCategory {
        let recent: Vec<&AlertRecord> = alerts
            .recent_within(now, Duration::seconds(HISTORY_WINDOW_SECS))
            .collect();

        let src = key.src.to_string();
        let dst = key.dst.to_string();

        // 1. Port scan: many distinct TCP destination ports from one source.
        if key.protocol == IpProtocol::Tcp {
            let mut ports: HashSet<u16> = recent
                .iter()
                .filter(|a| a.src_ip == src && a.protocol == u8::from(IpProtocol::Tcp))
                .map(|a| a.dst_port)
                .collect();
            ports.insert(key.dst_port);
            if ports.len() >= PORT_SCAN_PORTS {
                return ThreatCategory::PortScan;
            }
        }

        // 2. Broadcast storm: repeated alerts for one multicast/broadcast
        // destination.
        if key.dst.is_broadcast_like() {
            let count = recent.iter().filter(|a| a.dst_ip == dst).count();
            if count + 1 >= BROADCAST_STORM_COUNT {
                return ThreatCategory::BroadcastStorm;
            }
        }

        // 3. Any anomalous ICMP flow.
        if key.protocol == IpProtocol::Icmp {
            return ThreatCategory::SuspiciousIcmp;
        }

        // 4. DoS-like: sustained medium/high anomalies between one pair.
        let mut pair_count = recent
            .iter()
            .filter(|a| a.src_ip == src && a.dst_ip == dst && a.severity.is_notable())
            .count();
        if severity.is_notable() {
            pair_count += 1;
        }
        if pair_count >= DOS_PAIR_COUNT {
            return ThreatCategory::DosLike;
        }

        ThreatCategory::Generic
    }
}
