//! Anomaly alerts: severity buckets, threat categories, and the
//! append-only alert log read by the dashboard consumer.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How many alerts the dashboard snapshot exposes.
pub const ALERT_SNAPSHOT_LEN: usize = 200;

/// Trailing window for the medium/high anomaly counter.
const ANOMALY_WINDOW_SECS: i64 = 60;

/// Delta-magnitude severity buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Medium and high alerts feed the anomalies-per-minute counter and
    /// the dos-like classifier rule.
    pub fn is_notable(&self) -> bool {
        matches!(self, Severity::Medium | Severity::High)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// Coarse threat category assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatCategory {
    PortScan,
    BroadcastStorm,
    SuspiciousIcmp,
    DosLike,
    Generic,
}

impl std::fmt::Display for ThreatCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThreatCategory::PortScan => write!(f, "port_scan"),
            ThreatCategory::BroadcastStorm => write!(f, "broadcast_storm"),
            ThreatCategory::SuspiciousIcmp => write!(f, "suspicious_icmp"),
            ThreatCategory::DosLike => write!(f, "dos_like"),
            ThreatCategory::Generic => write!(f, "generic"),
        }
    }
}

/// One recorded anomaly. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub score: f64,
    pub delta: f64,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    pub src_ip: String,
    pub dst_ip: String,
    pub src_port: u16,
    pub dst_port: u16,
    pub protocol: u8,
    pub category: ThreatCategory,
}

/// Append-only alert history.
///
/// The log itself is unbounded; consumers only ever see the most recent
/// `ALERT_SNAPSHOT_LEN` records. Retention is an open question, see
/// DESIGN.md.
#[derive(Default)]
pub struct AlertLog {
    records: Vec<AlertRecord>,
}

impl AlertLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, alert: AlertRecord) {
        self.records.push(alert);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The most recent `limit` alerts in insertion order.
    pub fn recent(&self, limit: usize) -> &[AlertRecord] {
        let start = self.records.len().saturating_sub(limit);
        &self.records[start..]
    }

    /// Alerts whose timestamp falls inside the trailing window.
    pub fn recent_within(
        &self,
        now: DateTime<Utc>,
        window: Duration,
    ) -> impl Iterator<Item = &AlertRecord> {
        self.records
            .iter()
            .filter(move |a| now - a.timestamp <= window)
    }
}

/// Timestamps of recent medium/high anomalies, kept to a trailing minute.
#[derive(Default)]
pub struct AnomalyWindow {
    times: Vec<DateTime<Utc>>,
}

impl AnomalyWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, now: DateTime<Utc>) {
        self.times.push(now);
        self.times
            .retain(|t| now - *t <= Duration::seconds(ANOMALY_WINDOW_SECS));
    }

    /// Number of notable anomalies in the trailing minute.
    pub fn count(&self, now: DateTime<Utc>) -> usize {
        self.times
            .iter()
            .filter(|t| now - **t <= Duration::seconds(ANOMALY_WINDOW_SECS))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn alert(offset_secs: i64, severity: Severity) -> AlertRecord {
        AlertRecord {
            score: 0.5,
            delta: 0.1,
            severity,
            timestamp: base_time() + Duration::seconds(offset_secs),
            src_ip: "10.0.0.1".to_string(),
            dst_ip: "10.0.0.2".to_string(),
            src_port: 40000,
            dst_port: 80,
            protocol: 6,
            category: ThreatCategory::Generic,
        }
    }

    fn base_time() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_recent_keeps_insertion_order() {
        let mut log = AlertLog::new();
        for i in 0..5 {
            log.append(alert(i, Severity::Low));
        }

        let recent = log.recent(3);
        assert_eq!(recent.len(), 3);
        assert!(recent[0].timestamp < recent[1].timestamp);
        assert!(recent[1].timestamp < recent[2].timestamp);
    }

    #[test]
    fn test_recent_limit_larger_than_log() {
        let mut log = AlertLog::new();
        log.append(alert(0, Severity::Low));
        assert_eq!(log.recent(200).len(), 1);
    }

    #[test]
    fn test_recent_within_window() {
        let mut log = AlertLog::new();
        log.append(alert(0, Severity::Low));
        log.append(alert(50, Severity::Low));

        let now = base_time() + Duration::seconds(60);
        let within: Vec<_> = log.recent_within(now, Duration::seconds(30)).collect();
        assert_eq!(within.len(), 1);
    }

    #[test]
    fn test_severity_ordering_and_notability() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert!(!Severity::Low.is_notable());
        assert!(Severity::Medium.is_notable());
        assert!(Severity::High.is_notable());
    }

    #[test]
    fn test_category_serializes_snake_case() {
        let json = serde_json::to_string(&ThreatCategory::PortScan).unwrap();
        assert_eq!(json, "\"port_scan\"");
        let json = serde_json::to_string(&Severity::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
    }

    #[test]
    fn test_anomaly_window_expiry() {
        let mut window = AnomalyWindow::new();
        let t0 = base_time();

        window.record(t0);
        window.record(t0 + Duration::seconds(30));
        assert_eq!(window.count(t0 + Duration::seconds(30)), 2);

        // First entry ages out of the trailing minute.
        assert_eq!(window.count(t0 + Duration::seconds(70)), 1);
    }
}
