//! Packets-per-second derived from the shared ingestion counter.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

/// Minimum elapsed time before the rate is recomputed.
const MIN_INTERVAL_SECS: f64 = 1.0;

/// Recomputes packets/second from the shared atomic counter on each
/// analysis cycle that is at least one second after the previous
/// computation. The atomic swap makes the read-reset safe against the
/// concurrently incrementing ingestion task.
pub struct RateCalculator {
    last_calc: DateTime<Utc>,
    pps: f64,
}

impl RateCalculator {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            last_calc: now,
            pps: 0.0,
        }
    }

    /// Recompute the rate if enough time has passed. Returns true when a
    /// new value was computed.
    pub fn tick(&mut self, counter: &AtomicU64, now: DateTime<Utc>) -> bool {
        let elapsed = (now - self.last_calc).num_milliseconds() as f64 / 1000.0;
        if elapsed < MIN_INTERVAL_SECS {
            return false;
        }

        let packets = counter.swap(0, Ordering::Relaxed);
        self.pps = packets as f64 / elapsed;
        self.last_calc = now;
        true
    }

    /// Most recently computed packets/second.
    pub fn pps(&self) -> f64 {
        self.pps
    }
}
