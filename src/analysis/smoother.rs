//! Score smoothing over a short cross-flow delta history.
//!
//! The history is one global FIFO shared by every flow, not per-flow.
//! That is deliberate: a burst of strong deltas anywhere in the traffic
//! lowers the bar for the next decisions (see DESIGN.md).

use std::collections::VecDeque;

use crate::alerts::Severity;

/// Capacity of the delta FIFO.
pub const DELTA_HISTORY_LEN: usize = 15;

/// Delta above which a single flow is anomalous on its own.
pub const ANOMALY_DELTA: f64 = 0.02;

/// Delta above which a buffered entry counts as a strong hit.
pub const STRONG_HIT_DELTA: f64 = 0.08;

/// Strong hits required to force an anomaly.
pub const STRONG_HIT_COUNT: usize = 3;

const SEVERITY_HIGH_DELTA: f64 = 0.15;
const SEVERITY_MEDIUM_DELTA: f64 = 0.05;

/// Outcome of smoothing one delta.
#[derive(Debug, Clone, Copy)]
pub struct SmoothingDecision {
    pub anomaly: bool,
    /// Severity of this delta, computed whether or not it is anomalous.
    pub severity: Severity,
    pub strong_hits: usize,
}

/// Stateful smoother over the recent (score - threshold) deltas of all
/// flows, in analysis order.
#[derive(Default)]
pub struct ScoreSmoother {
    deltas: VecDeque<f64>,
}

impl ScoreSmoother {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push one delta and decide. Rules apply in order, each overriding
    /// the previous one; a negative delta always wins and clears the
    /// anomaly.
    pub fn observe(&mut self, delta: f64) -> SmoothingDecision {
        self.deltas.push_back(delta);
        if self.deltas.len() > DELTA_HISTORY_LEN {
            self.deltas.pop_front();
        }

        let strong_hits = self.deltas.iter().filter(|d| **d > STRONG_HIT_DELTA).count();

        let mut anomaly = false;
        if delta > ANOMALY_DELTA {
            anomaly = true;
        }
        if strong_hits >= STRONG_HIT_COUNT {
            anomaly = true;
        }
        if delta < 0.0 {
            anomaly = false;
        }

        let severity = if delta > SEVERITY_HIGH_DELTA {
            Severity::High
        } else if delta > SEVERITY_MEDIUM_DELTA {
            Severity::Medium
        } else {
            Severity::Low
        };

        SmoothingDecision {
            anomaly,
            severity,
            strong_hits,
        }
    }

    /// Number of deltas currently buffered.
    pub fn history_len(&self) -> usize {
        self.deltas.len()
    }
}
