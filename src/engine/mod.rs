//! The monitoring engine: one context object owning all shared state,
//! an ingestion task fed by the capture thread, and the fixed-cadence
//! analysis task.
//!
//! Every shared structure sits behind its own lock; the packet counter
//! is atomic. Nothing here is global: both tasks borrow the same
//! `Arc<Engine>`.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::alerts::{AlertLog, AlertRecord, AnomalyWindow, ALERT_SNAPSHOT_LEN};
use crate::analysis::{ScoreSmoother, ThreatClassifier};
use crate::capture::PacketCapture;
use crate::config::{AnalysisConfig, Config};
use crate::core::{FlowKey, PacketMeta, PacketObservation};
use crate::flow::FlowStore;
use crate::ml::Scorer;
use crate::stats::{HostStatsTracker, ProtocolCounter, RateCalculator, TopTalker};

/// Rate and anomaly counters for the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct RateStats {
    /// Packets per second over the last measurement interval
    pub pps: f64,
    /// Medium/high anomalies in the trailing minute
    pub anomalies_last_min: usize,
}

/// Shared monitoring context. Owned once, passed by `Arc` to the
/// ingestion and analysis tasks; the dashboard consumer only touches the
/// read-only snapshot methods.
pub struct Engine {
    flows: Mutex<FlowStore>,
    hosts: Mutex<HostStatsTracker>,
    protocols: Mutex<ProtocolCounter>,
    alerts: RwLock<AlertLog>,
    anomalies: Mutex<AnomalyWindow>,
    smoother: Mutex<ScoreSmoother>,
    rate: Mutex<RateCalculator>,
    packet_counter: AtomicU64,

    classifier: ThreatClassifier,
    scorer: Arc<dyn Scorer>,
    /// Decision threshold fixed at startup
    threshold: f64,
    analysis: AnalysisConfig,
}

impl Engine {
    /// Build the engine. The scorer and threshold must already be loaded;
    /// model failures are fatal before this point.
    pub fn new(config: &Config, scorer: Arc<dyn Scorer>, threshold: f64) -> Self {
        Self {
            flows: Mutex::new(FlowStore::new(config.analysis.window_secs)),
            hosts: Mutex::new(HostStatsTracker::new()),
            protocols: Mutex::new(ProtocolCounter::new()),
            alerts: RwLock::new(AlertLog::new()),
            anomalies: Mutex::new(AnomalyWindow::new()),
            smoother: Mutex::new(ScoreSmoother::new()),
            rate: Mutex::new(RateCalculator::new(Utc::now())),
            packet_counter: AtomicU64::new(0),
            classifier: ThreatClassifier::new(),
            scorer,
            threshold,
            analysis: config.analysis.clone(),
        }
    }

    // =========================================================================
    // Ingestion path
    // =========================================================================

    /// Account one accepted packet: flow store, host stats, protocol
    /// totals and the shared rate counter.
    pub fn ingest(&self, meta: &PacketMeta) {
        let key = FlowKey::from_meta(meta);

        self.packet_counter.fetch_add(1, Ordering::Relaxed);
        self.protocols.lock().increment(meta.protocol);
        self.hosts.lock().record(&key, meta.raw_len);
        self.flows
            .lock()
            .add(key, PacketObservation::from_meta(meta));
    }

    // =========================================================================
    // Analysis path
    // =========================================================================

    /// One analysis cycle: recompute the rate, extract flow windows,
    /// score, smooth, classify and record anomalies.
    ///
    /// A scorer failure skips that flow for this cycle only.
    pub fn run_analysis_cycle(&self, now: DateTime<Utc>) {
        self.rate.lock().tick(&self.packet_counter, now);

        let windows = self.flows.lock().extract_window(now);

        for window in windows {
            let score = match self.scorer.score(&window.features) {
                Ok(score) => score,
                Err(e) => {
                    debug!("Scoring failed for {}: {}", window.key, e);
                    continue;
                }
            };

            let delta = score - self.threshold;
            let decision = self.smoother.lock().observe(delta);

            if !decision.anomaly {
                continue;
            }

            let category = {
                let alerts = self.alerts.read();
                self.classifier
                    .classify(&window.key, decision.severity, now, &alerts)
            };

            info!(
                "{} anomaly on {} (delta {:+.3}, {})",
                decision.severity, window.key, delta, category
            );

            self.alerts.write().append(AlertRecord {
                score,
                delta,
                severity: decision.severity,
                timestamp: now,
                src_ip: window.key.src.to_string(),
                dst_ip: window.key.dst.to_string(),
                src_port: window.key.src_port,
                dst_port: window.key.dst_port,
                protocol: window.key.protocol.into(),
                category,
            });

            if decision.severity.is_notable() {
                self.anomalies.lock().record(now);
            }
        }
    }

    // =========================================================================
    // Dashboard snapshot surface (read-only)
    // =========================================================================

    /// The most recent alerts, oldest first, capped at 200.
    pub fn recent_alerts(&self) -> Vec<AlertRecord> {
        self.alerts.read().recent(ALERT_SNAPSHOT_LEN).to_vec()
    }

    pub fn rate_stats(&self, now: DateTime<Utc>) -> RateStats {
        RateStats {
            pps: self.rate.lock().pps(),
            anomalies_last_min: self.anomalies.lock().count(now),
        }
    }

    pub fn top_talkers(&self, limit: usize) -> Vec<TopTalker> {
        self.hosts.lock().top_talkers(limit)
    }

    pub fn protocol_counts(&self) -> HashMap<u8, u64> {
        self.protocols.lock().counts()
    }

    /// Number of currently tracked flows.
    pub fn flow_count(&self) -> usize {
        self.flows.lock().len()
    }

    // =========================================================================
    // Task wiring
    // =========================================================================

    /// Run the monitor until externally terminated: the capture thread
    /// feeds the ingestion task over a bounded channel while the
    /// analysis loop runs on a fixed cadence.
    pub async fn run(self: Arc<Self>, capture: Box<dyn PacketCapture>) {
        let (tx, rx) = mpsc::channel::<PacketMeta>(self.analysis.ingest_queue);

        spawn_capture_thread(capture, tx);

        let engine = Arc::clone(&self);
        tokio::spawn(async move {
            engine.ingest_loop(rx).await;
        });

        let mut interval =
            tokio::time::interval(std::time::Duration::from_millis(self.analysis.cycle_ms));
        loop {
            interval.tick().await;
            self.run_analysis_cycle(Utc::now());
        }
    }

    async fn ingest_loop(&self, mut rx: mpsc::Receiver<PacketMeta>) {
        while let Some(meta) = rx.recv().await {
            self.ingest(&meta);
        }
        debug!("Ingest channel closed");
    }
}

/// Drive the (blocking) capture source on a dedicated thread. Per-packet
/// errors are logged and dropped; the capture stream itself never stops.
fn spawn_capture_thread(mut capture: Box<dyn PacketCapture>, tx: mpsc::Sender<PacketMeta>) {
    std::thread::Builder::new()
        .name("flowsentry-capture".to_string())
        .spawn(move || loop {
            match capture.next_packet() {
                Ok(Some(meta)) => {
                    if tx.blocking_send(meta).is_err() {
                        // Engine dropped the receiver; we are shutting down.
                        break;
                    }
                }
                Ok(None) => continue,
                Err(e) => {
                    warn!("Capture error: {}", e);
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
            }
        })
        .expect("failed to spawn capture thread");
}
