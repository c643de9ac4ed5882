//! # flowsentry
//!
//! Live network traffic anomaly monitor.
//!
//! Packets captured from a network interface are grouped into normalized
//! 5-tuple flows; every half second the engine derives statistical
//! features for each flow over a sliding window, scores them with an
//! externally trained model, smooths the decisions over recent history
//! and classifies anomalies into coarse threat categories. A dashboard
//! consumer reads snapshots: recent alerts, packet rate, top talkers and
//! per-protocol totals.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use flowsentry::config::Config;
//! use flowsentry::capture::PcapCapture;
//! use flowsentry::engine::Engine;
//! use flowsentry::ml::ModelScorer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_or_default()?;
//!
//!     // Model load failures are fatal: no analysis without a scorer.
//!     let scorer = ModelScorer::load(&config.model.path)?;
//!     let threshold = scorer.threshold();
//!
//!     let capture = PcapCapture::open(&config.capture)?;
//!     let engine = Arc::new(Engine::new(&config, Arc::new(scorer), threshold));
//!     engine.run(Box::new(capture)).await;
//!     Ok(())
//! }
//! ```

pub mod alerts;
pub mod analysis;
pub mod capture;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod flow;
pub mod ml;
pub mod stats;

pub use alerts::{AlertLog, AlertRecord, Severity, ThreatCategory};
pub use analysis::{ScoreSmoother, SmoothingDecision, ThreatClassifier};
pub use capture::{PacketCapture, PcapCapture};
pub use config::Config;
pub use crate::core::{FlowAddr, FlowKey, IpProtocol, PacketMeta, PacketObservation, TcpFlags};
pub use engine::{Engine, RateStats};
pub use error::{FlowSentryError, Result};
pub use flow::{FeatureVector, FlowStore, FlowWindow, FEATURE_DIM};
pub use ml::{ModelParams, ModelScorer, Scorer};
pub use stats::{HostStatsTracker, ProtocolCounter, RateCalculator, TopTalker};
