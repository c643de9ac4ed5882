//! Scoring boundary: the anomaly model is an externally trained black box
//! consumed as a vector -> score oracle.

pub mod scorer;

pub use scorer::{ModelParams, ModelScorer, Scorer};
