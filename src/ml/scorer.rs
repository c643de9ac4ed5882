//! Anomaly scorer loaded from a trained model file.
//!
//! The model file carries the standard-scaler statistics, the linear
//! decision function, and the decision threshold, exported by the
//! offline training pipeline. Loading must succeed before the analysis
//! task starts; there is no fallback scorer.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::{FlowSentryError, Result};
use crate::flow::{FeatureVector, FEATURE_DIM};

/// A pure scoring function over flow feature vectors.
///
/// Higher scores are more anomalous. Implementations must be cheap and
/// side-effect free; a failed call only skips the flow for that cycle.
pub trait Scorer: Send + Sync {
    fn score(&self, features: &FeatureVector) -> Result<f64>;
}

/// Trained model parameters as exported to JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelParams {
    /// Per-feature scaler mean
    pub mean: Vec<f64>,
    /// Per-feature scaler scale (standard deviation)
    pub scale: Vec<f64>,
    /// Linear decision-function weights
    pub weights: Vec<f64>,
    pub bias: f64,
    /// Decision threshold the engine compares scores against
    pub threshold: f64,
}

/// Scorer backed by a scaler + linear decision function.
pub struct ModelScorer {
    params: ModelParams,
}

impl ModelScorer {
    /// Load and validate a model file. Any failure here is fatal to
    /// startup; the caller aborts before the analysis loop runs.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            FlowSentryError::ModelLoad(format!("{}: {}", path.as_ref().display(), e))
        })?;
        let params: ModelParams = serde_json::from_str(&content)
            .map_err(|e| FlowSentryError::ModelLoad(e.to_string()))?;

        let scorer = Self::from_params(params)?;
        info!(
            "Loaded scoring model from {} (threshold {:.4})",
            path.as_ref().display(),
            scorer.threshold()
        );
        Ok(scorer)
    }

    pub fn from_params(params: ModelParams) -> Result<Self> {
        for len in [params.mean.len(), params.scale.len(), params.weights.len()] {
            if len != FEATURE_DIM {
                return Err(FlowSentryError::InvalidDimension {
                    expected: FEATURE_DIM,
                    got: len,
                });
            }
        }
        if params.scale.iter().any(|s| *s == 0.0) {
            return Err(FlowSentryError::ModelLoad(
                "scaler contains zero scale entries".to_string(),
            ));
        }

        Ok(Self { params })
    }

    /// Decision threshold established at training time.
    pub fn threshold(&self) -> f64 {
        self.params.threshold
    }
}

impl Scorer for ModelScorer {
    fn score(&self, features: &FeatureVector) -> Result<f64> {
        // Scale, then negate the decision function so that higher output
        // means more anomalous.
        let decision: f64 = features
            .iter()
            .zip(&self.params.mean)
            .zip(&self.params.scale)
            .zip(&self.params.weights)
            .map(|(((x, mean), scale), weight)| (x - mean) / scale * weight)
            .sum::<f64>()
            + self.params.bias;

        Ok(-decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn params() -> ModelParams {
        let mut weights = vec![0.0; FEATURE_DIM];
        weights[1] = -1.0; // packet count drives the score up
        ModelParams {
            mean: vec![0.0; FEATURE_DIM],
            scale: vec![1.0; FEATURE_DIM],
            weights,
            bias: 0.0,
            threshold: 0.5,
        }
    }

    #[test]
    fn test_score_is_negated_decision() {
        let scorer = ModelScorer::from_params(params()).unwrap();
        let mut fv = [0.0f64; FEATURE_DIM];
        fv[1] = 10.0;

        // decision = -10, score = 10
        assert!((scorer.score(&fv).unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_scaling_applied() {
        let mut p = params();
        p.mean[1] = 5.0;
        p.scale[1] = 2.0;
        let scorer = ModelScorer::from_params(p).unwrap();

        let mut fv = [0.0f64; FEATURE_DIM];
        fv[1] = 9.0;

        // scaled = (9 - 5) / 2 = 2, decision = -2, score = 2
        assert!((scorer.score(&fv).unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut p = params();
        p.weights.truncate(10);
        assert!(matches!(
            ModelScorer::from_params(p),
            Err(FlowSentryError::InvalidDimension { expected: 37, got: 10 })
        ));
    }

    #[test]
    fn test_zero_scale_rejected() {
        let mut p = params();
        p.scale[3] = 0.0;
        assert!(ModelScorer::from_params(p).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&params()).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let scorer = ModelScorer::load(file.path()).unwrap();
        assert!((scorer.threshold() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(ModelScorer::load("/nonexistent/model.json").is_err());
    }
}
