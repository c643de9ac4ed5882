//! Flow tracking and windowed feature extraction
//!
//! Packets are grouped by normalized 5-tuple; on each analysis cycle the
//! store produces one feature vector per flow from the observations inside
//! the sliding window and drops flows that have gone quiet.

pub mod features;
pub mod store;

pub use features::{extract_features, FeatureVector, FEATURE_DIM};
pub use store::{FlowStore, FlowWindow};
