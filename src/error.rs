use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowSentryError {
    #[error("capture error: {0}")]
    Capture(String),

    #[error("no suitable capture interface found")]
    NoInterface,

    #[error("model load error: {0}")]
    ModelLoad(String),

    #[error("invalid feature dimension: expected {expected}, got {got}")]
    InvalidDimension { expected: usize, got: usize },

    #[error("scoring error: {0}")]
    Scoring(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FlowSentryError>;
