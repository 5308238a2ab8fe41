use painscope_core::{ConfigError, InputError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("input rejected: {0}")]
    Input(#[from] InputError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("instances mix algo versions: expected '{expected}', found '{found}'")]
    VersionMismatch { expected: String, found: String },

    #[error("invalid metric history: {0}")]
    InvalidHistory(String),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
