//! Error types for Bandloop

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum BlError {
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(f32),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("State error: {0}")]
    State(String),
}

/// Result type alias
pub type BlResult<T> = Result<T, BlError>;
