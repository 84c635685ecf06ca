//! Error types for the core library

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors surfaced by the core library.
///
/// Chat failures never reach the UI as errors (they become fixed replies),
/// so most of these show up from configuration, speech synthesis and the
/// one-shot CLI commands.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        AgentError::Provider(err.to_string())
    }
}

impl From<base64::DecodeError> for AgentError {
    fn from(err: base64::DecodeError) -> Self {
        AgentError::Audio(format!("Invalid base64 audio payload: {}", err))
    }
}
