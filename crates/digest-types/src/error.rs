//! Shared error types.

use thiserror::Error;

/// Errors from shared types and configuration loading.
#[derive(Debug, Error)]
pub enum DigestError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
