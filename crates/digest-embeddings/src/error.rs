//! Embedding error types.

use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Provider returned HTTP 429 or a quota error; never retried
    #[error("Provider {0} rate limited")]
    RateLimited(String),

    /// Provider API error (non-429 HTTP failure, connection error)
    #[error("API error: {0}")]
    Api(String),

    /// Request exceeded its timeout; treated like any provider failure
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Response could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Tokenizer error
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Provider configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Every configured provider was skipped or failed
    #[error("All embedding providers failed. Last error: {0}")]
    ProviderExhausted(String),
}

impl EmbeddingError {
    /// Whether this error should short-circuit the retry loop.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, EmbeddingError::RateLimited(_))
    }
}
