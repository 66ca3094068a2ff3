//! Scoring error types.

use thiserror::Error;

/// Errors that can occur during scoring operations.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(#[from] digest_embeddings::EmbeddingError),

    /// Index backend failed
    #[error("Index error: {0}")]
    Index(#[from] digest_index::IndexError),

    /// No interests configured or none could be embedded
    #[error("Interest vector unavailable: {0}")]
    InterestVector(String),
}
