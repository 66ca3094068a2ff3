//! Pipeline error types.

use thiserror::Error;

/// Errors raised while assembling the pipeline.
///
/// Batch processing itself degrades instead of failing; these surface
/// only from construction (config, store open, provider setup).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Embedding service could not be built
    #[error("Embedding setup error: {0}")]
    Embedding(#[from] digest_embeddings::EmbeddingError),

    /// Vector store could not be opened
    #[error("Index setup error: {0}")]
    Index(#[from] digest_index::IndexError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] digest_types::DigestError),
}
