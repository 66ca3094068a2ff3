//! Embedding provider trait and shared wire types.
//!
//! Providers expose an OpenAI-compatible embeddings endpoint; the shared
//! request/response structs here are reused by each implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;
use digest_types::Embedding;

/// Trait for embedding providers.
///
/// Implementations must be thread-safe (Send + Sync) for concurrent use.
/// Batch results keep strict 1:1 index correspondence with the input:
/// a blank input yields an empty vector at its original position.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name used in the cascade configuration.
    fn name(&self) -> &'static str;

    /// Dimensionality of vectors this provider produces.
    fn dimensions(&self) -> usize;

    /// Maximum input size in tokens; longer input is truncated, not rejected.
    fn max_input_tokens(&self) -> usize;

    /// Whether this provider has the required credentials.
    fn available(&self) -> bool;

    /// Generate an embedding for a single non-empty text.
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;

    /// Generate embeddings for multiple texts.
    ///
    /// Default implementation calls embed() for each text; providers with
    /// a batch endpoint override this and chunk to their batch limit.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            if text.trim().is_empty() {
                out.push(Vec::new());
            } else {
                out.push(self.embed(text).await?);
            }
        }
        Ok(out)
    }
}

/// OpenAI-compatible embeddings request body.
#[derive(Debug, Serialize)]
pub(crate) struct EmbeddingsRequest<'a> {
    pub model: &'a str,
    pub input: &'a [String],
    pub dimensions: usize,
}

/// OpenAI-compatible embeddings response body.
#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingsResponse {
    pub data: Vec<EmbeddingsDatum>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingsDatum {
    pub index: usize,
    pub embedding: Vec<f32>,
}

impl EmbeddingsResponse {
    /// Extract embeddings ordered by their input index.
    pub(crate) fn into_ordered(mut self, expected: usize) -> Result<Vec<Embedding>, EmbeddingError> {
        if self.data.len() != expected {
            return Err(EmbeddingError::Parse(format!(
                "expected {} embeddings, got {}",
                expected,
                self.data.len()
            )));
        }
        self.data.sort_by_key(|d| d.index);
        Ok(self.data.into_iter().map(|d| d.embedding).collect())
    }
}

/// Map a reqwest error to an embedding error, distinguishing timeouts.
pub(crate) fn map_request_error(provider: &str, err: reqwest::Error) -> EmbeddingError {
    if err.is_timeout() {
        EmbeddingError::Timeout(format!("{}: {}", provider, err))
    } else {
        EmbeddingError::Api(format!("{}: {}", provider, err))
    }
}

/// Map a non-success HTTP status to an embedding error.
pub(crate) fn map_status_error(
    provider: &str,
    status: reqwest::StatusCode,
    body: String,
) -> EmbeddingError {
    if status.as_u16() == 429 {
        EmbeddingError::RateLimited(provider.to_string())
    } else {
        EmbeddingError::Api(format!("{}: HTTP {}: {}", provider, status, body))
    }
}
