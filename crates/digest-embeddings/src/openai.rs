//! OpenAI text-embedding-3-small provider.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::debug;

use crate::error::EmbeddingError;
use crate::provider::{
    map_request_error, map_status_error, EmbeddingProvider, EmbeddingsRequest, EmbeddingsResponse,
};
use digest_types::Embedding;

pub const OPENAI_MODEL: &str = "text-embedding-3-small";
pub const OPENAI_DIMENSIONS: usize = 1536;
pub const OPENAI_MAX_TOKENS: usize = 8191;
pub const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/embeddings";

/// Maximum inputs per API request.
const BATCH_SIZE: usize = 2048;

/// OpenAI embeddings provider.
pub struct OpenAiProvider {
    client: Client,
    api_key: Option<SecretString>,
    endpoint: String,
}

impl OpenAiProvider {
    /// Create a provider, reading OPENAI_API_KEY when no key is given.
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, EmbeddingError> {
        let api_key = api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.is_empty())
            .map(SecretString::from);

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbeddingError::Config(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            endpoint: OPENAI_ENDPOINT.to_string(),
        })
    }

    /// Override the API endpoint (used by tests and proxies).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn call_api(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        let key = self
            .api_key
            .as_ref()
            .ok_or_else(|| EmbeddingError::Config("OPENAI_API_KEY not set".to_string()))?;

        let request = EmbeddingsRequest {
            model: OPENAI_MODEL,
            input: texts,
            dimensions: OPENAI_DIMENSIONS,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", key.expose_secret()))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| map_request_error("openai", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(map_status_error("openai", status, body));
        }

        let body: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Parse(format!("openai: {}", e)))?;

        body.into_ordered(texts.len())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn dimensions(&self) -> usize {
        OPENAI_DIMENSIONS
    }

    fn max_input_tokens(&self) -> usize {
        OPENAI_MAX_TOKENS
    }

    fn available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "cannot embed empty text".to_string(),
            ));
        }
        let vectors = self.call_api(&[text.to_string()]).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::Parse("openai: empty response".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // Blank inputs keep their slot as an empty vector.
        let mut non_empty = Vec::new();
        let mut valid_indices = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                non_empty.push(trimmed.to_string());
                valid_indices.push(i);
            }
        }

        let mut result = vec![Vec::new(); texts.len()];
        if non_empty.is_empty() {
            return Ok(result);
        }

        let mut embeddings = Vec::with_capacity(non_empty.len());
        for chunk in non_empty.chunks(BATCH_SIZE) {
            debug!(provider = "openai", batch = chunk.len(), "Embedding batch");
            embeddings.extend(self.call_api(chunk).await?);
        }

        for (idx, embedding) in valid_indices.into_iter().zip(embeddings) {
            result[idx] = embedding;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_without_key() {
        // Explicit empty key bypasses the environment lookup
        let provider = OpenAiProvider::new(Some(String::new()), Duration::from_secs(1)).unwrap();
        assert!(!provider.available());
    }

    #[test]
    fn test_available_with_key() {
        let provider =
            OpenAiProvider::new(Some("sk-test".to_string()), Duration::from_secs(1)).unwrap();
        assert!(provider.available());
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.dimensions(), OPENAI_DIMENSIONS);
        assert_eq!(provider.max_input_tokens(), OPENAI_MAX_TOKENS);
    }

    #[tokio::test]
    async fn test_embed_rejects_empty_text() {
        let provider =
            OpenAiProvider::new(Some("sk-test".to_string()), Duration::from_secs(1)).unwrap();
        let result = provider.embed("   ").await;
        assert!(matches!(result, Err(EmbeddingError::InvalidInput(_))));
    }
}
