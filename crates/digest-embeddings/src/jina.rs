//! Jina AI embedding provider (OpenAI-compatible API).

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

pub const JINA_MODEL: &str = "jina-embeddings-v3";
pub const JINA_DIMENSIONS: usize = 1024;
pub const JINA_MAX_TOKENS: usize = 8192;
pub const JINA_ENDPOINT: &str = "https://api.jina.ai/v1/embeddings";

/// Jina's batch endpoint accepts fewer inputs per request than OpenAI.
const BATCH_SIZE: usize = 100;

/// Jina embeddings provider, used as the free-tier fallback in the cascade.
pub struct JinaProvider {
    client: Client,
    api_key: Option<SecretString>,
    endpoint: String,
}

impl JinaProvider {
    /// Create a provider, reading JINA_API_KEY when no key is given.
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, EmbeddingError> {
        let api_key = api_key
            .or_else(|| std::env::var("JINA_API_KEY").ok())
            .filter(|k| !k.is_empty())
            .map(SecretString::from);

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbeddingError::Config(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            endpoint: JINA_ENDPOINT.to_string(),
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
            .ok_or_else(|| EmbeddingError::Config("JINA_API_KEY not set".to_string()))?;

        let request = EmbeddingsRequest {
            model: JINA_MODEL,
            input: texts,
            dimensions: JINA_DIMENSIONS,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", key.expose_secret()))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| map_request_error("jina", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(map_status_error("jina", status, body));
        }

        let body: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Parse(format!("jina: {}", e)))?;

        body.into_ordered(texts.len())
    }
}

#[async_trait]
impl EmbeddingProvider for JinaProvider {
    fn name(&self) -> &'static str {
        "jina"
    }

    fn dimensions(&self) -> usize {
        JINA_DIMENSIONS
    }

    fn max_input_tokens(&self) -> usize {
        JINA_MAX_TOKENS
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
            .ok_or_else(|| EmbeddingError::Parse("jina: empty response".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

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
            debug!(provider = "jina", batch = chunk.len(), "Embedding batch");
            embeddings.extend(self.call_api(chunk).await?);
        }

        for (idx, embedding) in valid_indices.into_iter().zip(embeddings) {
            result[idx] = embedding;
        }
        Ok(result)
    }
}
