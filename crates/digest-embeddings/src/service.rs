//! Embedding service with cascading provider fallback.
//!
//! Tries providers in configured priority order. Transient failures get
//! bounded exponential backoff; a rate limit trips the circuit breaker
//! and cascades to the next provider immediately.

use backoff::{backoff::Backoff, ExponentialBackoff};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tiktoken_rs::{cl100k_base, CoreBPE};
use tracing::{debug, info, warn};

use crate::breaker::CircuitBreaker;
use crate::error::EmbeddingError;
use crate::jina::JinaProvider;
use crate::openai::OpenAiProvider;
use crate::provider::EmbeddingProvider;
use digest_types::{Embedding, EmbeddingSettings};

/// Service for generating embeddings with cascading provider fallback.
///
/// The active dimensionality is pinned to whichever provider first
/// succeeds; callers read it via [`EmbeddingService::dimensions`].
pub struct EmbeddingService {
    providers: Vec<Box<dyn EmbeddingProvider>>,
    breaker: CircuitBreaker,
    max_retries: u32,
    active_dimensions: AtomicUsize,
    tokenizer: CoreBPE,
}

impl EmbeddingService {
    /// Build the cascade from settings.
    ///
    /// Unknown provider names are skipped with a warning; an empty cascade
    /// is a configuration error.
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self, EmbeddingError> {
        let timeout = Duration::from_secs(settings.timeout_secs);
        let mut providers: Vec<Box<dyn EmbeddingProvider>> = Vec::new();

        for name in &settings.providers {
            match name.as_str() {
                "openai" => providers.push(Box::new(OpenAiProvider::new(None, timeout)?)),
                "jina" => providers.push(Box::new(JinaProvider::new(None, timeout)?)),
                other => warn!(provider = other, "Unknown embedding provider, skipping"),
            }
        }

        for provider in &providers {
            info!(
                provider = provider.name(),
                available = provider.available(),
                "Embedding provider configured"
            );
        }

        Self::new(providers, settings)
    }

    /// Build the cascade from explicit providers (injection seam).
    pub fn new(
        providers: Vec<Box<dyn EmbeddingProvider>>,
        settings: &EmbeddingSettings,
    ) -> Result<Self, EmbeddingError> {
        if providers.is_empty() {
            return Err(EmbeddingError::Config(
                "No embedding providers configured".to_string(),
            ));
        }

        let tokenizer =
            cl100k_base().map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

        Ok(Self {
            providers,
            breaker: CircuitBreaker::new(Duration::from_secs(settings.breaker_cooldown_secs)),
            max_retries: settings.max_retries.max(1),
            active_dimensions: AtomicUsize::new(0),
            tokenizer,
        })
    }

    /// Dimensionality of the last successful provider, if any.
    pub fn dimensions(&self) -> Option<usize> {
        match self.active_dimensions.load(Ordering::Relaxed) {
            0 => None,
            d => Some(d),
        }
    }

    /// Count tokens in a text with the shared tokenizer.
    pub fn count_tokens(&self, text: &str) -> usize {
        self.tokenizer.encode_ordinary(text).len()
    }

    /// Truncate text to a token budget by re-encoding and slicing.
    ///
    /// Long input is shortened, never rejected.
    pub fn truncate_to_budget(
        &self,
        text: &str,
        max_tokens: usize,
    ) -> Result<String, EmbeddingError> {
        let tokens = self.tokenizer.encode_ordinary(text);
        if tokens.len() <= max_tokens {
            return Ok(text.to_string());
        }
        self.tokenizer
            .decode(tokens[..max_tokens].to_vec())
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))
    }

    /// Generate an embedding for a single text.
    ///
    /// Empty or whitespace-only input yields an empty vector without any
    /// provider call.
    pub async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let mut last_error = "no provider available".to_string();

        for provider in &self.providers {
            let name = provider.name();
            if !provider.available() {
                debug!(provider = name, "Provider not available, skipping");
                continue;
            }
            if self.breaker.is_open(name) {
                debug!(provider = name, "Circuit open, skipping");
                continue;
            }

            let input = self.truncate_to_budget(trimmed, provider.max_input_tokens())?;

            match self.attempt_single(provider.as_ref(), &input).await {
                Ok(vector) => {
                    self.active_dimensions
                        .store(provider.dimensions(), Ordering::Relaxed);
                    return Ok(vector);
                }
                Err(e) => {
                    warn!(provider = name, error = %e, "Provider failed, trying next");
                    if e.is_rate_limit() {
                        self.breaker.trip(name);
                    }
                    last_error = e.to_string();
                }
            }
        }

        Err(EmbeddingError::ProviderExhausted(last_error))
    }

    /// Generate embeddings for multiple texts.
    ///
    /// Results keep strict 1:1 index correspondence with the input; a
    /// blank input yields an empty vector at its original position.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if texts.iter().all(|t| t.trim().is_empty()) {
            return Ok(vec![Vec::new(); texts.len()]);
        }

        let mut last_error = "no provider available".to_string();

        for provider in &self.providers {
            let name = provider.name();
            if !provider.available() {
                debug!(provider = name, "Provider not available, skipping");
                continue;
            }
            if self.breaker.is_open(name) {
                debug!(provider = name, "Circuit open, skipping");
                continue;
            }

            // Blank slots pass through untouched; the provider maps them
            // to empty vectors in place.
            let mut prepared = Vec::with_capacity(texts.len());
            for text in texts {
                if text.trim().is_empty() {
                    prepared.push(String::new());
                } else {
                    prepared.push(self.truncate_to_budget(text.trim(), provider.max_input_tokens())?);
                }
            }

            match self.attempt_batch(provider.as_ref(), &prepared).await {
                Ok(vectors) => {
                    self.active_dimensions
                        .store(provider.dimensions(), Ordering::Relaxed);
                    info!(provider = name, count = texts.len(), "Embeddings generated");
                    return Ok(vectors);
                }
                Err(e) => {
                    warn!(provider = name, error = %e, "Provider failed, trying next");
                    if e.is_rate_limit() {
                        self.breaker.trip(name);
                    }
                    last_error = e.to_string();
                }
            }
        }

        Err(EmbeddingError::ProviderExhausted(last_error))
    }

    async fn attempt_single(
        &self,
        provider: &dyn EmbeddingProvider,
        text: &str,
    ) -> Result<Embedding, EmbeddingError> {
        let mut backoff = retry_backoff();
        let mut attempts = 0;

        loop {
            attempts += 1;
            match provider.embed(text).await {
                Ok(vector) => return Ok(vector),
                // Retrying a quota error wastes time without hope of success
                Err(e) if e.is_rate_limit() => return Err(e),
                Err(e) => {
                    if attempts >= self.max_retries {
                        return Err(e);
                    }
                    match backoff.next_backoff() {
                        Some(wait) => {
                            debug!(
                                provider = provider.name(),
                                attempt = attempts,
                                wait_ms = wait.as_millis() as u64,
                                "Transient failure, retrying"
                            );
                            tokio::time::sleep(wait).await;
                        }
                        None => return Err(e),
                    }
                }
            }
        }
    }

    async fn attempt_batch(
        &self,
        provider: &dyn EmbeddingProvider,
        texts: &[String],
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        let mut backoff = retry_backoff();
        let mut attempts = 0;

        loop {
            attempts += 1;
            match provider.embed_batch(texts).await {
                Ok(vectors) => return Ok(vectors),
                Err(e) if e.is_rate_limit() => return Err(e),
                Err(e) => {
                    if attempts >= self.max_retries {
                        return Err(e);
                    }
                    match backoff.next_backoff() {
                        Some(wait) => tokio::time::sleep(wait).await,
                        None => return Err(e),
                    }
                }
            }
        }
    }
}

/// Retry policy for transient provider failures (1s..10s, bounded).
fn retry_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        initial_interval: Duration::from_millis(500),
        max_interval: Duration::from_secs(10),
        max_elapsed_time: Some(Duration::from_secs(30)),
        ..Default::default()
    }
}
