//! # digest-embeddings
//!
//! Embedding generation with a cascading provider fallback.
//!
//! Providers are tried in configured priority order (default
//! OpenAI -> Jina). Transient failures retry with bounded exponential
//! backoff; rate-limit errors trip a per-provider circuit breaker and
//! cascade immediately, since retrying a quota error wastes time without
//! hope of success.
//!
//! ## Features
//! - `EmbeddingProvider` capability trait with OpenAI and Jina impls
//! - Lossless tail truncation to each provider's token budget
//! - Circuit breaker with cooldown instead of a permanent trip
//! - Strict 1:1 batch correspondence (blank input -> empty vector slot)

pub mod breaker;
pub mod error;
pub mod jina;
pub mod openai;
pub mod provider;
pub mod service;

pub use breaker::CircuitBreaker;
pub use error::EmbeddingError;
pub use jina::JinaProvider;
pub use openai::OpenAiProvider;
pub use provider::EmbeddingProvider;
pub use service::EmbeddingService;
