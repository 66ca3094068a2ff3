//! Configuration loading for the digest core.
//!
//! Layered config: defaults -> config file -> env vars.
//! Config file lives at ~/.config/digest-core/config.toml; env vars use
//! the DIGEST_ prefix (e.g. DIGEST_INDEX_PATH).

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::DigestError;

/// Embedding provider cascade configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Provider names tried in priority order
    #[serde(default = "default_providers")]
    pub providers: Vec<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum attempts per provider on transient failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Circuit breaker cooldown after a rate-limit trip, in seconds
    #[serde(default = "default_breaker_cooldown_secs")]
    pub breaker_cooldown_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            breaker_cooldown_secs: default_breaker_cooldown_secs(),
        }
    }
}

fn default_providers() -> Vec<String> {
    vec!["openai".to_string(), "jina".to_string()]
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    3
}
fn default_breaker_cooldown_secs() -> u64 {
    300
}

/// Relevance and duplicate scoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringSettings {
    /// Minimum semantic score considered relevant
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f32,

    /// Minimum similarity for near-duplicate suppression.
    /// Much stricter than the relevance threshold: targets cross-posted
    /// near-identical items, not topical overlap.
    #[serde(default = "default_duplicate_threshold")]
    pub duplicate_threshold: f32,

    /// Interest phrases averaged into the interest vector
    #[serde(default = "default_interests")]
    pub interests: Vec<String>,

    /// Keywords for the deterministic fallback scorer
    #[serde(default = "default_fallback_keywords")]
    pub fallback_keywords: Vec<String>,

    /// Integer scale for legacy-compatible scores (0..=scale)
    #[serde(default = "default_score_scale")]
    pub score_scale: i32,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            relevance_threshold: default_relevance_threshold(),
            duplicate_threshold: default_duplicate_threshold(),
            interests: default_interests(),
            fallback_keywords: default_fallback_keywords(),
            score_scale: default_score_scale(),
        }
    }
}

fn default_relevance_threshold() -> f32 {
    0.3
}
fn default_duplicate_threshold() -> f32 {
    0.95
}
fn default_score_scale() -> i32 {
    10
}

fn default_interests() -> Vec<String> {
    [
        "generative AI and large language models",
        "AI agents and autonomous systems",
        "OpenAI, Anthropic, Google Gemini, and Mistral developments",
        "AI coding assistants like Cursor, Copilot, and Aider",
        "enterprise AI adoption and automation",
        "AI startups, funding rounds, and acquisitions",
        "AI in marketing, banking, and workflow automation",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_fallback_keywords() -> Vec<String> {
    [
        "ai",
        "artificial intelligence",
        "machine learning",
        "deep learning",
        "neural network",
        "gpt",
        "chatgpt",
        "claude",
        "llm",
        "large language model",
        "generative ai",
        "genai",
        "openai",
        "anthropic",
        "gemini",
        "transformer",
        "diffusion",
        "copilot",
        "ai agent",
        "rag",
        "retrieval",
        "embedding",
        "fine-tuning",
        "prompt engineering",
        "inference",
        "multimodal",
        "foundation model",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Topic clustering bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringSettings {
    /// Minimum number of clusters to consider
    #[serde(default = "default_min_clusters")]
    pub min_clusters: usize,

    /// Maximum number of clusters to consider
    #[serde(default = "default_max_clusters")]
    pub max_clusters: usize,

    /// Minimum items per cluster
    #[serde(default = "default_min_cluster_size")]
    pub min_cluster_size: usize,

    /// Seed for deterministic k-means restarts
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of k-means initializations per candidate k
    #[serde(default = "default_n_init")]
    pub n_init: usize,
}

impl Default for ClusteringSettings {
    fn default() -> Self {
        Self {
            min_clusters: default_min_clusters(),
            max_clusters: default_max_clusters(),
            min_cluster_size: default_min_cluster_size(),
            seed: default_seed(),
            n_init: default_n_init(),
        }
    }
}

fn default_min_clusters() -> usize {
    2
}
fn default_max_clusters() -> usize {
    10
}
fn default_min_cluster_size() -> usize {
    2
}
fn default_seed() -> u64 {
    42
}
fn default_n_init() -> usize {
    10
}

/// Main application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to the similarity index directory
    #[serde(default = "default_index_path")]
    pub index_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Embedding cascade settings
    #[serde(default)]
    pub embedding: EmbeddingSettings,

    /// Scoring thresholds and interests
    #[serde(default)]
    pub scoring: ScoringSettings,

    /// Clustering bounds
    #[serde(default)]
    pub clustering: ClusteringSettings,
}

fn default_index_path() -> String {
    ProjectDirs::from("", "", "digest-core")
        .map(|p| p.data_local_dir().join("index"))
        .unwrap_or_else(|| PathBuf::from("./index"))
        .to_string_lossy()
        .to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            index_path: default_index_path(),
            log_level: default_log_level(),
            embedding: EmbeddingSettings::default(),
            scoring: ScoringSettings::default(),
            clustering: ClusteringSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/digest-core/config.toml)
    /// 3. Caller-specified config file (optional)
    /// 4. Environment variables (DIGEST_*)
    pub fn load(config_path: Option<&str>) -> Result<Self, DigestError> {
        let config_dir = ProjectDirs::from("", "", "digest-core")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("DIGEST")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| DigestError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| DigestError::Config(e.to_string()))
    }

    /// Validate threshold and bound invariants.
    pub fn validate(&self) -> Result<(), DigestError> {
        if !(0.0..=1.0).contains(&self.scoring.relevance_threshold) {
            return Err(DigestError::Config(format!(
                "relevance_threshold must be 0.0-1.0, got {}",
                self.scoring.relevance_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.scoring.duplicate_threshold) {
            return Err(DigestError::Config(format!(
                "duplicate_threshold must be 0.0-1.0, got {}",
                self.scoring.duplicate_threshold
            )));
        }
        if self.clustering.min_clusters == 0 || self.clustering.min_cluster_size == 0 {
            return Err(DigestError::Config(
                "min_clusters and min_cluster_size must be > 0".to_string(),
            ));
        }
        if self.clustering.max_clusters < self.clustering.min_clusters {
            return Err(DigestError::Config(format!(
                "max_clusters ({}) must be >= min_clusters ({})",
                self.clustering.max_clusters, self.clustering.min_clusters
            )));
        }
        if self.embedding.providers.is_empty() {
            return Err(DigestError::Config(
                "at least one embedding provider must be configured".to_string(),
            ));
        }
        Ok(())
    }
}
