//! # digest-types
//!
//! Shared types for the digest relevance core.
//!
//! This crate defines the item model consumed from upstream collectors,
//! the enrichment records produced for downstream rendering, vector math
//! helpers shared by scoring/dedup/clustering, and layered configuration.
//!
//! ## Features
//! - Stable item identity (SHA-256 of title|link, 24 hex chars)
//! - Content-type tagged items with per-type index collections
//! - Cosine similarity / centroid helpers used across the workspace
//! - Layered settings: defaults -> config file -> DIGEST_* env vars

pub mod config;
pub mod error;
pub mod item;
pub mod similarity;

pub use config::{ClusteringSettings, EmbeddingSettings, ScoringSettings, Settings};
pub use error::DigestError;
pub use item::{make_item_id, Item, ItemEnrichment, ItemKind, ItemMetadata};
pub use similarity::{
    calculate_centroid, cosine_similarity, distance_to_similarity, normalize, pairwise_distances,
};

/// An embedding vector.
pub type Embedding = Vec<f32>;
