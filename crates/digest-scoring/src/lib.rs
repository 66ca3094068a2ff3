//! # digest-scoring
//!
//! Relevance scoring against a curated interest vector, with a
//! deterministic keyword fallback, plus near-duplicate detection over
//! the similarity index.
//!
//! Scoring never fails: when embedding generation is unavailable the
//! keyword-overlap score stands in, so every item always gets a usable
//! rank. Duplicate detection fails open: if the index is down, items
//! are treated as unique rather than blocking ingestion.

pub mod dedup;
pub mod error;
pub mod keywords;
pub mod relevance;

pub use dedup::{DuplicateCheck, DuplicateDetector};
pub use error::ScoringError;
pub use keywords::KeywordScorer;
pub use relevance::{RelevanceScore, RelevanceScorer};
