//! # digest-pipeline
//!
//! End-to-end batch enrichment: relevance scoring, near-duplicate
//! admission, index persistence, and topic clustering in one pass.
//!
//! The pipeline is deliberately non-fatal: embedding outages fall back
//! to keyword scores, index failures fail open, and thin batches render
//! flat instead of clustered. A batch always yields usable output.

pub mod error;
pub mod pipeline;

pub use error::PipelineError;
pub use pipeline::{BatchOutcome, ClusterSummary, DigestPipeline, DuplicateDrop};
