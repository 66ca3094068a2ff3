//! Clustering error types.

use thiserror::Error;

/// Errors that can occur during topic clustering.
#[derive(Debug, Error)]
pub enum TopicsError {
    /// Too few usable embeddings for a meaningful partition
    #[error("Insufficient data for clustering: {usable} usable embeddings, need {required}")]
    InsufficientData {
        /// Items with a non-empty embedding
        usable: usize,
        /// min_clusters * min_cluster_size
        required: usize,
    },

    /// Invalid clustering parameters
    #[error("Invalid clustering input: {0}")]
    InvalidInput(String),
}
