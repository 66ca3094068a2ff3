//! Index error types.

use thiserror::Error;

/// Errors that can occur during index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// RocksDB error
    #[error("Backend error: {0}")]
    Backend(#[from] rocksdb::Error),

    /// Column family missing (index opened without this collection)
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// Vector dimensionality does not match the collection's pinned value
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
