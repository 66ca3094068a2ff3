//! Near-duplicate detection over the similarity index.
//!
//! An item is a duplicate when a stored neighbor of the same kind sits
//! at or above the similarity threshold. Detection fails open: an index
//! error logs a warning and the item is treated as unique, so a broken
//! index never blocks ingestion.

use std::sync::Arc;
use tracing::{debug, warn};

use digest_index::{SearchResult, VectorStore};
use digest_types::ItemKind;

/// Result of a duplicate check, including the matched neighbors.
#[derive(Debug, Clone)]
pub struct DuplicateCheck {
    /// True when at least one neighbor clears the threshold
    pub is_duplicate: bool,
    /// Neighbors at or above the threshold, most similar first
    pub neighbors: Vec<SearchResult>,
}

impl DuplicateCheck {
    fn unique() -> Self {
        Self {
            is_duplicate: false,
            neighbors: Vec::new(),
        }
    }
}

/// Flags items whose embedding sits too close to an already-stored one.
pub struct DuplicateDetector {
    store: Arc<VectorStore>,
    threshold: f32,
}

impl DuplicateDetector {
    /// Create a detector over the given store with a similarity threshold.
    pub fn new(store: Arc<VectorStore>, threshold: f32) -> Self {
        Self { store, threshold }
    }

    /// Similarity threshold at or above which an item is a duplicate.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Check whether a vector duplicates a stored item of the same kind.
    ///
    /// The item's own id is excluded so re-checking an already-stored
    /// item does not flag it against itself.
    pub fn is_duplicate(&self, kind: ItemKind, id: &str, vector: &[f32]) -> DuplicateCheck {
        if vector.is_empty() {
            return DuplicateCheck::unique();
        }

        match self.store.find_similar(kind, vector, self.threshold, &[id]) {
            Ok(neighbors) => {
                if let Some(top) = neighbors.first() {
                    debug!(
                        id,
                        neighbor = %top.id,
                        similarity = top.similarity,
                        "Duplicate detected"
                    );
                }
                DuplicateCheck {
                    is_duplicate: !neighbors.is_empty(),
                    neighbors,
                }
            }
            Err(e) => {
                warn!(id, error = %e, "Duplicate check failed, treating as unique");
                DuplicateCheck::unique()
            }
        }
    }
}
