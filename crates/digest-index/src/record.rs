//! Stored record and search result types.

use serde::{Deserialize, Serialize};

use digest_types::{Embedding, ItemMetadata};

/// Maximum stored text preview length in chars.
pub const TEXT_PREVIEW_LEN: usize = 5000;

/// A record persisted in the index.
///
/// This is the only durable format the core owns; the id scheme
/// (`make_item_id`) and this shape are the interop surface with
/// previously persisted data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredRecord {
    /// Stable item id
    pub id: String,
    /// Embedding vector
    pub vector: Embedding,
    /// Item metadata at storage time
    pub metadata: ItemMetadata,
    /// Text preview (truncated to [`TEXT_PREVIEW_LEN`])
    pub text: String,
}

impl StoredRecord {
    /// Create a record, truncating the text preview.
    pub fn new(
        id: impl Into<String>,
        vector: Embedding,
        metadata: ItemMetadata,
        text: &str,
    ) -> Self {
        let text = if text.len() > TEXT_PREVIEW_LEN {
            // Truncate on a char boundary
            let mut end = TEXT_PREVIEW_LEN;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            text[..end].to_string()
        } else {
            text.to_string()
        };

        Self {
            id: id.into(),
            vector,
            metadata,
            text,
        }
    }
}

/// A ranked query hit.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Matched item id
    pub id: String,
    /// Cosine similarity to the query vector, in [-1, 1]
    pub similarity: f32,
    /// Stored metadata
    pub metadata: ItemMetadata,
    /// Stored text preview
    pub text: String,
}
