//! # digest-index
//!
//! Persistent similarity index for digest items.
//!
//! Each content type gets its own RocksDB column family holding
//! `{id, vector, metadata, text}` records. Writes are idempotent
//! upserts keyed by the stable item id; queries are exact cosine scans
//! (collections are digest-scale, tens of items per run).
//!
//! ## Invariants
//! - Every vector in one collection shares that collection's pinned
//!   dimensionality; mismatches are rejected at the storage boundary.
//! - Re-upserting an id overwrites in place and leaves the count unchanged.

pub mod error;
pub mod record;
pub mod store;

pub use error::IndexError;
pub use record::{SearchResult, StoredRecord, TEXT_PREVIEW_LEN};
pub use store::VectorStore;
