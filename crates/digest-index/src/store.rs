//! RocksDB-backed vector store.
//!
//! One column family per content type. Records are JSON-serialized under
//! `item:{id}` keys; the collection's pinned dimensionality lives under a
//! reserved `meta:dim` key written by the first upsert.

use rocksdb::{ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::error::IndexError;
use crate::record::{SearchResult, StoredRecord};
use digest_types::{cosine_similarity, distance_to_similarity, Embedding, ItemKind, ItemMetadata};

/// Key prefix for item records.
const ITEM_PREFIX: &str = "item:";
/// Reserved key holding the collection's dimensionality.
const DIM_KEY: &str = "meta:dim";

fn item_key(id: &str) -> String {
    format!("{}{}", ITEM_PREFIX, id)
}

/// Persistent similarity index over per-type collections.
///
/// Mutation goes through idempotent upsert-by-id; concurrent upserts of
/// the same id rely on RocksDB's last-writer-wins guarantee, no extra
/// locking is added here.
pub struct VectorStore {
    db: DB,
}

impl VectorStore {
    /// Open the store at the given path, creating collections as needed.
    pub fn open(path: &Path) -> Result<Self, IndexError> {
        info!("Opening vector store at {:?}", path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = ItemKind::all()
            .iter()
            .map(|kind| ColumnFamilyDescriptor::new(kind.collection(), Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;
        Ok(Self { db })
    }

    fn cf_handle(&self, kind: ItemKind) -> Result<&rocksdb::ColumnFamily, IndexError> {
        self.db
            .cf_handle(kind.collection())
            .ok_or_else(|| IndexError::CollectionNotFound(kind.collection().to_string()))
    }

    /// Pinned dimensionality of a collection, None while empty.
    pub fn dimension(&self, kind: ItemKind) -> Result<Option<usize>, IndexError> {
        let cf = self.cf_handle(kind)?;
        match self.db.get_cf(cf, DIM_KEY.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Insert or overwrite a record by id.
    ///
    /// The first upsert pins the collection's dimensionality; later
    /// writes with a different vector length are rejected, since mixed
    /// dimensionalities silently break similarity math. Re-upserting an
    /// existing id overwrites vector and metadata and leaves the count
    /// unchanged.
    #[instrument(skip(self, vector, metadata, text), fields(collection = kind.collection(), id))]
    pub fn upsert(
        &self,
        kind: ItemKind,
        id: &str,
        vector: Embedding,
        metadata: ItemMetadata,
        text: &str,
    ) -> Result<(), IndexError> {
        if id.is_empty() {
            return Err(IndexError::InvalidInput("empty item id".to_string()));
        }
        if vector.is_empty() {
            return Err(IndexError::InvalidInput("empty vector".to_string()));
        }

        let cf = self.cf_handle(kind)?;

        let mut batch = WriteBatch::default();
        match self.dimension(kind)? {
            Some(expected) if expected != vector.len() => {
                return Err(IndexError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
            Some(_) => {}
            None => {
                batch.put_cf(cf, DIM_KEY.as_bytes(), serde_json::to_vec(&vector.len())?);
            }
        }

        let record = StoredRecord::new(id, vector, metadata, text);
        batch.put_cf(cf, item_key(id).as_bytes(), serde_json::to_vec(&record)?);
        self.db.write(batch)?;

        debug!("Upserted record");
        Ok(())
    }

    /// Upsert multiple records; skips entries with empty vectors.
    ///
    /// Returns the ids actually stored.
    pub fn upsert_batch(
        &self,
        kind: ItemKind,
        records: Vec<StoredRecord>,
    ) -> Result<Vec<String>, IndexError> {
        let mut stored = Vec::new();
        for record in records {
            let StoredRecord {
                id,
                vector,
                metadata,
                text,
            } = record;
            if vector.is_empty() {
                debug!(id = %id, "Skipping record without embedding");
                continue;
            }
            self.upsert(kind, &id, vector, metadata, &text)?;
            stored.push(id);
        }
        Ok(stored)
    }

    /// Get a record by id.
    pub fn get(&self, kind: ItemKind, id: &str) -> Result<Option<StoredRecord>, IndexError> {
        let cf = self.cf_handle(kind)?;
        match self.db.get_cf(cf, item_key(id).as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Delete a record by id. Returns true if it existed.
    pub fn delete(&self, kind: ItemKind, id: &str) -> Result<bool, IndexError> {
        let cf = self.cf_handle(kind)?;
        let key = item_key(id);
        let existed = self.db.get_cf(cf, key.as_bytes())?.is_some();
        if existed {
            self.db.delete_cf(cf, key.as_bytes())?;
        }
        Ok(existed)
    }

    /// Number of records in a collection.
    pub fn count(&self, kind: ItemKind) -> Result<usize, IndexError> {
        let cf = self.cf_handle(kind)?;
        let mut count = 0;
        for entry in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, _) = entry?;
            if key.starts_with(ITEM_PREFIX.as_bytes()) {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Query for the k nearest records by cosine similarity.
    ///
    /// With `kind = None` the query fans out across all collections,
    /// merges, re-sorts by similarity descending, and truncates to k.
    pub fn query(
        &self,
        kind: Option<ItemKind>,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<SearchResult>, IndexError> {
        if vector.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let kinds: Vec<ItemKind> = match kind {
            Some(kind) => vec![kind],
            None => ItemKind::all().to_vec(),
        };

        let mut results = Vec::new();
        for kind in kinds {
            results.extend(self.scan_collection(kind, vector)?);
        }

        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);
        Ok(results)
    }

    /// Find records similar to the vector at or above a threshold,
    /// excluding the listed ids (duplicate detection contract).
    pub fn find_similar(
        &self,
        kind: ItemKind,
        vector: &[f32],
        threshold: f32,
        exclude_ids: &[&str],
    ) -> Result<Vec<SearchResult>, IndexError> {
        let results = self.query(Some(kind), vector, 10)?;
        Ok(results
            .into_iter()
            .filter(|r| r.similarity >= threshold && !exclude_ids.contains(&r.id.as_str()))
            .collect())
    }

    fn scan_collection(
        &self,
        kind: ItemKind,
        vector: &[f32],
    ) -> Result<Vec<SearchResult>, IndexError> {
        let cf = self.cf_handle(kind)?;
        let mut hits = Vec::new();

        for entry in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, value) = entry?;
            if !key.starts_with(ITEM_PREFIX.as_bytes()) {
                continue;
            }
            let record: StoredRecord = serde_json::from_slice(&value)?;
            if record.vector.len() != vector.len() {
                continue;
            }
            // Cosine-distance backend convention: similarity = 1 - distance
            let distance = 1.0 - cosine_similarity(vector, &record.vector);
            hits.push(SearchResult {
                id: record.id,
                similarity: distance_to_similarity(distance),
                metadata: record.metadata,
                text: record.text,
            });
        }

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store() -> (VectorStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = VectorStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn meta(title: &str) -> ItemMetadata {
        ItemMetadata {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_upsert_and_get() {
        let (store, _dir) = open_store();
        store
            .upsert(ItemKind::News, "a1", vec![1.0, 0.0], meta("first"), "text")
            .unwrap();

        let record = store.get(ItemKind::News, "a1").unwrap().unwrap();
        assert_eq!(record.vector, vec![1.0, 0.0]);
        assert_eq!(record.metadata.title, "first");
        assert!(store.get(ItemKind::News, "missing").unwrap().is_none());
    }

    #[test]
    fn test_upsert_idempotent_overwrites_in_place() {
        let (store, _dir) = open_store();
        store
            .upsert(ItemKind::News, "a1", vec![1.0, 0.0], meta("v1"), "t1")
            .unwrap();
        store
            .upsert(ItemKind::News, "a1", vec![0.0, 1.0], meta("v2"), "t2")
            .unwrap();

        assert_eq!(store.count(ItemKind::News).unwrap(), 1);
        let record = store.get(ItemKind::News, "a1").unwrap().unwrap();
        assert_eq!(record.vector, vec![0.0, 1.0]);
        assert_eq!(record.metadata.title, "v2");
        assert_eq!(record.text, "t2");
    }

    #[test]
    fn test_dimension_pinned_per_collection() {
        let (store, _dir) = open_store();
        store
            .upsert(ItemKind::News, "a1", vec![1.0, 0.0], meta("a"), "t")
            .unwrap();
        assert_eq!(store.dimension(ItemKind::News).unwrap(), Some(2));

        let result = store.upsert(ItemKind::News, "a2", vec![1.0, 0.0, 0.0], meta("b"), "t");
        assert!(matches!(
            result,
            Err(IndexError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));

        // Other collections are pinned independently
        store
            .upsert(ItemKind::Video, "v1", vec![1.0, 0.0, 0.0], meta("c"), "t")
            .unwrap();
    }

    #[test]
    fn test_empty_vector_rejected() {
        let (store, _dir) = open_store();
        let result = store.upsert(ItemKind::News, "a1", Vec::new(), meta("a"), "t");
        assert!(matches!(result, Err(IndexError::InvalidInput(_))));
    }

    #[test]
    fn test_delete() {
        let (store, _dir) = open_store();
        store
            .upsert(ItemKind::News, "a1", vec![1.0, 0.0], meta("a"), "t")
            .unwrap();
        assert!(store.delete(ItemKind::News, "a1").unwrap());
        assert!(!store.delete(ItemKind::News, "a1").unwrap());
        assert_eq!(store.count(ItemKind::News).unwrap(), 0);
    }

    #[test]
    fn test_query_ranks_by_similarity() {
        let (store, _dir) = open_store();
        store
            .upsert(ItemKind::News, "close", vec![1.0, 0.1], meta("close"), "t")
            .unwrap();
        store
            .upsert(ItemKind::News, "far", vec![0.0, 1.0], meta("far"), "t")
            .unwrap();
        store
            .upsert(ItemKind::News, "exact", vec![1.0, 0.0], meta("exact"), "t")
            .unwrap();

        let results = store.query(Some(ItemKind::News), &[1.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "exact");
        assert!((results[0].similarity - 1.0).abs() < 0.001);
        assert_eq!(results[1].id, "close");
    }

    #[test]
    fn test_query_fans_out_across_collections() {
        let (store, _dir) = open_store();
        store
            .upsert(ItemKind::News, "n1", vec![1.0, 0.0], meta("news"), "t")
            .unwrap();
        store
            .upsert(ItemKind::Video, "v1", vec![0.9, 0.1], meta("video"), "t")
            .unwrap();
        store
            .upsert(ItemKind::Podcast, "p1", vec![0.0, 1.0], meta("pod"), "t")
            .unwrap();

        let results = store.query(None, &[1.0, 0.0], 10).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].id, "n1");
        assert_eq!(results[1].id, "v1");
        assert_eq!(results[2].id, "p1");
    }

    #[test]
    fn test_query_truncates_to_k() {
        let (store, _dir) = open_store();
        for i in 0..5 {
            store
                .upsert(
                    ItemKind::News,
                    &format!("n{}", i),
                    vec![1.0, i as f32 * 0.1],
                    meta("t"),
                    "t",
                )
                .unwrap();
        }
        let results = store.query(Some(ItemKind::News), &[1.0, 0.0], 3).unwrap();
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_find_similar_threshold_and_exclusion() {
        let (store, _dir) = open_store();
        store
            .upsert(ItemKind::News, "dup", vec![1.0, 0.0], meta("dup"), "t")
            .unwrap();
        store
            .upsert(ItemKind::News, "other", vec![1.0, 1.0], meta("other"), "t")
            .unwrap();

        // cosine([1,0],[1,0]) = 1.0 >= 0.95; cosine([1,0],[1,1]) ~ 0.707 < 0.95
        let hits = store
            .find_similar(ItemKind::News, &[1.0, 0.0], 0.95, &[])
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "dup");

        // An item never counts as its own duplicate
        let hits = store
            .find_similar(ItemKind::News, &[1.0, 0.0], 0.95, &["dup"])
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_persistence_across_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = VectorStore::open(dir.path()).unwrap();
            store
                .upsert(ItemKind::News, "a1", vec![1.0, 0.0], meta("kept"), "t")
                .unwrap();
        }
        let store = VectorStore::open(dir.path()).unwrap();
        let record = store.get(ItemKind::News, "a1").unwrap().unwrap();
        assert_eq!(record.metadata.title, "kept");
        assert_eq!(store.dimension(ItemKind::News).unwrap(), Some(2));
    }
}
