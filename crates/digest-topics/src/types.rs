//! Clustering input and output types.

use digest_types::Embedding;

/// One item submitted for clustering.
#[derive(Debug, Clone)]
pub struct ClusterItem {
    /// Stable item id
    pub id: String,
    /// Title, used by labelers
    pub title: String,
    /// Ranking score, aggregated into the cluster average
    pub score: i32,
    /// The item's embedding; items with an empty vector are skipped
    pub embedding: Embedding,
}

/// One discovered topic cluster.
#[derive(Debug, Clone)]
pub struct TopicCluster {
    /// Fresh ULID for this batch run
    pub id: String,
    /// Human-readable label from the configured labeler
    pub label: String,
    /// Member item ids
    pub item_ids: Vec<String>,
    /// Number of members
    pub item_count: usize,
    /// Mean ranking score over members
    pub avg_score: f32,
    /// Cluster centroid in embedding space
    pub centroid: Embedding,
}

/// Per-item cluster membership with centroid-similarity confidence.
#[derive(Debug, Clone)]
pub struct ItemAssignment {
    /// Stable item id
    pub item_id: String,
    /// Id of the assigned cluster
    pub cluster_id: String,
    /// Confidence in [0, 1], from cosine similarity to the centroid
    pub confidence: f32,
}

/// Full output of one clustering run.
///
/// Batch-scoped: replaces any previous run's output wholesale. Clusters
/// are sorted by size descending.
#[derive(Debug, Clone)]
pub struct Clustering {
    /// Discovered clusters, largest first
    pub clusters: Vec<TopicCluster>,
    /// One assignment per usable input item
    pub assignments: Vec<ItemAssignment>,
}

impl Clustering {
    /// Look up the assignment for an item id.
    pub fn assignment_for(&self, item_id: &str) -> Option<&ItemAssignment> {
        self.assignments.iter().find(|a| a.item_id == item_id)
    }
}
