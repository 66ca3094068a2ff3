//! Topic clustering with silhouette-guided k selection.

use tracing::{debug, info};
use ulid::Ulid;

use crate::error::TopicsError;
use crate::kmeans::{centroid_confidence, kmeans};
use crate::labeling::{ClusterLabeler, KeywordLabeler};
use crate::silhouette::silhouette_score;
use crate::types::{ClusterItem, Clustering, ItemAssignment, TopicCluster};
use digest_types::{pairwise_distances, ClusteringSettings, Embedding};

/// Groups a batch of embedded items into topic clusters.
///
/// Each run is independent: cluster ids are fresh ULIDs and the output
/// fully replaces any prior batch's clustering.
pub struct TopicClusterer {
    settings: ClusteringSettings,
    labeler: Box<dyn ClusterLabeler>,
}

impl TopicClusterer {
    /// Create a clusterer with the keyword fallback labeler.
    pub fn new(settings: ClusteringSettings) -> Self {
        Self {
            settings,
            labeler: Box::new(KeywordLabeler::new()),
        }
    }

    /// Replace the labeler (external synthesis seam).
    pub fn with_labeler(mut self, labeler: Box<dyn ClusterLabeler>) -> Self {
        self.labeler = labeler;
        self
    }

    /// Cluster a batch of items.
    ///
    /// Items with empty embeddings are skipped and get no assignment.
    /// `k` forces the cluster count; `None` searches the candidate range
    /// for the best silhouette. Fails with `InsufficientData` when too
    /// few usable embeddings remain, so the caller can render flat.
    pub fn cluster(
        &self,
        items: &[ClusterItem],
        k: Option<usize>,
    ) -> Result<Clustering, TopicsError> {
        let usable: Vec<&ClusterItem> = items.iter().filter(|i| !i.embedding.is_empty()).collect();
        let required = self.settings.min_clusters * self.settings.min_cluster_size;

        if usable.len() < required {
            return Err(TopicsError::InsufficientData {
                usable: usable.len(),
                required,
            });
        }

        let vectors: Vec<Embedding> = usable.iter().map(|i| i.embedding.clone()).collect();
        let k = match k {
            Some(k) => {
                if k == 0 || k > usable.len() {
                    return Err(TopicsError::InvalidInput(format!(
                        "k={} out of range for {} items",
                        k,
                        usable.len()
                    )));
                }
                k
            }
            None => self.select_k(&vectors)?,
        };

        let result = kmeans(&vectors, k, self.settings.seed, self.settings.n_init)?;
        let clustering = self.build_output(&usable, &vectors, &result.assignments, &result.centroids);

        info!(
            items = usable.len(),
            clusters = clustering.clusters.len(),
            "Clustered batch"
        );
        Ok(clustering)
    }

    /// Search candidate k values, maximizing silhouette.
    fn select_k(&self, vectors: &[Embedding]) -> Result<usize, TopicsError> {
        let n = vectors.len();
        let min_k = self.settings.min_clusters;

        // Too few points to compare partitions; size the count directly.
        if n < min_k + 1 {
            return Ok((n / self.settings.min_cluster_size).max(1));
        }

        let max_k = self
            .settings
            .max_clusters
            .min(n / self.settings.min_cluster_size)
            .min(n);
        if max_k < min_k {
            return Ok(min_k);
        }

        let distances = pairwise_distances(vectors);
        let mut best_k = min_k;
        let mut best_score = f64::NEG_INFINITY;

        for candidate in min_k..=max_k {
            let result = kmeans(vectors, candidate, self.settings.seed, self.settings.n_init)?;
            let score = silhouette_score(&result.assignments, &distances);
            debug!(k = candidate, silhouette = score, "Evaluated candidate k");
            if score > best_score {
                best_score = score;
                best_k = candidate;
            }
        }

        debug!(k = best_k, silhouette = best_score, "Selected k");
        Ok(best_k)
    }

    fn build_output(
        &self,
        items: &[&ClusterItem],
        vectors: &[Embedding],
        assignments: &[usize],
        centroids: &[Embedding],
    ) -> Clustering {
        let k = centroids.len();
        let mut member_indices: Vec<Vec<usize>> = vec![Vec::new(); k];
        for (i, &cluster) in assignments.iter().enumerate() {
            member_indices[cluster].push(i);
        }

        let mut clusters: Vec<(usize, TopicCluster)> = Vec::new();
        let mut item_assignments: Vec<ItemAssignment> = Vec::new();

        for (cluster_idx, members) in member_indices.into_iter().enumerate() {
            if members.is_empty() {
                continue;
            }

            let id = Ulid::new().to_string();
            let titles: Vec<&str> = members.iter().map(|&i| items[i].title.as_str()).collect();
            let item_ids: Vec<String> = members.iter().map(|&i| items[i].id.clone()).collect();
            let total_score: i64 = members.iter().map(|&i| items[i].score as i64).sum();
            let avg_score = total_score as f32 / members.len() as f32;

            for &i in &members {
                item_assignments.push(ItemAssignment {
                    item_id: items[i].id.clone(),
                    cluster_id: id.clone(),
                    confidence: centroid_confidence(&vectors[i], &centroids[cluster_idx]),
                });
            }

            clusters.push((
                members.len(),
                TopicCluster {
                    id,
                    label: self.labeler.label(&titles),
                    item_count: members.len(),
                    item_ids,
                    avg_score,
                    centroid: centroids[cluster_idx].clone(),
                },
            ));
        }

        clusters.sort_by(|a, b| b.0.cmp(&a.0));
        Clustering {
            clusters: clusters.into_iter().map(|(_, c)| c).collect(),
            assignments: item_assignments,
        }
    }
}
