//! Batch orchestration.
//!
//! One `process_batch` call runs the whole enrichment pass: score every
//! item, admit items through duplicate detection in score-descending
//! order, persist admitted embeddings, then cluster. Every failure mode
//! degrades rather than aborts, so a batch always produces output.

use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::PipelineError;
use digest_embeddings::EmbeddingService;
use digest_index::VectorStore;
use digest_scoring::{DuplicateDetector, RelevanceScore, RelevanceScorer};
use digest_topics::{ClusterItem, TopicClusterer, TopicsError};
use digest_types::{Item, ItemEnrichment, ItemMetadata, Settings};

/// Per-cluster output of a batch run.
///
/// Label and member statistics are ready for rendering; synthesis text
/// is produced by an external generator.
#[derive(Debug, Clone)]
pub struct ClusterSummary {
    /// Cluster id, fresh per run
    pub cluster_id: String,
    /// Human-readable label
    pub label: String,
    /// Number of member items
    pub item_count: usize,
    /// Mean ranking score over members
    pub avg_score: f32,
    /// Member item ids
    pub item_ids: Vec<String>,
    /// Synthesis text, filled by the external generator
    pub synthesis_summary: Option<String>,
}

/// An item dropped by duplicate admission.
#[derive(Debug, Clone)]
pub struct DuplicateDrop {
    /// Id of the dropped item
    pub item_id: String,
    /// Id of the surviving near-duplicate
    pub duplicate_of: String,
    /// Similarity between the two
    pub similarity: f32,
}

/// Full output of one batch run.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Admitted items in score-descending order
    pub enrichments: Vec<ItemEnrichment>,
    /// Discovered clusters, largest first; empty when the batch is flat
    pub clusters: Vec<ClusterSummary>,
    /// Items dropped as near-duplicates of higher-scored survivors
    pub duplicates: Vec<DuplicateDrop>,
}

/// Orchestrates scoring, dedup, indexing, and clustering for a batch.
pub struct DigestPipeline {
    embeddings: Arc<EmbeddingService>,
    store: Arc<VectorStore>,
    scorer: RelevanceScorer,
    detector: DuplicateDetector,
    clusterer: TopicClusterer,
}

impl DigestPipeline {
    /// Build the pipeline from settings, opening the store at the
    /// configured index path.
    pub fn from_settings(settings: &Settings) -> Result<Self, PipelineError> {
        settings.validate()?;
        let embeddings = Arc::new(EmbeddingService::from_settings(&settings.embedding)?);
        let store = Arc::new(VectorStore::open(Path::new(&settings.index_path))?);
        Ok(Self::new(embeddings, store, settings))
    }

    /// Build the pipeline from explicit components (injection seam).
    pub fn new(
        embeddings: Arc<EmbeddingService>,
        store: Arc<VectorStore>,
        settings: &Settings,
    ) -> Self {
        let scorer = RelevanceScorer::new(&settings.scoring, Arc::clone(&embeddings));
        let detector =
            DuplicateDetector::new(Arc::clone(&store), settings.scoring.duplicate_threshold);
        let clusterer = TopicClusterer::new(settings.clustering.clone());
        Self {
            embeddings,
            store,
            scorer,
            detector,
            clusterer,
        }
    }

    /// Shared embedding service.
    pub fn embeddings(&self) -> &Arc<EmbeddingService> {
        &self.embeddings
    }

    /// Underlying vector store.
    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    /// Process one batch of items end to end.
    ///
    /// Admission order is score descending, so when two items in the
    /// batch near-duplicate each other the higher-scored one survives.
    /// Dropped items are reported, not merged. Too few embeddings for
    /// clustering degrades to a flat batch with cluster fields unset.
    #[instrument(skip(self, items), fields(batch_size = items.len()))]
    pub async fn process_batch(&self, items: &[Item]) -> BatchOutcome {
        let mut scored: Vec<(Item, RelevanceScore)> = Vec::with_capacity(items.len());
        for item in items {
            let score = self.scorer.score_text(&item.title, &item.text).await;
            scored.push((item.clone(), score));
        }

        // Stable sort keeps input order among equal scores.
        scored.sort_by(|a, b| b.1.score.cmp(&a.1.score));

        let mut admitted: Vec<(Item, RelevanceScore)> = Vec::new();
        let mut duplicates: Vec<DuplicateDrop> = Vec::new();

        for (item, score) in scored {
            match score.embedding.as_deref() {
                Some(vector) if !vector.is_empty() => {
                    let check = self.detector.is_duplicate(item.kind, &item.id, vector);
                    if check.is_duplicate {
                        let top = &check.neighbors[0];
                        duplicates.push(DuplicateDrop {
                            item_id: item.id.clone(),
                            duplicate_of: top.id.clone(),
                            similarity: top.similarity,
                        });
                        continue;
                    }
                    // Persist immediately so later, lower-scored items in
                    // this batch dedup against it.
                    if let Err(e) = self.store.upsert(
                        item.kind,
                        &item.id,
                        vector.to_vec(),
                        ItemMetadata::from_item(&item, score.score),
                        &item.text,
                    ) {
                        warn!(id = %item.id, error = %e, "Failed to index item");
                    }
                    admitted.push((item, score));
                }
                _ => {
                    // No embedding: nothing to dedup or index against,
                    // admit on the keyword score alone.
                    admitted.push((item, score));
                }
            }
        }

        let (enrichments, clusters) = self.cluster_admitted(admitted);

        info!(
            admitted = enrichments.len(),
            dropped = duplicates.len(),
            clusters = clusters.len(),
            "Processed batch"
        );
        BatchOutcome {
            enrichments,
            clusters,
            duplicates,
        }
    }

    fn cluster_admitted(
        &self,
        admitted: Vec<(Item, RelevanceScore)>,
    ) -> (Vec<ItemEnrichment>, Vec<ClusterSummary>) {
        let cluster_items: Vec<ClusterItem> = admitted
            .iter()
            .map(|(item, score)| ClusterItem {
                id: item.id.clone(),
                title: item.title.clone(),
                score: score.score,
                embedding: score.embedding.clone().unwrap_or_default(),
            })
            .collect();

        let clustering = match self.clusterer.cluster(&cluster_items, None) {
            Ok(clustering) => Some(clustering),
            Err(TopicsError::InsufficientData { usable, required }) => {
                info!(usable, required, "Too few embeddings, rendering flat");
                None
            }
            Err(e) => {
                warn!(error = %e, "Clustering failed, rendering flat");
                None
            }
        };

        let enrichments = admitted
            .into_iter()
            .map(|(item, score)| {
                let embedding_id = score.embedding.as_ref().map(|_| item.id.clone());
                let mut enrichment = ItemEnrichment::new(&item.id, score.score, score.semantic);
                enrichment.embedding_id = embedding_id;

                if let Some(clustering) = &clustering {
                    if let Some(assignment) = clustering.assignment_for(&item.id) {
                        enrichment.cluster_id = Some(assignment.cluster_id.clone());
                        enrichment.cluster_confidence = Some(assignment.confidence);
                        enrichment.cluster_label = clustering
                            .clusters
                            .iter()
                            .find(|c| c.id == assignment.cluster_id)
                            .map(|c| c.label.clone());
                    }
                }
                enrichment
            })
            .collect();

        let clusters = clustering
            .map(|clustering| {
                clustering
                    .clusters
                    .into_iter()
                    .map(|c| ClusterSummary {
                        cluster_id: c.id,
                        label: c.label,
                        item_count: c.item_count,
                        avg_score: c.avg_score,
                        item_ids: c.item_ids,
                        synthesis_summary: None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        (enrichments, clusters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use digest_embeddings::{EmbeddingError, EmbeddingProvider};
    use digest_types::ItemKind;
    use tempfile::TempDir;

    /// Deterministic bag-of-words embeddings over a fixed vocabulary.
    struct VocabProvider;

    const VOCAB: [&str; 10] = [
        "ai", "gpt", "openai", "model", "language", "chip", "gpu", "bakery", "award", "policy",
    ];

    fn vocab_embed(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        VOCAB
            .iter()
            .map(|word| {
                lower
                    .split(|c: char| !c.is_alphanumeric())
                    .filter(|t| t.starts_with(word))
                    .count() as f32
            })
            .collect()
    }

    #[async_trait]
    impl EmbeddingProvider for VocabProvider {
        fn name(&self) -> &'static str {
            "vocab"
        }
        fn dimensions(&self) -> usize {
            VOCAB.len()
        }
        fn max_input_tokens(&self) -> usize {
            8191
        }
        fn available(&self) -> bool {
            true
        }
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vocab_embed(text))
        }
    }

    /// Embeds marker words into separated group directions with a
    /// per-item noise dimension, keeping within-group similarity below
    /// the duplicate threshold but far above between-group similarity.
    struct GroupProvider;

    fn group_embed(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; 6];
        let lower = text.to_lowercase();
        if lower.contains("alpha") {
            v[0] = 1.0;
        } else if lower.contains("beta") {
            v[1] = 1.0;
        }
        for (i, marker) in ["#0", "#1", "#2", "#3"].iter().enumerate() {
            if lower.contains(marker) {
                v[2 + i] = 0.4;
            }
        }
        v
    }

    #[async_trait]
    impl EmbeddingProvider for GroupProvider {
        fn name(&self) -> &'static str {
            "group"
        }
        fn dimensions(&self) -> usize {
            6
        }
        fn max_input_tokens(&self) -> usize {
            8191
        }
        fn available(&self) -> bool {
            true
        }
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(group_embed(text))
        }
    }

    struct DownProvider;

    #[async_trait]
    impl EmbeddingProvider for DownProvider {
        fn name(&self) -> &'static str {
            "down"
        }
        fn dimensions(&self) -> usize {
            4
        }
        fn max_input_tokens(&self) -> usize {
            8191
        }
        fn available(&self) -> bool {
            true
        }
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::Api("backend down".to_string()))
        }
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn pipeline(provider: Box<dyn EmbeddingProvider>) -> (TempDir, DigestPipeline) {
        init_tracing();
        let dir = TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.embedding.max_retries = 1;
        settings.scoring.fallback_keywords = vec!["ai".to_string(), "gpt".to_string()];

        let embeddings =
            Arc::new(EmbeddingService::new(vec![provider], &settings.embedding).unwrap());
        let store = Arc::new(VectorStore::open(dir.path()).unwrap());
        let pipeline = DigestPipeline::new(embeddings, store, &settings);
        (dir, pipeline)
    }

    fn news(title: &str, text: &str, link: &str) -> Item {
        Item::new(title, text, ItemKind::News, link)
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let (_dir, pipeline) = pipeline(Box::new(VocabProvider));
        let outcome = pipeline.process_batch(&[]).await;
        assert!(outcome.enrichments.is_empty());
        assert!(outcome.clusters.is_empty());
        assert!(outcome.duplicates.is_empty());
    }

    #[tokio::test]
    async fn test_enrichments_sorted_by_score() {
        let (_dir, pipeline) = pipeline(Box::new(VocabProvider));
        let items = vec![
            news("Local bakery wins award", "fresh bread", "https://x.test/1"),
            news("OpenAI GPT model update", "ai language model news", "https://x.test/2"),
        ];
        let outcome = pipeline.process_batch(&items).await;

        assert_eq!(outcome.enrichments.len(), 2);
        assert!(outcome.enrichments[0].score >= outcome.enrichments[1].score);
        assert_eq!(outcome.enrichments[0].item_id, items[1].id);
    }

    #[tokio::test]
    async fn test_duplicate_dropped_lower_score_loses() {
        let (_dir, pipeline) = pipeline(Box::new(VocabProvider));
        // Same vocabulary profile, different ids; the richer text scores
        // the same so stable order decides, but an exact vector match is
        // flagged either way.
        let a = news("OpenAI GPT model ai", "", "https://x.test/a");
        let b = news("OpenAI GPT model ai", "", "https://x.test/b");
        let outcome = pipeline.process_batch(&[a.clone(), b.clone()]).await;

        assert_eq!(outcome.enrichments.len(), 1);
        assert_eq!(outcome.duplicates.len(), 1);
        assert_eq!(outcome.enrichments[0].item_id, a.id);
        assert_eq!(outcome.duplicates[0].item_id, b.id);
        assert_eq!(outcome.duplicates[0].duplicate_of, a.id);
        assert!(outcome.duplicates[0].similarity >= 0.95);
    }

    #[tokio::test]
    async fn test_duplicate_against_previous_batch() {
        let (_dir, pipeline) = pipeline(Box::new(VocabProvider));
        let first = news("OpenAI GPT model ai", "", "https://x.test/a");
        pipeline.process_batch(std::slice::from_ref(&first)).await;

        let again = news("OpenAI GPT model ai", "", "https://x.test/b");
        let outcome = pipeline.process_batch(std::slice::from_ref(&again)).await;

        assert!(outcome.enrichments.is_empty());
        assert_eq!(outcome.duplicates[0].duplicate_of, first.id);
    }

    #[tokio::test]
    async fn test_reprocessing_same_item_not_self_duplicate() {
        let (_dir, pipeline) = pipeline(Box::new(VocabProvider));
        let item = news("OpenAI GPT model ai", "", "https://x.test/a");
        pipeline.process_batch(std::slice::from_ref(&item)).await;
        let outcome = pipeline.process_batch(std::slice::from_ref(&item)).await;

        assert_eq!(outcome.enrichments.len(), 1);
        assert!(outcome.duplicates.is_empty());
    }

    #[tokio::test]
    async fn test_small_batch_renders_flat() {
        let (_dir, pipeline) = pipeline(Box::new(VocabProvider));
        let items = vec![
            news("OpenAI GPT news", "model", "https://x.test/1"),
            news("GPU chip market", "chips", "https://x.test/2"),
        ];
        let outcome = pipeline.process_batch(&items).await;

        assert_eq!(outcome.enrichments.len(), 2);
        assert!(outcome.clusters.is_empty());
        for enrichment in &outcome.enrichments {
            assert!(enrichment.cluster_id.is_none());
            assert!(enrichment.cluster_label.is_none());
            assert!(enrichment.cluster_confidence.is_none());
        }
    }

    #[tokio::test]
    async fn test_batch_clusters_with_summaries() {
        let (_dir, pipeline) = pipeline(Box::new(GroupProvider));
        let mut items = Vec::new();
        for i in 0..4 {
            items.push(news(
                &format!("alpha models story #{}", i),
                "",
                &format!("https://x.test/ai-{}", i),
            ));
            items.push(news(
                &format!("beta hardware story #{}", i),
                "",
                &format!("https://x.test/hw-{}", i),
            ));
        }
        let outcome = pipeline.process_batch(&items).await;

        assert_eq!(outcome.enrichments.len(), 8);
        assert!(outcome.clusters.len() >= 2);

        let total: usize = outcome.clusters.iter().map(|c| c.item_count).sum();
        assert_eq!(total, 8);
        // Synthesis text belongs to the external generator; the slot
        // starts unset.
        for cluster in &outcome.clusters {
            assert!(cluster.synthesis_summary.is_none());
        }
        for enrichment in &outcome.enrichments {
            assert!(enrichment.cluster_id.is_some());
            assert!(enrichment.cluster_label.is_some());
            assert!(enrichment.cluster_confidence.unwrap() > 0.0);
            assert!(enrichment.embedding_id.is_some());
        }
        // Largest first
        for pair in outcome.clusters.windows(2) {
            assert!(pair[0].item_count >= pair[1].item_count);
        }
    }

    #[tokio::test]
    async fn test_embedding_outage_degrades_to_keywords() {
        let (_dir, pipeline) = pipeline(Box::new(DownProvider));
        let items = vec![
            news("New GPT release", "AI everywhere", "https://x.test/1"),
            news("Quiet day", "nothing happened", "https://x.test/2"),
        ];
        let outcome = pipeline.process_batch(&items).await;

        assert_eq!(outcome.enrichments.len(), 2);
        assert!(outcome.clusters.is_empty());
        assert!(outcome.duplicates.is_empty());
        for enrichment in &outcome.enrichments {
            assert!(enrichment.semantic_score.is_none());
            assert!(enrichment.embedding_id.is_none());
            assert!(enrichment.cluster_id.is_none());
        }
        // Keyword scores still rank the AI item first.
        assert!(outcome.enrichments[0].score > outcome.enrichments[1].score);
    }

    #[tokio::test]
    async fn test_admitted_items_are_indexed() {
        let (_dir, pipeline) = pipeline(Box::new(VocabProvider));
        let item = news("OpenAI GPT model ai", "", "https://x.test/a");
        pipeline.process_batch(std::slice::from_ref(&item)).await;

        assert_eq!(pipeline.store().count(ItemKind::News).unwrap(), 1);
        let record = pipeline.store().get(ItemKind::News, &item.id).unwrap();
        assert!(record.is_some());
    }
}
