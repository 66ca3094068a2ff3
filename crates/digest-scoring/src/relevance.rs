//! Semantic relevance scoring against a curated interest vector.
//!
//! The interest vector is the L2-normalized mean of interest-phrase
//! embeddings, computed once per scorer instance and cached. Changing
//! the phrase list means constructing a new scorer.

use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::ScoringError;
use crate::keywords::KeywordScorer;
use digest_embeddings::EmbeddingService;
use digest_types::{calculate_centroid, cosine_similarity, Embedding, ScoringSettings};

/// Outcome of scoring one item. Always usable: when embedding fails,
/// `score` carries the keyword fallback and `semantic` is None.
#[derive(Debug, Clone)]
pub struct RelevanceScore {
    /// Integer score on the legacy scale
    pub score: i32,
    /// Raw semantic score in [0, 1], None when the fallback was used
    pub semantic: Option<f32>,
    /// The item's embedding, reusable for dedup and storage
    pub embedding: Option<Embedding>,
}

/// Scores vectors and texts by cosine similarity to the interest vector.
pub struct RelevanceScorer {
    interests: Vec<String>,
    relevance_threshold: f32,
    score_scale: i32,
    embeddings: Arc<EmbeddingService>,
    keyword_fallback: KeywordScorer,
    interest_vector: OnceCell<Embedding>,
}

impl RelevanceScorer {
    /// Create a scorer from settings and a shared embedding service.
    pub fn new(settings: &ScoringSettings, embeddings: Arc<EmbeddingService>) -> Self {
        Self {
            interests: settings.interests.clone(),
            relevance_threshold: settings.relevance_threshold,
            score_scale: settings.score_scale,
            embeddings,
            keyword_fallback: KeywordScorer::new(settings.fallback_keywords.clone()),
            interest_vector: OnceCell::new(),
        }
    }

    /// Get or compute the cached interest vector.
    pub async fn interest_vector(&self) -> Result<&Embedding, ScoringError> {
        self.interest_vector
            .get_or_try_init(|| self.compute_interest_vector())
            .await
    }

    async fn compute_interest_vector(&self) -> Result<Embedding, ScoringError> {
        if self.interests.is_empty() {
            return Err(ScoringError::InterestVector(
                "no interests configured".to_string(),
            ));
        }

        let embeddings = self.embeddings.embed_batch(&self.interests).await?;
        let valid: Vec<&[f32]> = embeddings
            .iter()
            .filter(|e| !e.is_empty())
            .map(|e| e.as_slice())
            .collect();

        if valid.is_empty() {
            return Err(ScoringError::InterestVector(
                "failed to embed any interest phrase".to_string(),
            ));
        }

        debug!(phrases = valid.len(), "Computed interest vector");
        Ok(calculate_centroid(&valid))
    }

    /// Score a vector against the interest vector.
    ///
    /// Returns cosine similarity clamped to [0, 1]; a zero or empty
    /// vector scores the minimum.
    pub async fn score_vector(&self, vector: &[f32]) -> Result<f32, ScoringError> {
        if vector.is_empty() {
            return Ok(0.0);
        }
        let interest = self.interest_vector().await?;
        Ok(cosine_similarity(interest, vector).clamp(0.0, 1.0))
    }

    /// Score multiple vectors at once.
    pub async fn score_batch(&self, vectors: &[Embedding]) -> Result<Vec<f32>, ScoringError> {
        let mut scores = Vec::with_capacity(vectors.len());
        for vector in vectors {
            scores.push(self.score_vector(vector).await?);
        }
        Ok(scores)
    }

    /// Score an item's text. Never fails: embedding failure falls back
    /// to the deterministic keyword-overlap score.
    pub async fn score_text(&self, title: &str, body: &str) -> RelevanceScore {
        let combined = if body.is_empty() {
            title.to_string()
        } else {
            format!("{}\n{}", title, body)
        };

        match self.try_semantic(&combined).await {
            Ok((semantic, embedding)) => RelevanceScore {
                score: self.score_to_int(semantic, self.score_scale),
                semantic: Some(semantic),
                embedding: Some(embedding),
            },
            Err(e) => {
                warn!(error = %e, "Semantic scoring failed, using keywords");
                RelevanceScore {
                    score: self.keyword_fallback.score(title, body),
                    semantic: None,
                    embedding: None,
                }
            }
        }
    }

    async fn try_semantic(&self, text: &str) -> Result<(f32, Embedding), ScoringError> {
        let embedding = self.embeddings.embed(text).await?;
        let score = self.score_vector(&embedding).await?;
        Ok((score, embedding))
    }

    /// Whether a score clears the relevance threshold.
    pub fn is_relevant(&self, score: f32) -> bool {
        score >= self.relevance_threshold
    }

    /// Convert a float score to the legacy integer scale.
    pub fn score_to_int(&self, score: f32, scale: i32) -> i32 {
        (score * scale as f32).round() as i32
    }

    /// Keyword fallback scorer (also used directly by callers that skip
    /// semantic scoring entirely).
    pub fn keyword_scorer(&self) -> &KeywordScorer {
        &self.keyword_fallback
    }
}
