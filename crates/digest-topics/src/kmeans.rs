//! Seeded k-means with k-means++ initialization.
//!
//! Determinism contract: the same seed, data, and parameters always
//! produce the same partition. Each restart derives its RNG from the
//! base seed plus the restart index, and the best run is picked by
//! lowest inertia with the earlier restart winning ties.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::TopicsError;
use digest_types::{cosine_similarity, Embedding};

/// Iteration cap per k-means run.
const MAX_ITERATIONS: usize = 100;
/// Convergence threshold on squared centroid movement.
const CONVERGENCE_EPS: f32 = 1e-6;

/// Result of a single k-means run.
#[derive(Debug, Clone)]
pub struct KMeansResult {
    /// Cluster index per input vector
    pub assignments: Vec<usize>,
    /// Final centroids, one per cluster
    pub centroids: Vec<Embedding>,
    /// Sum of squared distances to assigned centroids (lower is better)
    pub inertia: f32,
}

/// Run k-means `n_init` times with derived seeds, keeping the lowest
/// inertia result.
pub fn kmeans(
    vectors: &[Embedding],
    k: usize,
    seed: u64,
    n_init: usize,
) -> Result<KMeansResult, TopicsError> {
    if vectors.is_empty() {
        return Err(TopicsError::InvalidInput("no vectors".to_string()));
    }
    if k == 0 || k > vectors.len() {
        return Err(TopicsError::InvalidInput(format!(
            "k={} out of range for {} vectors",
            k,
            vectors.len()
        )));
    }
    let dim = vectors[0].len();
    if vectors.iter().any(|v| v.len() != dim) {
        return Err(TopicsError::InvalidInput(
            "mixed vector dimensionalities".to_string(),
        ));
    }

    let restarts = n_init.max(1);
    let mut best = kmeans_once(vectors, k, &mut StdRng::seed_from_u64(seed));

    // Ties keep the earlier restart, so results stay seed-stable.
    for restart in 1..restarts {
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(restart as u64));
        let result = kmeans_once(vectors, k, &mut rng);
        if result.inertia < best.inertia {
            best = result;
        }
    }

    debug!(k, restarts, inertia = best.inertia, "k-means complete");
    Ok(best)
}

fn kmeans_once(vectors: &[Embedding], k: usize, rng: &mut StdRng) -> KMeansResult {
    let mut centroids = init_plus_plus(vectors, k, rng);
    let mut assignments = vec![0usize; vectors.len()];

    for _iteration in 0..MAX_ITERATIONS {
        for (i, vector) in vectors.iter().enumerate() {
            assignments[i] = nearest_centroid(vector, &centroids);
        }

        let new_centroids = recompute_centroids(vectors, &assignments, &centroids);
        let movement = max_movement(&centroids, &new_centroids);
        centroids = new_centroids;

        if movement < CONVERGENCE_EPS {
            break;
        }
    }

    let inertia = vectors
        .iter()
        .zip(&assignments)
        .map(|(v, &c)| squared_distance(v, &centroids[c]))
        .sum();

    KMeansResult {
        assignments,
        centroids,
        inertia,
    }
}

/// k-means++ seeding: first centroid uniform, each next one sampled
/// proportionally to squared distance from the closest chosen centroid.
fn init_plus_plus(vectors: &[Embedding], k: usize, rng: &mut StdRng) -> Vec<Embedding> {
    let mut centroids: Vec<Embedding> = Vec::with_capacity(k);
    let first = rng.random_range(0..vectors.len());
    centroids.push(vectors[first].clone());

    while centroids.len() < k {
        let weights: Vec<f32> = vectors
            .iter()
            .map(|v| {
                centroids
                    .iter()
                    .map(|c| squared_distance(v, c))
                    .fold(f32::INFINITY, f32::min)
            })
            .collect();

        let total: f32 = weights.iter().sum();
        if total <= 0.0 {
            // All points coincide with chosen centroids; fall back to uniform.
            let idx = rng.random_range(0..vectors.len());
            centroids.push(vectors[idx].clone());
            continue;
        }

        let mut target = rng.random_range(0.0..total);
        let mut chosen = vectors.len() - 1;
        for (i, w) in weights.iter().enumerate() {
            if target < *w {
                chosen = i;
                break;
            }
            target -= w;
        }
        centroids.push(vectors[chosen].clone());
    }

    centroids
}

fn nearest_centroid(vector: &[f32], centroids: &[Embedding]) -> usize {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let dist = squared_distance(vector, centroid);
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best
}

/// Mean of assigned vectors per cluster; an emptied cluster keeps its
/// previous centroid rather than collapsing.
fn recompute_centroids(
    vectors: &[Embedding],
    assignments: &[usize],
    previous: &[Embedding],
) -> Vec<Embedding> {
    let k = previous.len();
    let dim = previous[0].len();
    let mut sums = vec![vec![0.0f32; dim]; k];
    let mut counts = vec![0usize; k];

    for (vector, &cluster) in vectors.iter().zip(assignments) {
        counts[cluster] += 1;
        for (s, v) in sums[cluster].iter_mut().zip(vector) {
            *s += v;
        }
    }

    sums.into_iter()
        .zip(counts)
        .enumerate()
        .map(|(i, (mut sum, count))| {
            if count == 0 {
                previous[i].clone()
            } else {
                for s in sum.iter_mut() {
                    *s /= count as f32;
                }
                sum
            }
        })
        .collect()
}

fn max_movement(old: &[Embedding], new: &[Embedding]) -> f32 {
    old.iter()
        .zip(new)
        .map(|(a, b)| squared_distance(a, b))
        .fold(0.0, f32::max)
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Cosine-based confidence that a vector belongs to its centroid,
/// mapped from [-1, 1] into [0, 1].
pub fn centroid_confidence(vector: &[f32], centroid: &[f32]) -> f32 {
    ((cosine_similarity(vector, centroid) + 1.0) / 2.0).clamp(0.0, 1.0)
}
