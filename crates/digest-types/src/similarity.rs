//! Vector similarity functions.
//!
//! Pure Rust implementations shared by scoring, dedup, and clustering.

/// Calculate cosine similarity between two vectors.
///
/// Returns value in [-1.0, 1.0] where 1.0 = identical direction.
/// A zero vector (or dimension mismatch) yields 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Convert a cosine distance to a similarity score.
///
/// The index backend stores cosine distance; every downstream threshold
/// (relevance 0.3, dedup 0.95) is expressed as similarity. If the backend
/// distance convention ever changes, this is the single conversion point.
pub fn distance_to_similarity(distance: f32) -> f32 {
    1.0 - distance
}

/// Normalize a vector to unit length in place.
pub fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for val in v.iter_mut() {
            *val /= norm;
        }
    }
}

/// Calculate the centroid of multiple embeddings.
///
/// Returns a normalized vector representing the center of the group.
pub fn calculate_centroid(embeddings: &[&[f32]]) -> Vec<f32> {
    if embeddings.is_empty() {
        return Vec::new();
    }

    let dim = embeddings[0].len();
    let n = embeddings.len() as f32;
    let mut centroid = vec![0.0f32; dim];

    for embedding in embeddings {
        assert_eq!(
            embedding.len(),
            dim,
            "All embeddings must have same dimension"
        );
        for (i, &val) in embedding.iter().enumerate() {
            centroid[i] += val;
        }
    }

    // Average
    for val in centroid.iter_mut() {
        *val /= n;
    }

    // Normalize
    normalize(&mut centroid);

    centroid
}

/// Calculate pairwise distances between embeddings.
///
/// Returns a distance matrix where distance = 1 - cosine_similarity.
pub fn pairwise_distances(embeddings: &[Vec<f32>]) -> Vec<Vec<f64>> {
    let n = embeddings.len();
    let mut distances = vec![vec![0.0f64; n]; n];

    for i in 0..n {
        for j in (i + 1)..n {
            let sim = cosine_similarity(&embeddings[i], &embeddings[j]);
            let dist = (1.0 - sim) as f64;
            distances[i][j] = dist;
            distances[j][i] = dist;
        }
    }

    distances
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_symmetric() {
        let a = vec![0.3, 0.7, 0.1];
        let b = vec![0.9, 0.2, 0.4];
        assert!((cosine_similarity(&a, &b) - cosine_similarity(&b, &a)).abs() < f32::EPSILON);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_dimension_mismatch() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 0.001);
    }

    #[test]
    fn test_distance_to_similarity() {
        assert!((distance_to_similarity(0.0) - 1.0).abs() < f32::EPSILON);
        assert!(distance_to_similarity(1.0).abs() < f32::EPSILON);
        assert!((distance_to_similarity(0.05) - 0.95).abs() < 0.001);
    }

    #[test]
    fn test_distance_similarity_roundtrip() {
        // similarity = 1 - distance must invert the pairwise matrix entries
        let embeddings = vec![vec![1.0, 0.0], vec![0.6, 0.8]];
        let sim = cosine_similarity(&embeddings[0], &embeddings[1]);
        let dist = pairwise_distances(&embeddings)[0][1];
        assert!((distance_to_similarity(dist as f32) - sim).abs() < 0.001);
    }

    #[test]
    fn test_normalize() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 0.001);
        assert!((v[1] - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_normalize_zero_vector() {
        let mut v = vec![0.0, 0.0];
        normalize(&mut v);
        assert!(v[0].abs() < 0.001);
        assert!(v[1].abs() < 0.001);
    }

    #[test]
    fn test_calculate_centroid() {
        let e1 = vec![1.0, 0.0, 0.0];
        let e2 = vec![0.0, 1.0, 0.0];
        let embeddings: Vec<&[f32]> = vec![&e1, &e2];
        let centroid = calculate_centroid(&embeddings);
        let expected_norm = (0.5f32.powi(2) * 2.0).sqrt();
        assert!((centroid[0] - 0.5 / expected_norm).abs() < 0.001);
        assert!((centroid[1] - 0.5 / expected_norm).abs() < 0.001);
        assert!(centroid[2].abs() < 0.001);
    }

    #[test]
    fn test_calculate_centroid_empty() {
        let embeddings: Vec<&[f32]> = vec![];
        assert!(calculate_centroid(&embeddings).is_empty());
    }

    #[test]
    fn test_pairwise_distances() {
        let embeddings = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0]];
        let distances = pairwise_distances(&embeddings);
        assert!(distances[0][2].abs() < 0.001); // Identical
        assert!((distances[0][1] - 1.0).abs() < 0.001); // Orthogonal
        assert!(distances[0][0].abs() < 0.001); // Self
    }
}
