//! Silhouette scoring over cosine pairwise distances.
//!
//! Used to pick k: higher mean silhouette means tighter, better
//! separated clusters.

use std::collections::HashMap;

/// Silhouette coefficient for one point.
///
/// `s(i) = (b(i) - a(i)) / max(a(i), b(i))` where `a(i)` is the mean
/// distance to the point's own cluster and `b(i)` the lowest mean
/// distance to any other cluster.
fn silhouette_coefficient(
    point: usize,
    assignments: &[usize],
    distances: &[Vec<f64>],
) -> f64 {
    let cluster = assignments[point];
    let mut own: Vec<f64> = Vec::new();
    let mut others: HashMap<usize, Vec<f64>> = HashMap::new();

    for (i, &other_cluster) in assignments.iter().enumerate() {
        if i == point {
            continue;
        }
        let dist = distances[point][i];
        if other_cluster == cluster {
            own.push(dist);
        } else {
            others.entry(other_cluster).or_default().push(dist);
        }
    }

    // Singleton clusters contribute 0 by convention.
    if own.is_empty() || others.is_empty() {
        return 0.0;
    }

    let a = own.iter().sum::<f64>() / own.len() as f64;
    let b = others
        .values()
        .map(|d| d.iter().sum::<f64>() / d.len() as f64)
        .fold(f64::INFINITY, f64::min);

    let max_ab = a.max(b);
    if max_ab < f64::EPSILON {
        0.0
    } else {
        (b - a) / max_ab
    }
}

/// Mean silhouette coefficient over all points, in [-1, 1].
///
/// Returns 0.0 for degenerate input (fewer than 2 points or a single
/// cluster), which ranks such partitions as neutral during k selection.
pub fn silhouette_score(assignments: &[usize], distances: &[Vec<f64>]) -> f64 {
    let n = assignments.len();
    if n < 2 {
        return 0.0;
    }

    let clusters: std::collections::HashSet<usize> = assignments.iter().copied().collect();
    if clusters.len() < 2 {
        return 0.0;
    }

    let sum: f64 = (0..n)
        .map(|i| silhouette_coefficient(i, assignments, distances))
        .sum();
    sum / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use digest_types::pairwise_distances;

    #[test]
    fn test_well_separated_scores_high() {
        let vectors = vec![
            vec![1.0, 0.0],
            vec![0.99, 0.01],
            vec![0.0, 1.0],
            vec![0.01, 0.99],
        ];
        let distances = pairwise_distances(&vectors);
        let score = silhouette_score(&[0, 0, 1, 1], &distances);
        assert!(score > 0.8, "expected high silhouette, got {}", score);
    }

    #[test]
    fn test_bad_partition_scores_low() {
        let vectors = vec![
            vec![1.0, 0.0],
            vec![0.99, 0.01],
            vec![0.0, 1.0],
            vec![0.01, 0.99],
        ];
        let distances = pairwise_distances(&vectors);
        // Splits each tight pair across clusters.
        let good = silhouette_score(&[0, 0, 1, 1], &distances);
        let bad = silhouette_score(&[0, 1, 0, 1], &distances);
        assert!(bad < good);
        assert!(bad < 0.0);
    }

    #[test]
    fn test_single_cluster_is_neutral() {
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let distances = pairwise_distances(&vectors);
        assert_eq!(silhouette_score(&[0, 0], &distances), 0.0);
    }

    #[test]
    fn test_too_few_points_is_neutral() {
        assert_eq!(silhouette_score(&[0], &[vec![0.0]]), 0.0);
        assert_eq!(silhouette_score(&[], &[]), 0.0);
    }
}
