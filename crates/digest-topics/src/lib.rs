//! # digest-topics
//!
//! Topic clustering for embedded digest items.
//!
//! Seeded k-means++ with silhouette-guided k selection: the same seed
//! and data always produce the same partition, while cluster ids are
//! fresh ULIDs per run. Label synthesis is a pluggable seam; the
//! built-in fallback derives labels from title keywords.

pub mod clusterer;
pub mod error;
pub mod kmeans;
pub mod labeling;
pub mod silhouette;
pub mod types;

pub use clusterer::TopicClusterer;
pub use error::TopicsError;
pub use kmeans::{centroid_confidence, kmeans, KMeansResult};
pub use labeling::{ClusterLabeler, KeywordLabeler};
pub use silhouette::silhouette_score;
pub use types::{ClusterItem, Clustering, ItemAssignment, TopicCluster};
