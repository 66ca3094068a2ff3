//! Cluster labeling seam.
//!
//! Rich label synthesis happens outside this crate; the trait lets a
//! caller inject it. The built-in fallback derives a label from title
//! word frequency.

use std::collections::HashMap;

/// Produces a human-readable label for a cluster from member titles.
pub trait ClusterLabeler: Send + Sync {
    /// Label a cluster given its member titles.
    fn label(&self, titles: &[&str]) -> String;
}

/// Label used when no meaningful keywords can be extracted.
const DEFAULT_LABEL: &str = "General News";

/// Common words excluded from label extraction.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "has", "have", "how",
    "in", "is", "it", "its", "new", "of", "on", "or", "says", "that", "the", "this", "to", "was",
    "what", "when", "where", "which", "who", "why", "will", "with", "you", "your",
];

/// Fallback labeler: most frequent non-stop-word title words, top 3,
/// capitalized and joined.
#[derive(Debug, Default, Clone)]
pub struct KeywordLabeler;

impl KeywordLabeler {
    /// Create the fallback labeler.
    pub fn new() -> Self {
        Self
    }
}

impl ClusterLabeler for KeywordLabeler {
    fn label(&self, titles: &[&str]) -> String {
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut order: HashMap<String, usize> = HashMap::new();

        for title in titles {
            for word in title
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| w.len() > 2)
            {
                let lower = word.to_lowercase();
                if STOP_WORDS.contains(&lower.as_str()) {
                    continue;
                }
                let next = order.len();
                order.entry(lower.clone()).or_insert(next);
                *counts.entry(lower).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        // Frequency first, then first-seen order so labels are stable.
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| order[&a.0].cmp(&order[&b.0])));

        let words: Vec<String> = ranked
            .into_iter()
            .take(3)
            .map(|(word, _)| capitalize(&word))
            .collect();

        if words.is_empty() {
            DEFAULT_LABEL.to_string()
        } else {
            words.join(" ")
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
