//! Deterministic keyword-overlap scoring.
//!
//! The legacy scorer and the fallback when embeddings are unavailable:
//! no I/O, same input always yields the same score.

/// Lowercase + collapse whitespace so matching is consistent.
pub fn norm(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Scores text by counting configured keyword occurrences.
#[derive(Debug, Clone)]
pub struct KeywordScorer {
    keywords: Vec<String>,
}

impl KeywordScorer {
    /// Create a scorer over the given keyword list.
    pub fn new(keywords: Vec<String>) -> Self {
        let keywords = keywords.into_iter().map(|k| norm(&k)).collect();
        Self { keywords }
    }

    /// Score title + body: +2 per keyword present in the combined text,
    /// +1 bonus when it also appears in the title.
    pub fn score(&self, title: &str, body: &str) -> i32 {
        let title_norm = norm(title);
        let combined = norm(&format!("{} {}", title, body));

        let mut score = 0;
        for keyword in &self.keywords {
            if combined.contains(keyword.as_str()) {
                score += 2;
                if title_norm.contains(keyword.as_str()) {
                    score += 1;
                }
            }
        }
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> KeywordScorer {
        KeywordScorer::new(vec![
            "ai".to_string(),
            "llm".to_string(),
            "openai".to_string(),
        ])
    }

    #[test]
    fn test_norm() {
        assert_eq!(norm("  Hello   World \n"), "hello world");
        assert_eq!(norm("MiXeD Case"), "mixed case");
    }

    #[test]
    fn test_no_match_scores_zero() {
        assert_eq!(scorer().score("Local bakery wins award", "fresh bread"), 0);
    }

    #[test]
    fn test_body_match_scores_two() {
        assert_eq!(scorer().score("Tech news", "a new llm was released"), 2);
    }

    #[test]
    fn test_title_match_gets_bonus() {
        // "openai" in title and body: 2 + 1; "ai" matches as substring too: 2 + 1
        let score = scorer().score("OpenAI ships update", "OpenAI released a model");
        assert_eq!(score, 6);
    }

    #[test]
    fn test_deterministic() {
        let s = scorer();
        assert_eq!(
            s.score("AI weekly", "llm roundup"),
            s.score("AI weekly", "llm roundup")
        );
    }
}
