// Query expansion: keyword variant + mean query vector
use regex::Regex;

use crate::errors::{RagError, Result};
use crate::memory::embedding::{embed_normalized, mean_normalized, Embedder};
use crate::nlp::is_stop_word;

/// Keyword variants need at least this many surviving tokens
const MIN_KEYWORDS: usize = 3;

pub struct QueryExpander {
    token: Regex,
}

impl QueryExpander {
    pub fn new() -> Self {
        Self {
            token: Regex::new(r"[\p{L}\p{N}_'’]+").expect("static pattern compiles"),
        }
    }

    /// Question with stop words and non-alphabetic tokens removed, if at
    /// least three keywords remain
    pub fn keyword_variant(&self, question: &str) -> Option<String> {
        let keywords: Vec<&str> = self
            .token
            .find_iter(question)
            .map(|m| m.as_str())
            .filter(|t| t.chars().all(char::is_alphabetic))
            .filter(|t| !is_stop_word(t))
            .collect();

        (keywords.len() >= MIN_KEYWORDS).then(|| keywords.join(" "))
    }

    /// `[question, keyword_variant?]`
    pub fn variants(&self, question: &str) -> Vec<String> {
        let mut variants = vec![question.to_string()];
        if let Some(keywords) = self.keyword_variant(question) {
            variants.push(keywords);
        }
        variants
    }

    /// Normalized mean of the normalized variant embeddings
    pub fn query_vector(&self, embedder: &dyn Embedder, question: &str) -> Result<Vec<f32>> {
        let variants = self.variants(question);
        let texts: Vec<&str> = variants.iter().map(String::as_str).collect();
        let vectors = embed_normalized(embedder, &texts)?;
        mean_normalized(&vectors)
            .ok_or_else(|| RagError::EmbedderFailure("no query vector produced".to_string()))
    }
}

impl Default for QueryExpander {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingEmbedder;

    impl Embedder for CountingEmbedder {
        fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .enumerate()
                .map(|(i, _)| if i == 0 { vec![2.0, 0.0] } else { vec![0.0, 3.0] })
                .collect())
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    #[test]
    fn test_keyword_variant_needs_three_keywords() {
        let expander = QueryExpander::new();
        assert_eq!(expander.keyword_variant("Who makes the iPhone?"), None);
        assert_eq!(
            expander.keyword_variant("Where is the Eiffel Tower located in 2024?"),
            Some("Eiffel Tower located".to_string())
        );
    }

    #[test]
    fn test_variants_keep_original_first() {
        let expander = QueryExpander::new();
        let variants = expander.variants("What did Enron auditors conclude about Raptor?");
        assert_eq!(variants[0], "What did Enron auditors conclude about Raptor?");
        assert_eq!(variants[1], "Enron auditors conclude Raptor");
    }

    #[test]
    fn test_query_vector_is_normalized_mean() {
        let expander = QueryExpander::new();
        let single = expander.query_vector(&CountingEmbedder, "Bezos").unwrap();
        assert_eq!(single, vec![1.0, 0.0]);

        let mean = expander
            .query_vector(&CountingEmbedder, "Enron auditors conclude Raptor")
            .unwrap();
        let expected = 1.0 / 2.0f32.sqrt();
        assert!((mean[0] - expected).abs() < 1e-6);
        assert!((mean[1] - expected).abs() < 1e-6);
    }
}
