//! Secondary relevance scoring for retrieved passages

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::Result;

use super::embedding::EmbeddingProvider;
use super::vector_store::cosine_similarity;

/// Scores (query, passage) pairs; higher means more relevant.
///
/// Returns exactly one score per passage, in passage order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>>;

    fn name(&self) -> &'static str;
}

/// Term-overlap scorer: the fraction of distinct query words found in the passage
#[derive(Debug, Clone, Default)]
pub struct LexicalReranker;

impl LexicalReranker {
    pub fn new() -> Self {
        Self
    }

    fn terms(text: &str) -> HashSet<String> {
        text.unicode_words().map(|w| w.to_lowercase()).collect()
    }

    fn overlap(query_terms: &HashSet<String>, passage: &str) -> f32 {
        if query_terms.is_empty() {
            return 0.0;
        }
        let passage_terms = Self::terms(passage);
        let hits = query_terms
            .iter()
            .filter(|t| passage_terms.contains(*t))
            .count();
        hits as f32 / query_terms.len() as f32
    }
}

#[async_trait]
impl Reranker for LexicalReranker {
    async fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>> {
        let query_terms = Self::terms(query);
        Ok(passages
            .iter()
            .map(|p| Self::overlap(&query_terms, p))
            .collect())
    }

    fn name(&self) -> &'static str {
        "lexical"
    }
}

/// Scores passages by cosine similarity under a separate embedding model
pub struct EmbeddingReranker {
    embedder: Arc<dyn EmbeddingProvider>,
}

impl EmbeddingReranker {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedder }
    }
}

#[async_trait]
impl Reranker for EmbeddingReranker {
    async fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }
        let query_vector = self.embedder.embed(query).await?;
        let passage_vectors = self.embedder.embed_batch(passages).await?;
        Ok(passage_vectors
            .iter()
            .map(|v| cosine_similarity(&query_vector, v))
            .collect())
    }

    fn name(&self) -> &'static str {
        "embedding"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lexical_scores_overlap() {
        let reranker = LexicalReranker::new();
        let passages = vec![
            "Mitochondria produce ATP for the cell.".to_string(),
            "The French revolution began in 1789.".to_string(),
            "ATP is the energy currency.".to_string(),
        ];
        let scores = reranker
            .score("What do mitochondria produce?", &passages)
            .await
            .unwrap();

        assert_eq!(scores.len(), 3);
        assert!(scores[0] > scores[1]);
        assert!(scores[0] > scores[2]);
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[tokio::test]
    async fn test_lexical_case_insensitive() {
        let reranker = LexicalReranker::new();
        let scores = reranker
            .score("PHOTOSYNTHESIS", &["photosynthesis in leaves".to_string()])
            .await
            .unwrap();
        assert_eq!(scores, vec![1.0]);
    }

    #[tokio::test]
    async fn test_lexical_empty_query() {
        let reranker = LexicalReranker::new();
        let scores = reranker.score("  ?! ", &["anything".to_string()]).await.unwrap();
        assert_eq!(scores, vec![0.0]);
    }
}
