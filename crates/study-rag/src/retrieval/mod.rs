//! Two-stage retrieval: nearest-neighbour candidates, then re-ranking
//!
//! The retriever fetches `candidate_k` chunks by embedding similarity; the
//! re-ranker re-scores exactly those candidates and keeps the best `final_k`.
//! Ties keep retrieval order, so results are deterministic for fixed inputs.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::providers::{bounded, CollectionSpec, EmbeddingProvider, Reranker, VectorStoreProvider};
use crate::types::{RankedChunk, RetrievedChunk};

/// Embeds a query and searches one collection
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    timeout: Duration,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        timeout: Duration,
    ) -> Self {
        Self {
            embedder,
            store,
            timeout,
        }
    }

    /// Up to `k` candidates, most similar first.
    ///
    /// An empty result is reported as [`Error::NoRelevantMaterial`].
    pub async fn retrieve(
        &self,
        collection: &CollectionSpec,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        let query_vector = bounded(
            self.embedder.name(),
            "embed",
            self.timeout,
            self.embedder.embed(query),
        )
        .await?;

        let candidates = bounded(
            self.store.name(),
            "query",
            self.timeout,
            self.store.query(collection, &query_vector, k),
        )
        .await?;

        tracing::debug!(
            "Retrieved {} candidates from {} (k={})",
            candidates.len(),
            collection.name,
            k
        );

        if candidates.is_empty() {
            return Err(Error::NoRelevantMaterial(query.to_string()));
        }
        Ok(candidates)
    }
}

/// Order candidates by `scores` (descending) and keep the first `k`.
///
/// The sort is stable: candidates with equal scores stay in retrieval order.
/// `scores` must hold one score per candidate.
pub fn rerank(candidates: Vec<RetrievedChunk>, scores: &[f32], k: usize) -> Result<Vec<RankedChunk>> {
    if scores.len() != candidates.len() {
        return Err(Error::internal(format!(
            "re-ranker returned {} scores for {} candidates",
            scores.len(),
            candidates.len()
        )));
    }

    let mut ranked: Vec<RankedChunk> = candidates
        .into_iter()
        .zip(scores)
        .enumerate()
        .map(|(rank, (candidate, score))| RankedChunk {
            chunk: candidate.chunk,
            similarity: candidate.similarity,
            rerank_score: *score,
            retrieval_rank: rank,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.rerank_score
            .partial_cmp(&a.rerank_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(k);
    Ok(ranked)
}

/// Retriever plus re-ranker with the configured cutoffs
#[derive(Clone)]
pub struct RetrievalPipeline {
    retriever: Retriever,
    reranker: Arc<dyn Reranker>,
    candidate_k: usize,
    final_k: usize,
    timeout: Duration,
}

impl RetrievalPipeline {
    pub fn new(
        retriever: Retriever,
        reranker: Arc<dyn Reranker>,
        candidate_k: usize,
        final_k: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            retriever,
            reranker,
            candidate_k,
            final_k,
            timeout,
        }
    }

    pub fn final_k(&self) -> usize {
        self.final_k
    }

    /// Retrieve `candidate_k`, re-rank, keep `final_k`
    pub async fn search(&self, collection: &CollectionSpec, query: &str) -> Result<Vec<RankedChunk>> {
        let candidates = self
            .retriever
            .retrieve(collection, query, self.candidate_k)
            .await?;

        let passages: Vec<String> = candidates.iter().map(|c| c.chunk.text.clone()).collect();
        let scores = bounded(
            self.reranker.name(),
            "rerank",
            self.timeout,
            self.reranker.score(query, &passages),
        )
        .await?;

        let ranked = rerank(candidates, &scores, self.final_k)?;
        tracing::debug!(
            "Re-ranked with {}: kept {} of {} candidates",
            self.reranker.name(),
            ranked.len(),
            passages.len()
        );
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::reranker::MockReranker;
    use crate::types::{Chunk, ChunkMetadata, SourceKind};
    use proptest::prelude::*;
    use uuid::Uuid;

    fn candidate(text: &str, similarity: f32) -> RetrievedChunk {
        let metadata = ChunkMetadata {
            user_id: Uuid::nil(),
            subject_id: 1,
            source: SourceKind::Text,
            source_name: "notes".to_string(),
            page: None,
        };
        RetrievedChunk {
            chunk: Chunk::new(1, 0, text, metadata),
            similarity,
        }
    }

    #[test]
    fn test_rerank_orders_by_score() {
        let candidates = vec![candidate("a", 0.9), candidate("b", 0.8), candidate("c", 0.7)];
        let ranked = rerank(candidates, &[0.1, 0.9, 0.5], 2).unwrap();

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].chunk.text, "b");
        assert_eq!(ranked[0].retrieval_rank, 1);
        assert_eq!(ranked[1].chunk.text, "c");
    }

    #[test]
    fn test_rerank_ties_keep_retrieval_order() {
        let candidates = vec![candidate("a", 0.9), candidate("b", 0.8), candidate("c", 0.7)];
        let ranked = rerank(candidates, &[0.5, 0.5, 0.5], 3).unwrap();
        let order: Vec<_> = ranked.iter().map(|r| r.chunk.text.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_rerank_score_count_mismatch() {
        let err = rerank(vec![candidate("a", 0.9)], &[0.1, 0.2], 1).unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn test_rerank_fewer_than_k() {
        let ranked = rerank(vec![candidate("only", 0.3)], &[0.2], 5).unwrap();
        assert_eq!(ranked.len(), 1);
    }

    #[tokio::test]
    async fn test_mock_reranker_drives_order() {
        let mut mock = MockReranker::new();
        mock.expect_score()
            .returning(|_, passages| Ok(passages.iter().map(|p| p.len() as f32).collect()));
        mock.expect_name().return_const("mock");

        let candidates = vec![candidate("short", 0.9), candidate("much longer text", 0.1)];
        let passages: Vec<String> = candidates.iter().map(|c| c.chunk.text.clone()).collect();
        let scores = mock.score("q", &passages).await.unwrap();
        let ranked = rerank(candidates, &scores, 1).unwrap();
        assert_eq!(ranked[0].chunk.text, "much longer text");
    }

    proptest! {
        #[test]
        fn prop_reranked_subset_of_candidates(
            scores in proptest::collection::vec(-1.0f32..1.0, 0..16),
            k in 0usize..10,
        ) {
            let candidates: Vec<RetrievedChunk> = scores
                .iter()
                .enumerate()
                .map(|(i, _)| candidate(&format!("c{}", i), 1.0 - i as f32 * 0.01))
                .collect();
            let ids: Vec<Uuid> = candidates.iter().map(|c| c.chunk.id).collect();

            let ranked = rerank(candidates, &scores, k).unwrap();

            prop_assert!(ranked.len() <= k.min(ids.len()));
            for r in &ranked {
                prop_assert!(ids.contains(&r.chunk.id));
            }
            for pair in ranked.windows(2) {
                prop_assert!(pair[0].rerank_score >= pair[1].rerank_score);
                if pair[0].rerank_score == pair[1].rerank_score {
                    prop_assert!(pair[0].retrieval_rank < pair[1].retrieval_rank);
                }
            }
        }
    }
}
