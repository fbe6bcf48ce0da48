//! Transient per-query retrieval results

use serde::{Deserialize, Serialize};

use super::document::Chunk;

/// A chunk returned by nearest-neighbour search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    /// Cosine similarity to the query vector (higher is closer)
    pub similarity: f32,
}

/// A retrieved chunk after re-ranking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedChunk {
    pub chunk: Chunk,
    pub similarity: f32,
    pub rerank_score: f32,
    /// 0-based position in the original retrieval order
    pub retrieval_rank: usize,
}
