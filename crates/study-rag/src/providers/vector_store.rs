//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;
use crate::types::{Chunk, RetrievedChunk};

/// Names one collection and where its data lives
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionSpec {
    pub name: String,
    pub location: PathBuf,
}

impl CollectionSpec {
    pub fn new(name: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }
}

/// A chunk paired with its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// Trait for vector storage and similarity search
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Add chunk/vector pairs, creating the collection if needed.
    /// Returns the number of entries written.
    async fn upsert(&self, collection: &CollectionSpec, entries: Vec<EmbeddedChunk>) -> Result<usize>;

    /// The `k` most similar chunks, best first. A missing or empty collection
    /// yields an empty result rather than an error.
    async fn query(
        &self,
        collection: &CollectionSpec,
        query_vector: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedChunk>>;

    /// Number of vectors stored in the collection (0 when missing)
    async fn count(&self, collection: &CollectionSpec) -> Result<usize>;

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Cosine similarity; 0.0 for mismatched or zero-length vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
