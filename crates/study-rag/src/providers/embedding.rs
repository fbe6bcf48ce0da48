//! Text embeddings for chunks and queries

use async_trait::async_trait;
use crate::error::Result;

/// Maps text to a fixed-length vector.
///
/// The same text must always map to the same vector for a given model, and
/// chunks and queries of one collection must share that model.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, order preserved.
    ///
    /// Falls back to one `embed` call per text.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Vector length (768 for nomic-embed-text)
    fn dimensions(&self) -> usize;

    /// Model name recorded on every index built with this provider
    fn model(&self) -> &str;

    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logs and timeout errors
    fn name(&self) -> &str;
}
