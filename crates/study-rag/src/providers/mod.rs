//! Provider abstractions for embeddings, generation, re-ranking and vector storage
//!
//! Each external model or store sits behind a trait so the pipeline can run
//! against Ollama and the local store in production and against mocks in tests.
//! Providers are constructed once at startup and shared read-only.

pub mod cross_encoder;
pub mod embedding;
pub mod llm;
pub mod local;
pub mod ollama;
pub mod reranker;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use llm::{GenerationOptions, LlmProvider};
pub use reranker::Reranker;
pub use vector_store::{CollectionSpec, EmbeddedChunk, VectorStoreProvider};

use std::future::Future;
use std::time::Duration;

use crate::error::{Error, Result};

/// Run one external call under a deadline.
///
/// Expiry surfaces as [`Error::ProviderTimeout`] naming the provider and the
/// operation; the inner future is dropped, which cancels the request.
pub async fn bounded<T, F>(provider: &str, operation: &str, timeout: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                "{} {} exceeded {:?}, giving up",
                provider,
                operation,
                timeout
            );
            Err(Error::timeout(provider, operation))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_passes_result_through() {
        let value = bounded("mock", "noop", Duration::from_secs(1), async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let result: Result<()> = bounded("mock", "generate", Duration::from_millis(20), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        match result {
            Err(Error::ProviderTimeout { provider, operation }) => {
                assert_eq!(provider, "mock");
                assert_eq!(operation, "generate");
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
