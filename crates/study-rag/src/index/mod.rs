//! Per-(user, subject) vector index management
//!
//! A handle row in SQLite records which collection holds a subject's vectors
//! and how many documents and chunks went into it. The collection itself lives
//! in the vector store under `index_root/<collection name>`.

use futures::future::try_join_all;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{Error, IndexState, Result};
use crate::providers::{bounded, CollectionSpec, EmbeddedChunk, EmbeddingProvider, VectorStoreProvider};
use crate::storage::{NewVectorIndex, StudyDb};
use crate::types::{Chunk, VectorIndexHandle};

/// Embedding calls awaited together while indexing
const EMBED_IN_FLIGHT: usize = 8;

/// Stable collection name for a (user, subject) pair.
///
/// `study_u<first 8 hex chars of sha256("<uuid simple>_<subject>")>_s<subject>`
pub fn collection_name(user_id: Uuid, subject_id: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}_{}", user_id.simple(), subject_id).as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("study_u{}_s{}", &digest[..8], subject_id)
}

/// Where the collection for a handle lives on disk
pub fn collection_spec(handle: &VectorIndexHandle) -> CollectionSpec {
    CollectionSpec::new(handle.collection_id.clone(), handle.storage_location.clone())
}

/// Owns the index bookkeeping and the embed-and-upsert path
#[derive(Clone)]
pub struct IndexManager {
    db: StudyDb,
    store: Arc<dyn VectorStoreProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
    index_root: PathBuf,
    timeout: Duration,
}

impl IndexManager {
    pub fn new(
        db: StudyDb,
        store: Arc<dyn VectorStoreProvider>,
        embedder: Arc<dyn EmbeddingProvider>,
        index_root: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            db,
            store,
            embedder,
            index_root: index_root.into(),
            timeout,
        }
    }

    pub fn index_root(&self) -> &Path {
        &self.index_root
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    pub fn store(&self) -> &Arc<dyn VectorStoreProvider> {
        &self.store
    }

    /// Get the handle for (user, subject), creating it on first upload
    pub async fn ensure_handle(&self, user_id: Uuid, subject_id: i64) -> Result<VectorIndexHandle> {
        let name = collection_name(user_id, subject_id);
        let location = self.index_root.join(&name);
        let provider = self.store.name().to_string();
        let model = self.embedder.model().to_string();

        self.db
            .call(move |db| {
                db.ensure_vector_index(&NewVectorIndex {
                    user_id,
                    subject_id,
                    collection_id: &name,
                    provider: &provider,
                    embedding_model_name: &model,
                    storage_location: &location,
                })
            })
            .await
    }

    /// Handle for a query. Fails with `IndexNotReady` when nothing was
    /// uploaded for the pair or the collection holds no vectors.
    pub async fn open(&self, user_id: Uuid, subject_id: i64) -> Result<VectorIndexHandle> {
        let handle = self
            .db
            .call(move |db| db.get_vector_index(user_id, subject_id))
            .await?
            .ok_or(Error::IndexNotReady(IndexState::Missing))?;

        let count = bounded(
            self.store.name(),
            "count",
            self.timeout,
            self.store.count(&collection_spec(&handle)),
        )
        .await?;

        if count == 0 {
            return Err(Error::IndexNotReady(IndexState::Empty));
        }
        Ok(handle)
    }

    /// Embed chunks and upsert them into the handle's collection.
    ///
    /// Returns the number of vectors written. Nothing is written when
    /// embedding fails part way.
    pub async fn index_chunks(&self, handle: &VectorIndexHandle, chunks: Vec<Chunk>) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        // Deadline applies per call, not per upload
        let mut vectors = Vec::with_capacity(chunks.len());
        for round in chunks.chunks(EMBED_IN_FLIGHT) {
            let mut calls = Vec::with_capacity(round.len());
            for chunk in round {
                calls.push(bounded(
                    self.embedder.name(),
                    "embed",
                    self.timeout,
                    self.embedder.embed(&chunk.text),
                ));
            }
            vectors.extend(try_join_all(calls).await?);
        }

        let entries: Vec<EmbeddedChunk> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| EmbeddedChunk { chunk, vector })
            .collect();

        let written = bounded(
            self.store.name(),
            "upsert",
            self.timeout,
            self.store.upsert(&collection_spec(handle), entries),
        )
        .await?;

        tracing::info!(
            "Indexed {} chunks into {} ({})",
            written,
            handle.collection_id,
            self.embedder.model()
        );
        Ok(written)
    }
}
