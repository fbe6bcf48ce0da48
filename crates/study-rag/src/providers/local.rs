//! Local vector store: one JSON-persisted collection per directory
//!
//! Collections are loaded lazily and cached. Each collection has its own lock,
//! so uploads to one subject never block queries against another. Scans are
//! brute-force cosine, which is plenty for per-subject study material.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::RetrievedChunk;

use super::vector_store::{cosine_similarity, CollectionSpec, EmbeddedChunk, VectorStoreProvider};

const COLLECTION_FILE: &str = "collection.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct CollectionData {
    name: String,
    dimensions: Option<usize>,
    entries: Vec<EmbeddedChunk>,
}

struct Collection {
    file: PathBuf,
    data: CollectionData,
}

impl Collection {
    fn load(spec: &CollectionSpec) -> Result<Option<Self>> {
        let file = spec.location.join(COLLECTION_FILE);
        if !file.exists() {
            return Ok(None);
        }

        let raw = std::fs::read(&file)?;
        let data: CollectionData = serde_json::from_slice(&raw).map_err(|e| {
            Error::vector_db(format!("Corrupt collection {}: {}", file.display(), e))
        })?;

        Ok(Some(Self { file, data }))
    }

    fn empty(spec: &CollectionSpec) -> Self {
        Self {
            file: spec.location.join(COLLECTION_FILE),
            data: CollectionData {
                name: spec.name.clone(),
                dimensions: None,
                entries: Vec::new(),
            },
        }
    }

    /// Validate, write, then swap: a rejected batch or failed write leaves
    /// both memory and disk as they were.
    fn upsert(&mut self, entries: Vec<EmbeddedChunk>) -> Result<usize> {
        let Some(dims) = self
            .data
            .dimensions
            .or_else(|| entries.first().map(|e| e.vector.len()))
        else {
            return Ok(0);
        };
        if let Some(bad) = entries.iter().find(|e| e.vector.len() != dims) {
            return Err(Error::vector_db(format!(
                "Vector dimension mismatch in {}: expected {}, got {}",
                self.data.name,
                dims,
                bad.vector.len()
            )));
        }

        let written = entries.len();
        let mut next = self.data.entries.clone();
        for entry in entries {
            match next.iter_mut().find(|e| e.chunk.id == entry.chunk.id) {
                Some(existing) => *existing = entry,
                None => next.push(entry),
            }
        }

        let staged = CollectionData {
            name: self.data.name.clone(),
            dimensions: Some(dims),
            entries: next,
        };
        write_collection(&self.file, &staged)?;
        self.data = staged;
        Ok(written)
    }

    fn query(&self, query_vector: &[f32], k: usize) -> Vec<RetrievedChunk> {
        let mut scored: Vec<(usize, f32)> = self
            .data
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(query_vector, &e.vector)))
            .collect();

        // Stable: equal scores keep insertion order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(k)
            .map(|(i, similarity)| RetrievedChunk {
                chunk: self.data.entries[i].chunk.clone(),
                similarity,
            })
            .collect()
    }
}

fn write_collection(file: &Path, data: &CollectionData) -> Result<()> {
    if let Some(dir) = file.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let tmp = file.with_extension("json.tmp");
    std::fs::write(&tmp, serde_json::to_vec(data)?)?;
    std::fs::rename(&tmp, file)?;
    Ok(())
}

type SharedCollection = Arc<RwLock<Collection>>;

/// Local vector store rooted at a directory of collections
#[derive(Clone, Default)]
pub struct LocalVectorStore {
    collections: Arc<DashMap<String, SharedCollection>>,
}

impl LocalVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure the root directory for collections exists
    pub fn ensure_root(root: &Path) -> Result<()> {
        std::fs::create_dir_all(root)?;
        Ok(())
    }

    fn resolve(
        collections: &DashMap<String, SharedCollection>,
        spec: &CollectionSpec,
        create: bool,
    ) -> Result<Option<SharedCollection>> {
        if let Some(existing) = collections.get(&spec.name) {
            return Ok(Some(Arc::clone(existing.value())));
        }

        let loaded = match Collection::load(spec)? {
            Some(c) => c,
            None if create => Collection::empty(spec),
            None => return Ok(None),
        };

        let shared = collections
            .entry(spec.name.clone())
            .or_insert_with(|| Arc::new(RwLock::new(loaded)));
        Ok(Some(Arc::clone(shared.value())))
    }
}

#[async_trait]
impl VectorStoreProvider for LocalVectorStore {
    async fn upsert(&self, collection: &CollectionSpec, entries: Vec<EmbeddedChunk>) -> Result<usize> {
        let collections = Arc::clone(&self.collections);
        let spec = collection.clone();

        tokio::task::spawn_blocking(move || {
            let shared = Self::resolve(&collections, &spec, true)?
                .ok_or_else(|| Error::internal("collection was not created"))?;
            let mut guard = shared.write();
            let written = guard.upsert(entries)?;
            tracing::debug!(
                "Upserted {} vectors into {} ({} total)",
                written,
                spec.name,
                guard.data.entries.len()
            );
            Ok(written)
        })
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }

    async fn query(
        &self,
        collection: &CollectionSpec,
        query_vector: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        let collections = Arc::clone(&self.collections);
        let spec = collection.clone();
        let query = query_vector.to_vec();

        tokio::task::spawn_blocking(move || {
            match Self::resolve(&collections, &spec, false)? {
                Some(shared) => Ok(shared.read().query(&query, k)),
                None => Ok(Vec::new()),
            }
        })
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }

    async fn count(&self, collection: &CollectionSpec) -> Result<usize> {
        let collections = Arc::clone(&self.collections);
        let spec = collection.clone();

        tokio::task::spawn_blocking(move || {
            Ok(Self::resolve(&collections, &spec, false)?
                .map(|shared| shared.read().data.entries.len())
                .unwrap_or(0))
        })
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, ChunkMetadata, SourceKind};
    use uuid::Uuid;

    fn entry(text: &str, vector: Vec<f32>) -> EmbeddedChunk {
        let metadata = ChunkMetadata {
            user_id: Uuid::nil(),
            subject_id: 1,
            source: SourceKind::Text,
            source_name: "notes".to_string(),
            page: None,
        };
        EmbeddedChunk {
            chunk: Chunk::new(1, 0, text, metadata),
            vector,
        }
    }

    fn spec(dir: &Path) -> CollectionSpec {
        CollectionSpec::new("study_utest_s1", dir.join("study_utest_s1"))
    }

    #[tokio::test]
    async fn test_missing_collection_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalVectorStore::new();
        let spec = spec(dir.path());

        assert_eq!(store.count(&spec).await.unwrap(), 0);
        assert!(store.query(&spec, &[1.0, 0.0], 5).await.unwrap().is_empty());
        assert!(!spec.location.exists());
    }

    #[tokio::test]
    async fn test_upsert_and_query_ranked() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalVectorStore::new();
        let spec = spec(dir.path());

        store
            .upsert(
                &spec,
                vec![
                    entry("east", vec![1.0, 0.0]),
                    entry("north", vec![0.0, 1.0]),
                    entry("north-east", vec![0.7, 0.7]),
                ],
            )
            .await
            .unwrap();

        let results = store.query(&spec, &[0.0, 1.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.text, "north");
        assert_eq!(results[1].chunk.text, "north-east");
        assert!(results[0].similarity >= results[1].similarity);
    }

    #[tokio::test]
    async fn test_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let spec = spec(dir.path());

        LocalVectorStore::new()
            .upsert(&spec, vec![entry("kept", vec![1.0, 0.0])])
            .await
            .unwrap();

        let reopened = LocalVectorStore::new();
        assert_eq!(reopened.count(&spec).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalVectorStore::new();
        let spec = spec(dir.path());

        store.upsert(&spec, vec![entry("a", vec![1.0, 0.0])]).await.unwrap();
        let err = store
            .upsert(&spec, vec![entry("b", vec![1.0, 0.0, 0.0])])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::VectorDb(_)));
    }

    #[tokio::test]
    async fn test_mixed_dimensions_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalVectorStore::new();
        let spec = spec(dir.path());

        let err = store
            .upsert(
                &spec,
                vec![entry("flat", vec![1.0, 0.0]), entry("deep", vec![1.0, 0.0, 0.0])],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::VectorDb(_)));
        assert_eq!(store.count(&spec).await.unwrap(), 0);
        assert_eq!(LocalVectorStore::new().count(&spec).await.unwrap(), 0);

        // Dimensions are still open after the rejected batch
        store
            .upsert(&spec, vec![entry("deep", vec![1.0, 0.0, 0.0])])
            .await
            .unwrap();
        assert_eq!(store.count(&spec).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rejected_batch_keeps_existing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalVectorStore::new();
        let spec = spec(dir.path());

        store.upsert(&spec, vec![entry("a", vec![1.0, 0.0])]).await.unwrap();
        store
            .upsert(
                &spec,
                vec![entry("b", vec![0.0, 1.0]), entry("c", vec![1.0, 1.0, 1.0])],
            )
            .await
            .unwrap_err();

        assert_eq!(store.count(&spec).await.unwrap(), 1);
        assert_eq!(LocalVectorStore::new().count(&spec).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_memory_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();
        let spec = CollectionSpec::new("study_utest_s2", blocker.join("study_utest_s2"));
        let store = LocalVectorStore::new();

        let err = store
            .upsert(&spec, vec![entry("a", vec![1.0, 0.0])])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(store.count(&spec).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_upserts_same_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalVectorStore::new();
        let spec = spec(dir.path());

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            let spec = spec.clone();
            handles.push(tokio::spawn(async move {
                store
                    .upsert(&spec, vec![entry(&format!("c{}", i), vec![i as f32 + 1.0, 1.0])])
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.count(&spec).await.unwrap(), 8);
        assert_eq!(LocalVectorStore::new().count(&spec).await.unwrap(), 8);
    }
}
