#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

use study_rag::providers::local::LocalVectorStore;
use study_rag::providers::reranker::LexicalReranker;
use study_rag::providers::{EmbeddingProvider, GenerationOptions, LlmProvider};
use study_rag::storage::StudyDb;
use study_rag::types::Subject;
use study_rag::{Providers, Result, Services, StudyRagConfig};

pub const DIMS: usize = 64;

/// Deterministic bag-of-words embedder: each word bumps one hashed bucket
pub struct HashEmbedder {
    pub calls: AtomicUsize,
    delay: Option<Duration>,
}

impl HashEmbedder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay: None,
        })
    }

    /// Sleeps before every vector
    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay: Some(delay),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut vector = vec![0.0f32; DIMS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let digest = Sha256::digest(word.to_lowercase().as_bytes());
            vector[digest[0] as usize % DIMS] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    fn model(&self) -> &str {
        "hash-bow"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Replays queued responses in order, repeating the last one
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<String>>,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
            delay: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Sleeps before every response
    pub fn slow(response: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::from(vec![response.to_string()])),
            delay: Some(delay),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate(&self, prompt: &str, _options: &GenerationOptions) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut queue = self.responses.lock();
        let response = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        Ok(response.unwrap_or_default())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}

/// Services over a temporary directory
pub struct Harness {
    pub services: Services,
    pub user: Uuid,
    pub config: StudyRagConfig,
    llm: Arc<ScriptedLlm>,
    judge: Arc<ScriptedLlm>,
    embedder: Arc<HashEmbedder>,
    _dir: TempDir,
}

impl Harness {
    pub fn new(llm: Arc<ScriptedLlm>, judge: Arc<ScriptedLlm>) -> Self {
        Self::with_config(llm, judge, |_| {})
    }

    pub fn with_config(
        llm: Arc<ScriptedLlm>,
        judge: Arc<ScriptedLlm>,
        tweak: impl FnOnce(&mut StudyRagConfig),
    ) -> Self {
        Self::with_embedder(HashEmbedder::new(), llm, judge, tweak)
    }

    pub fn with_embedder(
        embedder: Arc<HashEmbedder>,
        llm: Arc<ScriptedLlm>,
        judge: Arc<ScriptedLlm>,
        tweak: impl FnOnce(&mut StudyRagConfig),
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StudyRagConfig::default();
        config.storage.database_path = dir.path().join("study.db");
        config.storage.index_root = dir.path().join("indexes");
        config.llm.timeout_secs = 5;
        tweak(&mut config);

        let services = build_services(&config, &embedder, &llm, &judge);
        Self {
            services,
            user: Uuid::new_v4(),
            config,
            llm,
            judge,
            embedder,
            _dir: dir,
        }
    }

    /// Fresh services over the same database and index directory, as after a restart
    pub fn restart(&mut self) {
        self.services = build_services(&self.config, &self.embedder, &self.llm, &self.judge);
    }

    pub async fn subject(&self, name: &str) -> Subject {
        self.services
            .subjects
            .get_or_create(self.user, name)
            .await
            .unwrap()
    }
}

fn build_services(
    config: &StudyRagConfig,
    embedder: &Arc<HashEmbedder>,
    llm: &Arc<ScriptedLlm>,
    judge: &Arc<ScriptedLlm>,
) -> Services {
    let db = StudyDb::new(&config.storage.database_path).unwrap();
    let providers = Providers {
        embedder: embedder.clone(),
        store: Arc::new(LocalVectorStore::new()),
        llm: llm.clone(),
        judge: judge.clone(),
        reranker: Arc::new(LexicalReranker::new()),
    };
    Services::new(config, db, providers).unwrap()
}
