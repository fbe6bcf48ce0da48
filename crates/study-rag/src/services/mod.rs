//! Application services wired from configuration and injected providers
//!
//! Every model and store the services talk to is passed in through
//! [`Providers`]; nothing is resolved from process-wide state. Production code
//! builds the Ollama-backed set with [`Providers::from_config`], tests build
//! their own.

pub mod analytics;
pub mod chat;
pub mod documents;
pub mod quiz;
pub mod subjects;
pub mod summary;

pub use analytics::{compute_overview, learning_status, letter_grade, AnalyticsService};
pub use chat::ChatService;
pub use documents::{material_name, DocumentService};
pub use quiz::{grade_answer, QuizGenerator, QuizMaterialRegistry, QuizService};
pub use subjects::SubjectService;
pub use summary::SummaryService;

use std::sync::Arc;

use crate::config::{RerankerKind, StudyRagConfig};
use crate::error::Result;
use crate::grounding::GroundingVerifier;
use crate::index::IndexManager;
use crate::ingestion::TextChunker;
use crate::providers::cross_encoder::CrossEncoderReranker;
use crate::providers::local::LocalVectorStore;
use crate::providers::ollama::{OllamaClient, OllamaEmbedder, OllamaLlm};
use crate::providers::reranker::{EmbeddingReranker, LexicalReranker};
use crate::providers::{EmbeddingProvider, LlmProvider, Reranker, VectorStoreProvider};
use crate::retrieval::{RetrievalPipeline, Retriever};
use crate::storage::StudyDb;

/// External models and stores used by the services
#[derive(Clone)]
pub struct Providers {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub store: Arc<dyn VectorStoreProvider>,
    pub llm: Arc<dyn LlmProvider>,
    /// Grounding judge; may be the generation model
    pub judge: Arc<dyn LlmProvider>,
    pub reranker: Arc<dyn Reranker>,
}

impl Providers {
    /// Ollama models plus the local vector store.
    ///
    /// A cross-encoder that cannot be loaded degrades to lexical re-ranking.
    pub async fn from_config(config: &StudyRagConfig) -> Result<Self> {
        let client = Arc::new(OllamaClient::new(&config.llm)?);

        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::new(OllamaEmbedder::from_client(Arc::clone(&client), &config.embeddings));
        let llm: Arc<dyn LlmProvider> = Arc::new(OllamaLlm::from_client(
            Arc::clone(&client),
            config.llm.generate_model.clone(),
            config.llm.temperature,
        ));
        let judge: Arc<dyn LlmProvider> = if config.llm.judge_model() == config.llm.generate_model {
            Arc::clone(&llm)
        } else {
            Arc::new(OllamaLlm::from_client(
                Arc::clone(&client),
                config.llm.judge_model(),
                config.llm.temperature,
            ))
        };

        let reranker: Arc<dyn Reranker> = match config.reranker.kind {
            RerankerKind::CrossEncoder => match CrossEncoderReranker::load(&config.reranker).await {
                Ok(reranker) => Arc::new(reranker),
                Err(e) => {
                    tracing::warn!("Cross-encoder unavailable, using lexical re-ranking: {}", e);
                    Arc::new(LexicalReranker::new())
                }
            },
            RerankerKind::Embedding => Arc::new(EmbeddingReranker::new(Arc::new(
                OllamaEmbedder::with_model(
                    Arc::clone(&client),
                    config.reranker.model.clone(),
                    config.reranker.dimensions,
                ),
            ))),
            RerankerKind::Lexical => Arc::new(LexicalReranker::new()),
        };

        tracing::info!(
            "Providers: embeddings={} ({}), llm={}, judge={}, reranker={}",
            embedder.name(),
            embedder.model(),
            llm.model(),
            judge.model(),
            reranker.name()
        );

        Ok(Self {
            embedder,
            store: Arc::new(LocalVectorStore::new()),
            llm,
            judge,
            reranker,
        })
    }
}

/// All services sharing one database, index and quiz registry
#[derive(Clone)]
pub struct Services {
    pub subjects: SubjectService,
    pub documents: DocumentService,
    pub chat: ChatService,
    pub summaries: SummaryService,
    pub quizzes: QuizService,
    pub analytics: AnalyticsService,
    pub registry: Arc<QuizMaterialRegistry>,
    pub providers: Providers,
}

impl Services {
    pub fn new(config: &StudyRagConfig, db: StudyDb, providers: Providers) -> Result<Self> {
        LocalVectorStore::ensure_root(&config.storage.index_root)?;
        let timeout = config.llm.timeout();

        let index = IndexManager::new(
            db.clone(),
            Arc::clone(&providers.store),
            Arc::clone(&providers.embedder),
            config.storage.index_root.clone(),
            timeout,
        );

        let retriever = Retriever::new(
            Arc::clone(&providers.embedder),
            Arc::clone(&providers.store),
            timeout,
        );
        let pipeline = RetrievalPipeline::new(
            retriever,
            Arc::clone(&providers.reranker),
            config.retrieval.candidate_k,
            config.retrieval.final_k,
            timeout,
        );

        let verifier = GroundingVerifier::new(
            Arc::clone(&providers.llm),
            Arc::clone(&providers.judge),
            config.grounding.max_iters,
            config.grounding.judge_context,
            timeout,
        );

        let chunker = TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?;
        let registry = Arc::new(QuizMaterialRegistry::new(TextChunker::new(
            config.quiz.chunk_size,
            config.quiz.chunk_overlap,
        )?));
        let restored = db.indexed_materials()?;
        if !restored.is_empty() {
            tracing::info!("Restoring quiz material from {} documents", restored.len());
        }
        for material in restored {
            registry.register(material_name(material.subject_id, &material.title), material.texts);
        }

        let generator = QuizGenerator::new(
            Arc::clone(&registry),
            Arc::clone(&providers.llm),
            pipeline.clone(),
            timeout,
            config.quiz.grounding_threshold,
        );

        Ok(Self {
            subjects: SubjectService::new(db.clone()),
            documents: DocumentService::new(db.clone(), index.clone(), chunker, Arc::clone(&registry)),
            chat: ChatService::new(
                db.clone(),
                index.clone(),
                pipeline.clone(),
                Arc::clone(&providers.llm),
                timeout,
            ),
            summaries: SummaryService::new(
                db.clone(),
                index.clone(),
                pipeline,
                verifier,
                Arc::clone(&providers.llm),
            ),
            quizzes: QuizService::new(
                db.clone(),
                index,
                generator,
                config.quiz.sample_span,
                config.quiz.max_questions,
            ),
            analytics: AnalyticsService::new(db),
            registry,
            providers,
        })
    }
}
