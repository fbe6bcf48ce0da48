//! Configuration for the study assistant

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyRagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Where the database and vector collections live
    pub storage: StorageConfig,
    /// Chunking for uploaded documents
    pub chunking: ChunkingConfig,
    /// Quiz material registry and generator settings
    pub quiz: QuizConfig,
    /// Retrieval and re-rank cutoffs
    pub retrieval: RetrievalConfig,
    /// Ollama/LLM configuration
    pub llm: LlmConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Re-ranker selection
    pub reranker: RerankerConfig,
    /// CRAG loop settings
    pub grounding: GroundingConfig,
}

impl StudyRagConfig {
    /// Load configuration from a TOML file; missing sections fall back to defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("Invalid config {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject combinations the pipeline cannot honour
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.quiz.chunk_size == 0 || self.quiz.chunk_overlap >= self.quiz.chunk_size {
            return Err(Error::Config(
                "quiz.chunk_overlap must be smaller than a non-zero quiz.chunk_size".to_string(),
            ));
        }
        if self.retrieval.final_k == 0 {
            return Err(Error::Config("retrieval.final_k must be at least 1".to_string()));
        }
        if self.retrieval.candidate_k < self.retrieval.final_k {
            return Err(Error::Config(format!(
                "retrieval.candidate_k ({}) must be >= retrieval.final_k ({})",
                self.retrieval.candidate_k, self.retrieval.final_k
            )));
        }
        if self.llm.timeout_secs == 0 {
            return Err(Error::Config("llm.timeout_secs must be positive".to_string()));
        }
        if self.reranker.max_length == 0 || self.reranker.batch_size == 0 {
            return Err(Error::Config(
                "reranker.max_length and reranker.batch_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 25MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 25 * 1024 * 1024,
        }
    }
}

/// Storage locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Root directory holding one sub-directory per vector collection
    pub index_root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Absolute path so relative working directories never matter
        let base = dirs::data_local_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/")))
            .join("study-rag");

        Self {
            database_path: base.join("study.db"),
            index_root: base.join("indexes"),
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunking.chunk_size must be at least 1".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 50,
        }
    }
}

/// Quiz generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    /// Registry chunk size (characters)
    pub chunk_size: usize,
    /// Registry chunk overlap (characters)
    pub chunk_overlap: usize,
    /// Chunks sampled as context per question
    pub sample_span: usize,
    /// Upper bound on questions per request
    pub max_questions: usize,
    /// Minimum best re-rank score for a generated item to count as grounded
    pub grounding_threshold: f32,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 60,
            sample_span: 1,
            max_questions: 20,
            grounding_threshold: 0.2,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Candidates fetched from the vector index (K1)
    pub candidate_k: usize,
    /// Passages kept after re-ranking (K2)
    pub final_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            candidate_k: 8,
            final_k: 5,
        }
    }
}

/// LLM (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Generation model name
    pub generate_model: String,
    /// Judge model for grounding checks (defaults to the generation model)
    pub judge_model: Option<String>,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn judge_model(&self) -> &str {
        self.judge_model.as_deref().unwrap_or(&self.generate_model)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            generate_model: "llama3.2:3b".to_string(),
            judge_model: None,
            temperature: 0.4,
            timeout_secs: 60,
            max_retries: 1,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding model served by Ollama
    pub model: String,
    /// Embedding dimensions (768 for nomic-embed-text)
    pub dimensions: usize,
    /// Concurrent embedding requests during upload
    pub concurrency: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            concurrency: 4,
        }
    }
}

/// Which secondary relevance model scores retrieved candidates
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RerankerKind {
    /// ONNX cross-encoder scoring each (query, passage) pair jointly
    #[default]
    CrossEncoder,
    /// Cosine similarity under a dedicated embedding model
    Embedding,
    /// Term-overlap scoring, no model at all
    Lexical,
}

/// Re-ranker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankerConfig {
    pub kind: RerankerKind,
    /// Hugging Face repository of the cross-encoder (ONNX export under `onnx/`)
    pub cross_encoder_model: String,
    /// Where the cross-encoder model and tokenizer are cached
    pub cache_dir: PathBuf,
    /// Token budget for one (query, passage) pair
    pub max_length: usize,
    /// Pairs scored per inference run
    pub batch_size: usize,
    /// Embedding model used when `kind = "embedding"`
    pub model: String,
    /// Output dimensions of that model
    pub dimensions: usize,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("study-rag")
            .join("reranker");

        Self {
            kind: RerankerKind::CrossEncoder,
            cross_encoder_model: "BAAI/bge-reranker-base".to_string(),
            cache_dir,
            max_length: 512,
            batch_size: 8,
            model: "mxbai-embed-large".to_string(),
            dimensions: 1024,
        }
    }
}

/// CRAG grounding loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundingConfig {
    /// Refinement rounds after the first candidate
    pub max_iters: usize,
    /// Passages shown to the judge
    pub judge_context: usize,
}

impl Default for GroundingConfig {
    fn default() -> Self {
        Self {
            max_iters: 2,
            judge_context: 6,
        }
    }
}
