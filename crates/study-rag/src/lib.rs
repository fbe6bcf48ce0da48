//! study-rag: study-assistant backend built on retrieval-augmented generation
//!
//! Users upload study material into per-subject vector indexes, then ask cited
//! questions, request summaries checked by a grounding judge, and generate and
//! take quizzes. Quiz attempts feed the learning analytics.
//!
//! Embedding, generation, re-ranking and vector storage sit behind the traits
//! in [`providers`]; the services in [`services`] receive them explicitly.

pub mod config;
pub mod error;
pub mod generation;
pub mod grounding;
pub mod index;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod services;
pub mod storage;
pub mod types;

pub use config::StudyRagConfig;
pub use error::{Error, IndexState, Result};
pub use services::{Providers, Services};
pub use types::{
    AskRequest, ChatAnswer, Chunk, CitationRecord, QuizRequest, SummaryOutcome, SummaryRequest,
    TextBlock, UploadInput, UploadReceipt,
};
