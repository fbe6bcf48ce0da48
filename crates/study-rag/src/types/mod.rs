//! Core types for the study assistant

pub mod analytics;
pub mod chat;
pub mod document;
pub mod index;
pub mod query;
pub mod quiz;
pub mod response;
pub mod retrieval;
pub mod summary;

pub use document::{
    Chunk, ChunkMetadata, Document, DocumentStatus, SourceKind, Subject, TextBlock, UploadInput,
    UploadReceipt,
};
pub use index::{VectorDoc, VectorDocStatus, VectorIndexHandle};
pub use query::{AskRequest, HistoryQuery, QuizRequest, SummaryRequest};
pub use quiz::{Difficulty, QuestionType, QuizQuestion, QuizSet};
pub use response::{ChatAnswer, CitationRecord, GeneratedAnswer, SummaryOutcome};
pub use retrieval::{RankedChunk, RetrievedChunk};
pub use summary::SummaryKind;
