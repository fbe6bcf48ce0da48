//! Vector index bookkeeping types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Identifies one (user, subject) vector collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorIndexHandle {
    pub id: i64,
    pub user_id: Uuid,
    pub subject_id: i64,
    /// Stable collection name derived from the (user, subject) pair
    pub collection_id: String,
    /// Vector store provider name
    pub provider: String,
    pub embedding_model_name: String,
    pub storage_location: PathBuf,
    pub chunk_count: u64,
    pub doc_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-document indexing status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorDocStatus {
    Queued,
    Embedding,
    Done,
    Failed,
}

impl VectorDocStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Embedding => "embedding",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "embedding" => Self::Embedding,
            "done" => Self::Done,
            "failed" => Self::Failed,
            _ => Self::Queued,
        }
    }
}

/// One document's contribution to a vector index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDoc {
    pub id: i64,
    pub vector_index_id: i64,
    pub document_id: i64,
    pub chunk_count: u64,
    pub status: VectorDocStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
