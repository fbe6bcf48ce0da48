//! Subject, document and chunk types with source tracking for citations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's study subject (course)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: i64,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Where a document's text came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Extracted page by page from a PDF (by an external extractor)
    Pdf,
    /// Pasted text or a plain text file
    Text,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Text => "text",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            _ => Self::Text,
        }
    }
}

/// Document lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Uploaded,
    Parsed,
    Indexed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Parsed => "parsed",
            Self::Indexed => "indexed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "parsed" => Self::Parsed,
            "indexed" => Self::Indexed,
            _ => Self::Uploaded,
        }
    }
}

/// An uploaded study document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub user_id: Uuid,
    pub subject_id: i64,
    /// Display title (original filename for file uploads)
    pub title: String,
    pub source_kind: SourceKind,
    /// SHA-256 of the normalized text
    pub text_hash: Option<String>,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
}

/// One block of already-extracted text (a PDF page, or a whole pasted text)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextBlock {
    pub text: String,
    /// 1-based page number when the block came from a paginated source
    #[serde(default)]
    pub page: Option<u32>,
}

impl TextBlock {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            page: None,
        }
    }

    pub fn page(text: impl Into<String>, page: u32) -> Self {
        Self {
            text: text.into(),
            page: Some(page),
        }
    }
}

/// Metadata carried by every chunk into the vector index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkMetadata {
    pub user_id: Uuid,
    pub subject_id: i64,
    pub source: SourceKind,
    /// Human readable source name used in citations
    pub source_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// A chunk of document text. Immutable once embedded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub id: Uuid,
    pub text: String,
    /// Position of the chunk within its document
    pub ordinal: u32,
    pub source_document_id: i64,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn new(
        source_document_id: i64,
        ordinal: u32,
        text: impl Into<String>,
        metadata: ChunkMetadata,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            ordinal,
            source_document_id,
            metadata,
        }
    }
}

/// Validated upload request handed to the document service
#[derive(Debug, Clone)]
pub struct UploadInput {
    pub subject_id: Option<i64>,
    /// Title for the document; defaults by source kind
    pub title: Option<String>,
    pub source_kind: SourceKind,
    pub blocks: Vec<TextBlock>,
}

/// Result of indexing one upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub document_id: i64,
    pub subject_id: i64,
    pub title: String,
    pub chunk_count: usize,
    pub collection: String,
    /// Index totals after this upload
    pub doc_count: u64,
    pub total_chunks: u64,
}
