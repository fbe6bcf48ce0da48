//! Upload path: normalize, chunk, embed, index and register material

use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::index::IndexManager;
use crate::ingestion::{normalize_blocks, prepare_chunks, TextChunker};
use crate::storage::StudyDb;
use crate::types::{
    ChunkMetadata, Document, DocumentStatus, SourceKind, UploadInput, UploadReceipt,
    VectorDocStatus,
};

use super::quiz::QuizMaterialRegistry;
use super::subjects::require_subject;

/// Registry name for a document's quiz material
pub fn material_name(subject_id: i64, title: &str) -> String {
    format!("{}/{}", subject_id, title)
}

#[derive(Clone)]
pub struct DocumentService {
    db: StudyDb,
    index: IndexManager,
    chunker: TextChunker,
    registry: Arc<QuizMaterialRegistry>,
}

impl DocumentService {
    pub fn new(
        db: StudyDb,
        index: IndexManager,
        chunker: TextChunker,
        registry: Arc<QuizMaterialRegistry>,
    ) -> Self {
        Self {
            db,
            index,
            chunker,
            registry,
        }
    }

    /// Index one upload into the (user, subject) collection
    pub async fn upload(&self, user_id: Uuid, input: UploadInput) -> Result<UploadReceipt> {
        let subject_id = input
            .subject_id
            .ok_or_else(|| Error::invalid_input("subject_id is required"))?;
        if input.blocks.is_empty() {
            return Err(Error::invalid_input("file or text is required"));
        }
        require_subject(&self.db, user_id, subject_id).await?;

        let blocks = normalize_blocks(&input.blocks);
        if blocks.is_empty() {
            return Err(Error::NoTextExtracted);
        }

        let title = input
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_title(input.source_kind).to_string());

        let texts: Vec<String> = blocks.iter().map(|b| b.text.clone()).collect();
        let text_hash = hex::encode(Sha256::digest(texts.join("\n\n").as_bytes()));

        let source_kind = input.source_kind;
        let doc_title = title.clone();
        let hash = text_hash.clone();
        let stored_blocks = blocks.clone();
        let document: Document = self
            .db
            .call(move |db| {
                let document = db.insert_document(user_id, subject_id, &doc_title, source_kind)?;
                db.set_document_hash(document.id, &hash)?;
                db.insert_document_blocks(document.id, &stored_blocks)?;
                Ok(document)
            })
            .await?;

        let base = ChunkMetadata {
            user_id,
            subject_id,
            source: source_kind,
            source_name: title.clone(),
            page: None,
        };
        let chunks = prepare_chunks(&self.chunker, document.id, &blocks, &base);
        let chunk_count = chunks.len();

        let handle = self.index.ensure_handle(user_id, subject_id).await?;

        let (handle_id, document_id) = (handle.id, document.id);
        let vector_doc = self
            .db
            .call(move |db| {
                db.insert_vector_doc(handle_id, document_id, chunk_count as u64, VectorDocStatus::Embedding)
            })
            .await?;

        if let Err(e) = self.index.index_chunks(&handle, chunks).await {
            tracing::warn!("Indexing document {} failed: {}", document.id, e);
            let vector_doc_id = vector_doc.id;
            self.db
                .call(move |db| db.set_vector_doc_status(vector_doc_id, VectorDocStatus::Failed))
                .await?;
            return Err(e);
        }

        let vector_doc_id = vector_doc.id;
        let updated = self
            .db
            .call(move |db| {
                db.set_vector_doc_status(vector_doc_id, VectorDocStatus::Done)?;
                db.set_document_status(document_id, DocumentStatus::Indexed)?;
                db.bump_vector_index(handle_id, 1, chunk_count as u64)
            })
            .await?;

        self.registry
            .register(material_name(subject_id, &title), texts);

        tracing::info!(
            "Uploaded '{}' to subject {}: {} chunks, index now {} docs / {} chunks",
            title,
            subject_id,
            chunk_count,
            updated.doc_count,
            updated.chunk_count
        );

        Ok(UploadReceipt {
            document_id: document.id,
            subject_id,
            title,
            chunk_count,
            collection: updated.collection_id,
            doc_count: updated.doc_count,
            total_chunks: updated.chunk_count,
        })
    }

    pub async fn list(&self, user_id: Uuid, subject_id: i64) -> Result<Vec<Document>> {
        require_subject(&self.db, user_id, subject_id).await?;
        self.db
            .call(move |db| db.list_documents(user_id, subject_id))
            .await
    }
}

fn default_title(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Pdf => "Uploaded PDF",
        SourceKind::Text => "Pasted text",
    }
}
