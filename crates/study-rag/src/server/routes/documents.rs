//! Document upload endpoints

use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use serde::Deserialize;

use super::{SubjectQuery, UserId};
use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{Document, SourceKind, TextBlock, UploadInput, UploadReceipt};

/// JSON upload of text already extracted page by page
#[derive(Debug, Deserialize)]
pub struct BlocksUpload {
    pub subject_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_blocks_kind")]
    pub source_kind: SourceKind,
    pub blocks: Vec<TextBlock>,
}

fn default_blocks_kind() -> SourceKind {
    SourceKind::Pdf
}

/// POST /api/documents - multipart with `subject_id`, optional `title`,
/// `text` and `file` (UTF-8 text, markdown or HTML)
pub async fn upload_multipart(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    mut multipart: Multipart,
) -> Result<Json<UploadReceipt>> {
    let mut subject_id = None;
    let mut title = None;
    let mut blocks = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::invalid_input(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        let filename = field.file_name().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::invalid_input(format!("Failed to read field '{}': {}", name, e)))?;

        match name.as_str() {
            "subject_id" => {
                let raw = String::from_utf8_lossy(&data);
                let id = raw
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| Error::invalid_input(format!("subject_id '{}' is not a number", raw.trim())))?;
                subject_id = Some(id);
            }
            "title" => title = Some(String::from_utf8_lossy(&data).into_owned()),
            "text" => {
                if !data.is_empty() {
                    blocks.push(TextBlock::new(String::from_utf8_lossy(&data).into_owned()));
                }
            }
            "file" => {
                if data.is_empty() {
                    continue;
                }
                let text = String::from_utf8(data.to_vec()).map_err(|_| {
                    Error::invalid_input(
                        "file must be UTF-8 text; send extracted PDF pages to /api/documents/blocks",
                    )
                })?;
                if title.is_none() {
                    title = filename;
                }
                blocks.push(TextBlock::new(text));
            }
            other => tracing::debug!("Ignoring multipart field '{}'", other),
        }
    }

    tracing::info!("Upload for subject {:?}: {} blocks", subject_id, blocks.len());

    let receipt = state
        .services()
        .documents
        .upload(
            user_id,
            UploadInput {
                subject_id,
                title,
                source_kind: SourceKind::Text,
                blocks,
            },
        )
        .await?;
    Ok(Json(receipt))
}

/// POST /api/documents/blocks
pub async fn upload_blocks(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(body): Json<BlocksUpload>,
) -> Result<Json<UploadReceipt>> {
    let receipt = state
        .services()
        .documents
        .upload(
            user_id,
            UploadInput {
                subject_id: body.subject_id,
                title: body.title,
                source_kind: body.source_kind,
                blocks: body.blocks,
            },
        )
        .await?;
    Ok(Json(receipt))
}

/// GET /api/documents?subject_id=
pub async fn list_documents(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Query(query): Query<SubjectQuery>,
) -> Result<Json<Vec<Document>>> {
    Ok(Json(state.services().documents.list(user_id, query.subject_id).await?))
}
