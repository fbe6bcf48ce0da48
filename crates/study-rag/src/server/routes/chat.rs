//! Smart chat endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::{SubjectQuery, UserId};
use crate::error::Result;
use crate::server::state::AppState;
use crate::types::chat::{ChatSession, QaTurn};
use crate::types::{AskRequest, ChatAnswer};

/// POST /api/chat/ask
pub async fn ask(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(request): Json<AskRequest>,
) -> Result<Json<ChatAnswer>> {
    tracing::info!("Question for subject {}: \"{}\"", request.subject_id, request.question);
    Ok(Json(state.services().chat.ask(user_id, request).await?))
}

/// GET /api/chat/sessions?subject_id=
pub async fn list_sessions(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Query(query): Query<SubjectQuery>,
) -> Result<Json<Vec<ChatSession>>> {
    Ok(Json(state.services().chat.sessions(user_id, query.subject_id).await?))
}

/// GET /api/chat/sessions/:id/turns
pub async fn list_turns(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(session_id): Path<i64>,
) -> Result<Json<Vec<QaTurn>>> {
    Ok(Json(state.services().chat.turns(user_id, session_id).await?))
}
