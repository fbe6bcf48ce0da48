//! Subject endpoints

use axum::{extract::State, Json};
use serde::Deserialize;

use super::UserId;
use crate::error::Result;
use crate::server::state::AppState;
use crate::types::Subject;

#[derive(Debug, Deserialize)]
pub struct CreateSubject {
    pub name: String,
}

/// POST /api/subjects - get or create by name
pub async fn create_subject(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(body): Json<CreateSubject>,
) -> Result<Json<Subject>> {
    let subject = state.services().subjects.get_or_create(user_id, &body.name).await?;
    Ok(Json(subject))
}

/// GET /api/subjects
pub async fn list_subjects(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> Result<Json<Vec<Subject>>> {
    Ok(Json(state.services().subjects.list(user_id).await?))
}
