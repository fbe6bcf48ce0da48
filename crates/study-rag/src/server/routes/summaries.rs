//! Summary endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use super::{SubjectQuery, UserId};
use crate::error::Result;
use crate::server::state::AppState;
use crate::types::summary::SummaryRecord;
use crate::types::{SummaryOutcome, SummaryRequest};

/// POST /api/summaries
pub async fn create_summary(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(request): Json<SummaryRequest>,
) -> Result<Json<SummaryOutcome>> {
    Ok(Json(state.services().summaries.create(user_id, request).await?))
}

/// GET /api/summaries?subject_id=
pub async fn list_summaries(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Query(query): Query<SubjectQuery>,
) -> Result<Json<Vec<SummaryRecord>>> {
    Ok(Json(state.services().summaries.list(user_id, query.subject_id).await?))
}
