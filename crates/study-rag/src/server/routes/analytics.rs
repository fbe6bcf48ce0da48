//! Analytics endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use super::UserId;
use crate::error::Result;
use crate::server::state::AppState;
use crate::types::analytics::{OverviewMetrics, SubjectHistory};
use crate::types::HistoryQuery;

#[derive(Debug, Default, Deserialize)]
pub struct OverviewQuery {
    #[serde(default)]
    pub subject_id: Option<i64>,
}

/// GET /api/analytics/overview[?subject_id=]
pub async fn overview(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Query(query): Query<OverviewQuery>,
) -> Result<Json<OverviewMetrics>> {
    let metrics = state
        .services()
        .analytics
        .overview(user_id, query.subject_id, Utc::now())
        .await?;
    Ok(Json(metrics))
}

/// GET /api/analytics/subjects/:id/history[?limit=]
pub async fn subject_history(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(subject_id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<SubjectHistory>> {
    let history = state
        .services()
        .analytics
        .subject_history(user_id, subject_id, query.limit)
        .await?;
    Ok(Json(history))
}
