//! Quiz endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use super::UserId;
use crate::error::Result;
use crate::server::state::AppState;
use crate::types::quiz::{AnswerResult, AnswerSubmission, Quiz, QuizAttempt};
use crate::types::QuizRequest;

#[derive(Debug, Deserialize)]
pub struct StartAttempt {
    pub quiz_id: i64,
}

/// POST /api/quiz/generate
pub async fn generate(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(request): Json<QuizRequest>,
) -> Result<Json<Quiz>> {
    Ok(Json(state.services().quizzes.generate(user_id, request).await?))
}

/// POST /api/quiz/attempts
pub async fn start_attempt(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(body): Json<StartAttempt>,
) -> Result<Json<QuizAttempt>> {
    Ok(Json(state.services().quizzes.start_attempt(user_id, body.quiz_id).await?))
}

/// POST /api/quiz/attempts/:id/answers
pub async fn submit_answer(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(attempt_id): Path<i64>,
    Json(submission): Json<AnswerSubmission>,
) -> Result<Json<AnswerResult>> {
    Ok(Json(
        state
            .services()
            .quizzes
            .submit_answer(user_id, attempt_id, submission)
            .await?,
    ))
}

/// POST /api/quiz/attempts/:id/finish
pub async fn finish_attempt(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(attempt_id): Path<i64>,
) -> Result<Json<QuizAttempt>> {
    Ok(Json(state.services().quizzes.finish_attempt(user_id, attempt_id).await?))
}
