//! API routes for the study assistant

pub mod analytics;
pub mod chat;
pub mod documents;
pub mod quiz;
pub mod subjects;
pub mod summaries;

use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequestParts},
    http::request::Parts,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::Error;
use crate::server::state::AppState;

/// Header carrying the caller's id; authentication happens upstream
pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller identity taken from the `X-User-Id` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| Error::invalid_input("X-User-Id header is required"))?
            .to_str()
            .map_err(|_| Error::invalid_input("X-User-Id header is not valid text"))?;

        Uuid::parse_str(raw.trim())
            .map(UserId)
            .map_err(|e| Error::invalid_input(format!("X-User-Id is not a UUID: {}", e)))
    }
}

/// `?subject_id=` filter
#[derive(Debug, Deserialize)]
pub struct SubjectQuery {
    pub subject_id: i64,
}

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/subjects", post(subjects::create_subject).get(subjects::list_subjects))
        .route(
            "/documents",
            post(documents::upload_multipart)
                .get(documents::list_documents)
                .layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route(
            "/documents/blocks",
            post(documents::upload_blocks).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/chat/ask", post(chat::ask))
        .route("/chat/sessions", get(chat::list_sessions))
        .route("/chat/sessions/:id/turns", get(chat::list_turns))
        .route("/summaries", post(summaries::create_summary).get(summaries::list_summaries))
        .route("/quiz/generate", post(quiz::generate))
        .route("/quiz/attempts", post(quiz::start_attempt))
        .route("/quiz/attempts/:id/answers", post(quiz::submit_answer))
        .route("/quiz/attempts/:id/finish", post(quiz::finish_attempt))
        .route("/analytics/overview", get(analytics::overview))
        .route("/analytics/subjects/:id/history", get(analytics::subject_history))
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "study-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Study assistant with per-subject indexes, cited answers, grounded summaries and quizzes",
        "auth": "Send the caller's UUID in the X-User-Id header",
        "endpoints": {
            "POST /api/subjects": "Get or create a subject by name",
            "GET /api/subjects": "List subjects",
            "POST /api/documents": "Upload a text file or pasted text (multipart)",
            "POST /api/documents/blocks": "Upload pre-extracted page blocks (JSON)",
            "GET /api/documents?subject_id=": "List documents of a subject",
            "POST /api/chat/ask": "Ask a question with citations",
            "GET /api/chat/sessions?subject_id=": "List chat sessions",
            "GET /api/chat/sessions/:id/turns": "List turns of a session",
            "POST /api/summaries": "Create a grounded exam-prep summary",
            "GET /api/summaries?subject_id=": "List summaries",
            "POST /api/quiz/generate": "Generate and store a quiz",
            "POST /api/quiz/attempts": "Start an attempt",
            "POST /api/quiz/attempts/:id/answers": "Submit and grade one answer",
            "POST /api/quiz/attempts/:id/finish": "Finish an attempt",
            "GET /api/analytics/overview": "Headline learning metrics",
            "GET /api/analytics/subjects/:id/history": "Activity history of a subject"
        }
    }))
}
