use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A smart chat session scoped to one subject
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: i64,
    pub user_id: Uuid,
    pub subject_id: i64,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One question/answer exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaTurn {
    pub id: i64,
    pub session_id: i64,
    pub user_id: Uuid,
    pub question: String,
    pub answer: String,
    pub has_answer: bool,
    /// `[n] descriptor` strings
    pub citations: Vec<String>,
    pub created_at: DateTime<Utc>,
}
