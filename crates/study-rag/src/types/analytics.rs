//! Learning analytics views

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::quiz::{Difficulty, QuestionType};
use super::summary::SummaryKind;

/// Dashboard headline metrics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverviewMetrics {
    pub overall_accuracy: f64,
    pub grade: String,
    pub total_questions_answered: u64,
    pub weekly_delta_percent: f64,
    pub total_correct: u64,
    pub total_study_minutes: u64,
    pub streak_days: u32,
    pub weekly_avg_minutes: u64,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryHistoryItem {
    pub summary_id: i64,
    #[serde(rename = "type")]
    pub kind: SummaryKind,
    pub topic: String,
    pub excerpt: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaSessionHistoryItem {
    pub chat_session_id: i64,
    pub title: String,
    pub last_question: Option<String>,
    pub last_answer_preview: Option<String>,
    pub last_turn_at: Option<DateTime<Utc>>,
    pub turn_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSetHistoryItem {
    pub quizset_id: i64,
    pub requested_count: usize,
    pub difficulty: Difficulty,
    pub types: Vec<QuestionType>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptHistoryItem {
    pub attempt_id: i64,
    pub quizset_id: i64,
    pub submitted_at: DateTime<Utc>,
    pub correct_count: u32,
    pub accuracy: f64,
    pub grade: String,
}

/// Everything a user did within one subject, newest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectHistory {
    pub summaries: Vec<SummaryHistoryItem>,
    pub qa_sessions: Vec<QaSessionHistoryItem>,
    pub quiz_sets: Vec<QuizSetHistoryItem>,
    pub quiz_attempts: Vec<AttemptHistoryItem>,
}
