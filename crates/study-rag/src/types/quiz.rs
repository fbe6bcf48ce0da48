//! Quiz types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::response::CitationRecord;

/// Question format
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum QuestionType {
    /// Four options, exactly one correct
    #[default]
    MultipleChoice,
    /// Short keyword answer
    ShortAnswer,
    /// Free text graded against key points
    Essay,
}

impl QuestionType {
    /// Lenient parse accepting the aliases models and clients tend to use
    pub fn normalize(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "multiple_choice" | "multiple" | "mcq" | "choice" | "객관식" => Some(Self::MultipleChoice),
            "short_answer" | "short" | "단답형" => Some(Self::ShortAnswer),
            "essay" | "subjective" | "long_answer" | "주관식" | "서술형" => Some(Self::Essay),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple_choice",
            Self::ShortAnswer => "short_answer",
            Self::Essay => "essay",
        }
    }
}

impl TryFrom<String> for QuestionType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::normalize(&value).ok_or_else(|| format!("unknown question type '{}'", value))
    }
}

impl From<QuestionType> for String {
    fn from(value: QuestionType) -> Self {
        value.as_str().to_string()
    }
}

/// Question difficulty
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn normalize(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" | "쉬움" => Some(Self::Easy),
            "medium" | "normal" | "moderate" | "보통" => Some(Self::Medium),
            "hard" | "difficult" | "어려움" => Some(Self::Hard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl TryFrom<String> for Difficulty {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::normalize(&value).ok_or_else(|| format!("unknown difficulty '{}'", value))
    }
}

impl From<Difficulty> for String {
    fn from(value: Difficulty) -> Self {
        value.as_str().to_string()
    }
}

/// Shape the generation model is asked to emit for one item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizItemDraft {
    #[serde(default, rename = "type")]
    pub question_type: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    pub question: String,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    pub answer: String,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// A generated quiz question
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizQuestion {
    /// 1-based position in the set
    pub id: u32,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Correct option text, keyword answer, or grading key points
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default)]
    pub citations: Vec<CitationRecord>,
}

/// Generator output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSet {
    /// Material the items were drawn from
    pub source: String,
    pub items: Vec<QuizQuestion>,
}

/// A persisted question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredQuestion {
    pub question_id: i64,
    #[serde(flatten)]
    pub question: QuizQuestion,
}

/// A persisted quiz
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub user_id: Uuid,
    pub subject_id: i64,
    pub title: String,
    pub requested_count: usize,
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub questions: Vec<StoredQuestion>,
}

/// One attempt at a quiz
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: i64,
    pub quiz_id: i64,
    pub user_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub correct_count: u32,
    pub accuracy: f64,
}

/// Answer to one question inside an attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSubmission {
    pub question_id: i64,
    pub user_answer: String,
    /// Time spent on the question in milliseconds
    #[serde(default)]
    pub time_ms: u64,
}

/// Grading result for one submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    pub attempt_item_id: i64,
    pub question_id: i64,
    pub is_correct: bool,
    pub correct_answer: String,
    pub explanation: Option<String>,
}
