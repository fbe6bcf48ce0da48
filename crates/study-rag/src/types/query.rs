//! Request types for chat, summary and quiz operations

use serde::{Deserialize, Serialize};

use super::quiz::{Difficulty, QuestionType};
use super::summary::SummaryKind;

/// Smart chat question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub subject_id: i64,
    pub question: String,
    /// Continue an existing session; a new one is opened when absent
    #[serde(default)]
    pub session_id: Option<i64>,
}

impl AskRequest {
    pub fn new(subject_id: i64, question: impl Into<String>) -> Self {
        Self {
            subject_id,
            question: question.into(),
            session_id: None,
        }
    }

    pub fn in_session(mut self, session_id: i64) -> Self {
        self.session_id = Some(session_id);
        self
    }
}

/// Summary request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub subject_id: i64,

    /// Topic or request text (default: full exam-prep summary)
    #[serde(default = "default_topic")]
    pub topic: String,

    #[serde(default, rename = "type")]
    pub kind: SummaryKind,
}

fn default_topic() -> String {
    SummaryRequest::DEFAULT_TOPIC.to_string()
}

impl SummaryRequest {
    pub const DEFAULT_TOPIC: &'static str = "Full exam-prep summary";

    pub fn new(subject_id: i64, topic: impl Into<String>) -> Self {
        Self {
            subject_id,
            topic: topic.into(),
            kind: SummaryKind::default(),
        }
    }

    pub fn with_kind(mut self, kind: SummaryKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Quiz generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizRequest {
    pub subject_id: i64,

    /// Material name in the registry (default: first material of the subject)
    #[serde(default)]
    pub material: Option<String>,

    #[serde(default, rename = "qtype")]
    pub question_type: QuestionType,

    #[serde(default)]
    pub difficulty: Difficulty,

    /// Number of questions (default: 5)
    #[serde(default = "default_num_questions")]
    pub num_questions: usize,

    /// Chunks sampled per question (default: from config)
    #[serde(default)]
    pub sample_span: Option<usize>,

    /// Seed for reproducible sampling
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_num_questions() -> usize {
    5
}

impl QuizRequest {
    pub fn new(subject_id: i64) -> Self {
        Self {
            subject_id,
            material: None,
            question_type: QuestionType::default(),
            difficulty: Difficulty::default(),
            num_questions: default_num_questions(),
            sample_span: None,
            seed: None,
        }
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    pub fn with_type(mut self, question_type: QuestionType) -> Self {
        self.question_type = question_type;
        self
    }

    pub fn with_questions(mut self, n: usize) -> Self {
        self.num_questions = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Limit for history listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

fn default_history_limit() -> usize {
    20
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            limit: default_history_limit(),
        }
    }
}
