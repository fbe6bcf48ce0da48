use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which part of the exam-prep summary the caller is after
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SummaryKind {
    /// Core concepts
    #[default]
    Overall,
    /// Common traps and misconceptions
    Traps,
    /// Summary per concept area
    ConceptAreas,
    /// Three-line final summary
    ThreeLines,
}

impl SummaryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overall => "overall",
            Self::Traps => "traps",
            Self::ConceptAreas => "concept_areas",
            Self::ThreeLines => "three_lines",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "traps" => Self::Traps,
            "concept_areas" => Self::ConceptAreas,
            "three_lines" => Self::ThreeLines,
            _ => Self::Overall,
        }
    }
}

/// A persisted summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub id: i64,
    pub user_id: Uuid,
    pub subject_id: i64,
    pub kind: SummaryKind,
    pub topic: String,
    pub content_md: String,
    pub model: String,
    pub grounded: bool,
    pub created_at: DateTime<Utc>,
}
