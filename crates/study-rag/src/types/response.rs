//! Response types for chat and summary requests

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A resolved citation: label plus human readable source descriptor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CitationRecord {
    pub label: u32,
    pub source_descriptor: String,
}

impl CitationRecord {
    pub fn new(label: u32, source_descriptor: impl Into<String>) -> Self {
        Self {
            label,
            source_descriptor: source_descriptor.into(),
        }
    }

    /// Display form stored with a QA turn, e.g. `[1] notes.pdf, p.3`
    pub fn display(&self) -> String {
        format!("[{}] {}", self.label, self.source_descriptor)
    }
}

/// Raw generation result plus the labels it cites
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedAnswer {
    pub text: String,
    pub used_labels: BTreeSet<u32>,
}

/// Answer returned by the smart chat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub session_id: i64,
    pub turn_id: i64,
    pub answer: String,
    /// False when the model replied with the no-answer sentinel
    pub has_answer: bool,
    pub citations: Vec<CitationRecord>,
    /// `[n] descriptor` strings in ascending label order
    pub citation_texts: Vec<String>,
    /// Passages that went into the prompt
    pub passages_used: usize,
}

/// Result of a grounded summary run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryOutcome {
    pub summary_id: i64,
    pub summary: String,
    /// Whether the judge accepted the final candidate
    pub ok: bool,
    pub reason: String,
}
