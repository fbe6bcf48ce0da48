//! Labeled context, prompts, and citation handling for generated answers

pub mod citation;
pub mod labeler;
pub mod prompt;

pub use citation::{extract_used_labels, is_no_answer, link_citations, resolve_citations, NO_ANSWER};
pub use labeler::{format_source, LabeledContext};
pub use prompt::PromptBuilder;
