//! Citation extraction and linking

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use crate::types::{CitationRecord, GeneratedAnswer};

/// The sentinel the answer prompt asks for when the context has no answer
pub const NO_ANSWER: &str = "No answer";

fn marker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[(\d+)\]").expect("Invalid regex"))
}

/// Every `[n]` marker in the text, including ones with no matching label
pub fn extract_used_labels(answer: &str) -> BTreeSet<u32> {
    marker_pattern()
        .captures_iter(answer)
        .filter_map(|cap| cap.get(1)?.as_str().parse().ok())
        .collect()
}

/// Resolve markers against the label map.
///
/// Distinct labels in ascending order; markers without a label are dropped.
pub fn resolve_citations(answer: &str, labels: &BTreeMap<u32, String>) -> Vec<CitationRecord> {
    extract_used_labels(answer)
        .into_iter()
        .filter_map(|label| {
            labels
                .get(&label)
                .map(|descriptor| CitationRecord::new(label, descriptor.clone()))
        })
        .collect()
}

/// True when the model replied with the no-answer sentinel
/// (case-insensitive, surrounding whitespace and a trailing period ignored)
pub fn is_no_answer(answer: &str) -> bool {
    let trimmed = answer.trim();
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed).trim_end();
    trimmed.eq_ignore_ascii_case(NO_ANSWER)
}

/// Turn raw model output into the answer text plus its resolved citations.
///
/// A substantive answer that cites nothing valid is attributed to label 1
/// (the highest ranked passage) and gets a trailing ` [1]` marker.
pub fn link_citations(raw: &str, labels: &BTreeMap<u32, String>) -> (GeneratedAnswer, Vec<CitationRecord>) {
    let text = raw.trim().to_string();
    let mut citations = resolve_citations(&text, labels);

    let mut answer = GeneratedAnswer {
        used_labels: citations.iter().map(|c| c.label).collect(),
        text,
    };

    if citations.is_empty() && !is_no_answer(&answer.text) {
        if let Some(first) = labels.get(&1) {
            tracing::debug!("Answer cited no valid label, attributing to [1]");
            answer.text.push_str(" [1]");
            answer.used_labels.insert(1);
            citations.push(CitationRecord::new(1, first.clone()));
        }
    }

    (answer, citations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn labels(n: u32) -> BTreeMap<u32, String> {
        (1..=n).map(|i| (i, format!("doc{}.pdf, p.{}", i, i))).collect()
    }

    #[test]
    fn test_unknown_labels_dropped() {
        let citations = resolve_citations("Mitosis [1] yields two cells [7].", &labels(3));
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].display(), "[1] doc1.pdf, p.1");
    }

    #[test]
    fn test_distinct_ascending() {
        let citations = resolve_citations("[3] then [1] and [3] again, [2]", &labels(3));
        let order: Vec<u32> = citations.iter().map(|c| c.label).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_numeric_not_lexicographic_order() {
        let citations = resolve_citations("[10] and [9]", &labels(10));
        let order: Vec<u32> = citations.iter().map(|c| c.label).collect();
        assert_eq!(order, vec![9, 10]);
    }

    #[test]
    fn test_huge_marker_ignored() {
        assert!(extract_used_labels("[99999999999999999999]").is_empty());
    }

    #[test]
    fn test_no_answer_detection() {
        assert!(is_no_answer("No answer"));
        assert!(is_no_answer("  no answer. "));
        assert!(is_no_answer("NO ANSWER"));
        assert!(!is_no_answer("No answer is possible without [1]"));
        assert!(!is_no_answer("The answer is 42 [1]"));
    }

    #[test]
    fn test_fallback_attributes_label_one() {
        let (answer, citations) = link_citations("ATP is the energy currency.", &labels(3));
        assert_eq!(answer.text, "ATP is the energy currency. [1]");
        assert_eq!(citations, vec![CitationRecord::new(1, "doc1.pdf, p.1")]);
        assert!(answer.used_labels.contains(&1));
    }

    #[test]
    fn test_no_fallback_for_sentinel_or_empty_context() {
        let (answer, citations) = link_citations("No answer", &labels(3));
        assert_eq!(answer.text, "No answer");
        assert!(citations.is_empty());

        let (answer, citations) = link_citations("Something", &BTreeMap::new());
        assert_eq!(answer.text, "Something");
        assert!(citations.is_empty());
    }

    #[test]
    fn test_no_fallback_when_valid_marker_present() {
        let (answer, citations) = link_citations("Yes [2].", &labels(3));
        assert_eq!(answer.text, "Yes [2].");
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].label, 2);
    }

    proptest! {
        #[test]
        fn prop_resolved_labels_exist(
            text in "[a-z \\[\\]0-9]{0,80}",
            n in 0u32..6,
        ) {
            let map = labels(n);
            for citation in resolve_citations(&text, &map) {
                prop_assert!(map.contains_key(&citation.label));
            }
        }
    }
}
