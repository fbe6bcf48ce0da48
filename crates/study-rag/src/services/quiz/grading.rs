//! Answer grading

use crate::ingestion::normalize::collapse_whitespace;
use crate::types::{QuestionType, QuizQuestion};

/// Leading characters of an essay key the answer must mention
const ESSAY_KEY_PREFIX: usize = 8;

/// Lowercase, collapse whitespace, trim
pub fn normalize_answer(text: &str) -> String {
    collapse_whitespace(&text.to_lowercase())
}

/// Whether `user_answer` is correct for `question`
pub fn grade_answer(question: &QuizQuestion, user_answer: &str) -> bool {
    let given = normalize_answer(user_answer);
    let expected = normalize_answer(&question.answer);
    if given.is_empty() {
        return false;
    }

    match question.question_type {
        QuestionType::MultipleChoice => {
            let options = question.options.as_deref().unwrap_or_default();
            // An answer spelled like an option is that option, never an index
            if given == expected || options.iter().any(|o| normalize_answer(o) == given) {
                return given == expected;
            }
            match resolve_option(&given, options.len()) {
                Some(index) => normalize_answer(&options[index]) == expected,
                None => false,
            }
        }
        QuestionType::ShortAnswer => given == expected,
        QuestionType::Essay => {
            let key: String = expected.chars().take(ESSAY_KEY_PREFIX).collect();
            !key.is_empty() && given.contains(&key)
        }
    }
}

/// Map a letter (`a`-`d`) or number to an option index.
///
/// Numbers from 1 are 1-based; `0` names the first option.
pub(super) fn resolve_option(given: &str, option_count: usize) -> Option<usize> {
    let index = if let Ok(n) = given.parse::<usize>() {
        n.saturating_sub(1)
    } else {
        let mut chars = given.chars();
        match (chars.next(), chars.next()) {
            (Some(c @ 'a'..='d'), None) => c as usize - 'a' as usize,
            _ => return None,
        }
    };
    (index < option_count).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Difficulty;

    fn question(question_type: QuestionType, answer: &str, options: Option<Vec<&str>>) -> QuizQuestion {
        QuizQuestion {
            id: 1,
            question_type,
            difficulty: Difficulty::Medium,
            question: "q".to_string(),
            options: options.map(|o| o.into_iter().map(String::from).collect()),
            answer: answer.to_string(),
            explanation: None,
            citations: vec![],
        }
    }

    fn mcq() -> QuizQuestion {
        question(
            QuestionType::MultipleChoice,
            "Mitochondria",
            Some(vec!["Nucleus", "Mitochondria", "Ribosome", "Golgi body"]),
        )
    }

    #[test]
    fn test_normalize_answer() {
        assert_eq!(normalize_answer("  The   Krebs\nCycle "), "the krebs cycle");
    }

    #[test]
    fn test_mcq_by_text() {
        assert!(grade_answer(&mcq(), " mitochondria "));
        assert!(!grade_answer(&mcq(), "Nucleus"));
    }

    #[test]
    fn test_mcq_by_index_and_letter() {
        let q = mcq();
        assert!(grade_answer(&q, "2"));
        assert!(grade_answer(&q, "B"));
        assert!(!grade_answer(&q, "1"));
        assert!(!grade_answer(&q, "a"));
        assert!(!grade_answer(&q, "9"));
        assert!(!grade_answer(&q, "e"));
    }

    #[test]
    fn test_mcq_zero_is_first_option() {
        let q = question(
            QuestionType::MultipleChoice,
            "Nucleus",
            Some(vec!["Nucleus", "Mitochondria", "Ribosome", "Golgi body"]),
        );
        assert!(grade_answer(&q, "0"));
    }

    #[test]
    fn test_numeric_options_match_text_before_index() {
        let q = question(
            QuestionType::MultipleChoice,
            "3",
            Some(vec!["2", "3", "4", "5"]),
        );
        assert!(!grade_answer(&q, "2"));
        assert!(grade_answer(&q, "3"));
        assert!(!grade_answer(&q, "4"));
        assert!(grade_answer(&q, "b"));
        assert!(!grade_answer(&q, "a"));
    }

    #[test]
    fn test_short_answer_exact_after_normalization() {
        let q = question(QuestionType::ShortAnswer, "Photosynthesis", None);
        assert!(grade_answer(&q, "PHOTOSYNTHESIS"));
        assert!(!grade_answer(&q, "photo synthesis"));
    }

    #[test]
    fn test_essay_mentions_key_prefix() {
        let q = question(QuestionType::Essay, "Supply and demand set the price", None);
        assert!(grade_answer(&q, "Prices follow supply and demand curves"));
        assert!(!grade_answer(&q, "Prices are set by the government"));
    }

    #[test]
    fn test_empty_answer_is_wrong() {
        assert!(!grade_answer(&mcq(), "   "));
    }
}
