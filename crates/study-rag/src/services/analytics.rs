//! Learning analytics over quiz attempts, summaries and chat history

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::Result;
use crate::storage::{AttemptItemFact, StudyDb};
use crate::types::analytics::{
    AttemptHistoryItem, OverviewMetrics, QuizSetHistoryItem, SubjectHistory, SummaryHistoryItem,
};

use super::subjects::require_subject;

const EXCERPT_CHARS: usize = 220;
const MS_PER_MINUTE: u64 = 60_000;

pub fn letter_grade(accuracy: f64) -> &'static str {
    match accuracy {
        a if a >= 0.90 => "A",
        a if a >= 0.80 => "B",
        a if a >= 0.70 => "C",
        a if a >= 0.60 => "D",
        _ => "F",
    }
}

pub fn learning_status(accuracy: f64) -> &'static str {
    match accuracy {
        a if a >= 0.90 => "excellent",
        a if a >= 0.80 => "good",
        a if a >= 0.65 => "average",
        _ => "needs effort",
    }
}

/// Headline metrics for the answers in `facts`, as seen on `today` (UTC).
///
/// Weeks start on Monday and are assigned by the attempt's finish time;
/// unfinished attempts count towards totals but not towards any week.
pub fn compute_overview(facts: &[AttemptItemFact], today: NaiveDate) -> OverviewMetrics {
    let total = facts.len() as u64;
    let correct = facts.iter().filter(|f| f.is_correct).count() as u64;
    let accuracy = if total > 0 {
        correct as f64 / total as f64
    } else {
        0.0
    };

    let week_start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
    let prev_week_start = week_start - Duration::days(7);
    let week_end = week_start + Duration::days(7);

    let in_range = |fact: &AttemptItemFact, start: NaiveDate, end: NaiveDate| {
        fact.attempt_finished_at
            .map(|at| {
                let day = at.date_naive();
                day >= start && day < end
            })
            .unwrap_or(false)
    };

    let week: Vec<&AttemptItemFact> = facts
        .iter()
        .filter(|f| in_range(f, week_start, week_end))
        .collect();
    let week_count = week.len() as u64;
    let prev_count = facts
        .iter()
        .filter(|f| in_range(f, prev_week_start, week_start))
        .count() as u64;

    let weekly_delta_percent = if prev_count > 0 {
        (week_count as f64 - prev_count as f64) / prev_count as f64 * 100.0
    } else if week_count > 0 {
        100.0
    } else {
        0.0
    };

    let total_ms: u64 = facts.iter().map(|f| f.time_ms).sum();
    let week_ms: u64 = week.iter().map(|f| f.time_ms).sum();

    OverviewMetrics {
        overall_accuracy: accuracy,
        grade: letter_grade(accuracy).to_string(),
        total_questions_answered: total,
        weekly_delta_percent,
        total_correct: correct,
        total_study_minutes: total_ms / MS_PER_MINUTE,
        streak_days: streak_days(facts, today),
        weekly_avg_minutes: (week_ms / MS_PER_MINUTE) / 7,
        status: learning_status(accuracy).to_string(),
    }
}

/// Consecutive days ending `today` with some study time
fn streak_days(facts: &[AttemptItemFact], today: NaiveDate) -> u32 {
    let mut by_day: HashMap<NaiveDate, u64> = HashMap::new();
    for fact in facts {
        *by_day.entry(fact.answered_at.date_naive()).or_default() += fact.time_ms;
    }

    let mut streak = 0;
    let mut day = today;
    while by_day.get(&day).copied().unwrap_or(0) > 0 {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}

#[derive(Clone)]
pub struct AnalyticsService {
    db: StudyDb,
}

impl AnalyticsService {
    pub fn new(db: StudyDb) -> Self {
        Self { db }
    }

    /// Metrics across all subjects, or one subject when given
    pub async fn overview(
        &self,
        user_id: Uuid,
        subject_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<OverviewMetrics> {
        if let Some(id) = subject_id {
            require_subject(&self.db, user_id, id).await?;
        }
        let facts = self
            .db
            .call(move |db| db.attempt_item_facts(user_id, subject_id))
            .await?;
        Ok(compute_overview(&facts, now.date_naive()))
    }

    pub async fn subject_history(&self, user_id: Uuid, subject_id: i64, limit: usize) -> Result<SubjectHistory> {
        require_subject(&self.db, user_id, subject_id).await?;

        self.db
            .call(move |db| {
                let summaries = db
                    .list_summaries(user_id, subject_id, limit)?
                    .into_iter()
                    .map(|s| SummaryHistoryItem {
                        summary_id: s.id,
                        kind: s.kind,
                        topic: s.topic,
                        excerpt: s.content_md.chars().take(EXCERPT_CHARS).collect(),
                        model: s.model,
                        created_at: s.created_at,
                    })
                    .collect();

                let qa_sessions = db.qa_session_history(user_id, subject_id, limit)?;

                let quiz_sets = db
                    .list_quizzes(user_id, subject_id, limit)?
                    .into_iter()
                    .map(|q| QuizSetHistoryItem {
                        quizset_id: q.id,
                        requested_count: q.requested_count,
                        difficulty: q.difficulty,
                        types: vec![q.question_type],
                        created_at: q.created_at,
                    })
                    .collect();

                let quiz_attempts = db
                    .list_attempts(user_id, subject_id, limit)?
                    .into_iter()
                    .map(|a| AttemptHistoryItem {
                        attempt_id: a.id,
                        quizset_id: a.quiz_id,
                        submitted_at: a.finished_at.unwrap_or(a.started_at),
                        correct_count: a.correct_count,
                        accuracy: a.accuracy,
                        grade: letter_grade(a.accuracy).to_string(),
                    })
                    .collect();

                Ok(SubjectHistory {
                    summaries,
                    qa_sessions,
                    quiz_sets,
                    quiz_attempts,
                })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn fact(is_correct: bool, time_ms: u64, answered: DateTime<Utc>) -> AttemptItemFact {
        AttemptItemFact {
            is_correct,
            time_ms,
            answered_at: answered,
            attempt_finished_at: Some(answered),
        }
    }

    #[test]
    fn test_letter_grade_bounds() {
        assert_eq!(letter_grade(0.95), "A");
        assert_eq!(letter_grade(0.90), "A");
        assert_eq!(letter_grade(0.85), "B");
        assert_eq!(letter_grade(0.70), "C");
        assert_eq!(letter_grade(0.60), "D");
        assert_eq!(letter_grade(0.59), "F");
    }

    #[test]
    fn test_learning_status_bounds() {
        assert_eq!(learning_status(0.91), "excellent");
        assert_eq!(learning_status(0.80), "good");
        assert_eq!(learning_status(0.65), "average");
        assert_eq!(learning_status(0.10), "needs effort");
    }

    #[test]
    fn test_empty_history() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        let metrics = compute_overview(&[], today);
        assert_eq!(metrics.overall_accuracy, 0.0);
        assert_eq!(metrics.grade, "F");
        assert_eq!(metrics.weekly_delta_percent, 0.0);
        assert_eq!(metrics.streak_days, 0);
        assert_eq!(metrics.status, "needs effort");
    }

    #[test]
    fn test_overview_metrics() {
        // Wednesday; the week started Monday 2024-05-13
        let today = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        let facts = vec![
            fact(true, 120_000, at(2024, 5, 8)),
            fact(false, 60_000, at(2024, 5, 13)),
            fact(true, 300_000, at(2024, 5, 14)),
            fact(true, 600_000, at(2024, 5, 15)),
        ];
        let metrics = compute_overview(&facts, today);

        assert_eq!(metrics.total_questions_answered, 4);
        assert_eq!(metrics.total_correct, 3);
        assert!((metrics.overall_accuracy - 0.75).abs() < 1e-9);
        assert_eq!(metrics.grade, "C");
        assert_eq!(metrics.status, "average");
        // 3 this week vs 1 last week
        assert!((metrics.weekly_delta_percent - 200.0).abs() < 1e-9);
        assert_eq!(metrics.total_study_minutes, 18);
        assert_eq!(metrics.weekly_avg_minutes, 2);
        assert_eq!(metrics.streak_days, 3);
    }

    #[test]
    fn test_first_active_week_is_full_increase() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        let metrics = compute_overview(&[fact(true, 1_000, at(2024, 5, 15))], today);
        assert_eq!(metrics.weekly_delta_percent, 100.0);
    }

    #[test]
    fn test_streak_breaks_on_gap_and_zero_time() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        let facts = vec![
            fact(true, 1_000, at(2024, 5, 15)),
            fact(true, 0, at(2024, 5, 14)),
            fact(true, 1_000, at(2024, 5, 13)),
        ];
        assert_eq!(compute_overview(&facts, today).streak_days, 1);

        let yesterday_only = vec![fact(true, 1_000, at(2024, 5, 14))];
        assert_eq!(compute_overview(&yesterday_only, today).streak_days, 0);
    }

    #[test]
    fn test_unfinished_attempts_count_in_totals_only() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        let mut open = fact(true, 1_000, at(2024, 5, 15));
        open.attempt_finished_at = None;
        let metrics = compute_overview(&[open], today);
        assert_eq!(metrics.total_questions_answered, 1);
        assert_eq!(metrics.weekly_delta_percent, 0.0);
    }

    #[tokio::test]
    async fn test_subject_history_from_db() {
        let db = StudyDb::in_memory().unwrap();
        let user = Uuid::new_v4();
        let service = AnalyticsService::new(db.clone());

        let subject_id = db
            .call(move |db| {
                let subject = db.insert_subject(user, "Biology")?;
                db.insert_summary(
                    user,
                    subject.id,
                    crate::types::SummaryKind::Overall,
                    "cells",
                    &"x".repeat(400),
                    "llama3.2:3b",
                    true,
                )?;
                Ok(subject.id)
            })
            .await
            .unwrap();

        let result = service.subject_history(user, subject_id, 20).await.unwrap();
        assert_eq!(result.summaries.len(), 1);
        assert_eq!(result.summaries[0].excerpt.chars().count(), 220);
        assert!(result.qa_sessions.is_empty());
        assert!(result.quiz_attempts.is_empty());
    }
}
