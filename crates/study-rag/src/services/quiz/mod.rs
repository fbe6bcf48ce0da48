//! Quiz generation, attempts and grading

pub mod generator;
pub mod grading;
pub mod registry;

pub use generator::{QuizGenerator, QuizParams};
pub use grading::{grade_answer, normalize_answer};
pub use registry::QuizMaterialRegistry;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::index::{collection_spec, IndexManager};
use crate::storage::StudyDb;
use crate::types::quiz::{AnswerResult, AnswerSubmission, Quiz, QuizAttempt};
use crate::types::QuizRequest;

use super::subjects::require_subject;

#[derive(Clone)]
pub struct QuizService {
    db: StudyDb,
    index: IndexManager,
    generator: QuizGenerator,
    default_span: usize,
    max_questions: usize,
}

impl QuizService {
    pub fn new(
        db: StudyDb,
        index: IndexManager,
        generator: QuizGenerator,
        default_span: usize,
        max_questions: usize,
    ) -> Self {
        Self {
            db,
            index,
            generator,
            default_span,
            max_questions,
        }
    }

    /// Generate a quiz from a subject's material and store it
    pub async fn generate(&self, user_id: Uuid, request: QuizRequest) -> Result<Quiz> {
        let subject_id = request.subject_id;
        if request.num_questions == 0 || request.num_questions > self.max_questions {
            return Err(Error::invalid_input(format!(
                "num_questions must be between 1 and {}",
                self.max_questions
            )));
        }
        require_subject(&self.db, user_id, subject_id).await?;

        let material = self.pick_material(subject_id, request.material.as_deref())?;
        let handle = self.index.open(user_id, subject_id).await?;
        let collection = collection_spec(&handle);

        let set = self
            .generator
            .generate(QuizParams {
                material: &material,
                question_type: request.question_type,
                difficulty: request.difficulty,
                num_questions: request.num_questions,
                sample_span: request.sample_span.unwrap_or(self.default_span),
                seed: request.seed,
                collection: Some(&collection),
            })
            .await?;

        let title = format!("Quiz: {}", display_title(&set.source));
        let (question_type, difficulty, requested) =
            (request.question_type, request.difficulty, request.num_questions);
        let quiz = self
            .db
            .call(move |db| {
                db.insert_quiz(
                    user_id,
                    subject_id,
                    &title,
                    requested,
                    question_type,
                    difficulty,
                    &set.source,
                    &set.items,
                )
            })
            .await?;

        tracing::info!(
            "Stored quiz {} with {} questions for subject {}",
            quiz.id,
            quiz.questions.len(),
            subject_id
        );
        Ok(quiz)
    }

    pub async fn start_attempt(&self, user_id: Uuid, quiz_id: i64) -> Result<QuizAttempt> {
        self.db
            .call(move |db| {
                db.get_quiz(user_id, quiz_id)?
                    .ok_or_else(|| Error::not_found(format!("quiz {}", quiz_id)))?;
                db.insert_attempt(quiz_id, user_id)
            })
            .await
    }

    /// Grade and record one answer of an open attempt
    pub async fn submit_answer(
        &self,
        user_id: Uuid,
        attempt_id: i64,
        submission: AnswerSubmission,
    ) -> Result<AnswerResult> {
        self.db
            .call(move |db| {
                let attempt = db
                    .get_attempt(user_id, attempt_id)?
                    .ok_or_else(|| Error::not_found(format!("attempt {}", attempt_id)))?;
                if attempt.finished_at.is_some() {
                    return Err(Error::invalid_input(format!(
                        "attempt {} is already finished",
                        attempt_id
                    )));
                }

                let question = db
                    .get_question(attempt.quiz_id, submission.question_id)?
                    .ok_or_else(|| {
                        Error::not_found(format!("question {} in this quiz", submission.question_id))
                    })?;

                let is_correct = grade_answer(&question, &submission.user_answer);
                let item_id = db.insert_attempt_item(
                    attempt_id,
                    submission.question_id,
                    &submission.user_answer,
                    is_correct,
                    submission.time_ms,
                )?;

                Ok(AnswerResult {
                    attempt_item_id: item_id,
                    question_id: submission.question_id,
                    is_correct,
                    correct_answer: question.answer,
                    explanation: question.explanation,
                })
            })
            .await
    }

    pub async fn finish_attempt(&self, user_id: Uuid, attempt_id: i64) -> Result<QuizAttempt> {
        let attempt = self
            .db
            .call(move |db| {
                let attempt = db
                    .get_attempt(user_id, attempt_id)?
                    .ok_or_else(|| Error::not_found(format!("attempt {}", attempt_id)))?;
                if attempt.finished_at.is_some() {
                    return Ok(attempt);
                }
                db.finish_attempt(attempt_id, Utc::now())
            })
            .await?;

        tracing::info!(
            "Attempt {} finished: {} correct ({:.0}%)",
            attempt.id,
            attempt.correct_count,
            attempt.accuracy * 100.0
        );
        Ok(attempt)
    }

    /// The requested material, or the subject's first registered one
    fn pick_material(&self, subject_id: i64, requested: Option<&str>) -> Result<String> {
        let registry = self.generator.registry();
        let prefix = format!("{}/", subject_id);

        // Material of other subjects is never reachable
        if let Some(name) = requested.map(str::trim).filter(|n| !n.is_empty()) {
            let name = if name.starts_with(&prefix) {
                name.to_string()
            } else {
                format!("{}{}", prefix, name)
            };
            if registry.contains(&name) {
                return Ok(name);
            }
            return Err(Error::not_found(format!("quiz material '{}'", name)));
        }

        registry
            .materials_with_prefix(&prefix)
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("quiz material for subject {}", subject_id)))
    }
}

fn display_title(material: &str) -> &str {
    material.split_once('/').map_or(material, |(_, title)| title)
}
