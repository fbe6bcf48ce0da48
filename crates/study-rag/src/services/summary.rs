//! Grounded exam-prep summaries

use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;
use crate::generation::PromptBuilder;
use crate::grounding::GroundingVerifier;
use crate::index::{collection_spec, IndexManager};
use crate::providers::LlmProvider;
use crate::retrieval::RetrievalPipeline;
use crate::storage::StudyDb;
use crate::types::summary::SummaryRecord;
use crate::types::{SummaryOutcome, SummaryRequest};

use super::subjects::require_subject;

/// Summaries listed per subject
const LIST_LIMIT: usize = 50;

#[derive(Clone)]
pub struct SummaryService {
    db: StudyDb,
    index: IndexManager,
    pipeline: RetrievalPipeline,
    verifier: GroundingVerifier,
    llm: Arc<dyn LlmProvider>,
}

impl SummaryService {
    pub fn new(
        db: StudyDb,
        index: IndexManager,
        pipeline: RetrievalPipeline,
        verifier: GroundingVerifier,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            db,
            index,
            pipeline,
            verifier,
            llm,
        }
    }

    /// Retrieve, summarize, verify with the judge and store the result
    pub async fn create(&self, user_id: Uuid, request: SummaryRequest) -> Result<SummaryOutcome> {
        let subject_id = request.subject_id;
        let kind = request.kind;
        let topic = match request.topic.trim() {
            "" => SummaryRequest::DEFAULT_TOPIC.to_string(),
            t => t.to_string(),
        };
        require_subject(&self.db, user_id, subject_id).await?;

        let handle = self.index.open(user_id, subject_id).await?;
        let passages = self
            .pipeline
            .search(&collection_spec(&handle), &topic)
            .await?;

        let context = passages
            .iter()
            .map(|p| p.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let judge_context = self.verifier.judge_context(&passages);

        let prompt = PromptBuilder::summary(&topic, &context, kind);
        let outcome = self
            .verifier
            .run(&prompt, &judge_context, |previous, reason| {
                PromptBuilder::summary(&PromptBuilder::summary_fix(previous, reason), &context, kind)
            })
            .await?;

        tracing::info!(
            "Summary for subject {} ({}): ok={} after {} generations",
            subject_id,
            kind.as_str(),
            outcome.ok,
            outcome.generations
        );

        let model = self.llm.model().to_string();
        let (content, ok) = (outcome.text.clone(), outcome.ok);
        let record = self
            .db
            .call(move |db| db.insert_summary(user_id, subject_id, kind, &topic, &content, &model, ok))
            .await?;

        Ok(SummaryOutcome {
            summary_id: record.id,
            summary: outcome.text,
            ok: outcome.ok,
            reason: outcome.reason,
        })
    }

    pub async fn list(&self, user_id: Uuid, subject_id: i64) -> Result<Vec<SummaryRecord>> {
        require_subject(&self.db, user_id, subject_id).await?;
        self.db
            .call(move |db| db.list_summaries(user_id, subject_id, LIST_LIMIT))
            .await
    }
}
