//! Smart chat: cited answers over a subject's material

use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::generation::{is_no_answer, link_citations, LabeledContext, PromptBuilder};
use crate::index::{collection_spec, IndexManager};
use crate::providers::{bounded, GenerationOptions, LlmProvider};
use crate::retrieval::RetrievalPipeline;
use crate::storage::StudyDb;
use crate::types::chat::{ChatSession, QaTurn};
use crate::types::{AskRequest, ChatAnswer, CitationRecord};

use super::subjects::require_subject;

/// Session titles are the opening question cut to this many characters
const SESSION_TITLE_CHARS: usize = 50;

#[derive(Clone)]
pub struct ChatService {
    db: StudyDb,
    index: IndexManager,
    pipeline: RetrievalPipeline,
    llm: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl ChatService {
    pub fn new(
        db: StudyDb,
        index: IndexManager,
        pipeline: RetrievalPipeline,
        llm: Arc<dyn LlmProvider>,
        timeout: Duration,
    ) -> Self {
        Self {
            db,
            index,
            pipeline,
            llm,
            timeout,
        }
    }

    /// Answer a question with citations and record the turn
    pub async fn ask(&self, user_id: Uuid, request: AskRequest) -> Result<ChatAnswer> {
        let question = request.question.trim().to_string();
        if question.is_empty() {
            return Err(Error::invalid_input("question is required"));
        }
        let subject_id = request.subject_id;
        require_subject(&self.db, user_id, subject_id).await?;

        if let Some(session_id) = request.session_id {
            let session = self
                .db
                .call(move |db| db.get_chat_session(user_id, session_id))
                .await?;
            match session {
                Some(s) if s.subject_id == subject_id => {}
                _ => return Err(Error::not_found(format!("chat session {}", session_id))),
            }
        }

        let handle = self.index.open(user_id, subject_id).await?;
        let passages = self
            .pipeline
            .search(&collection_spec(&handle), &question)
            .await?;

        let labeled = LabeledContext::build(&passages);
        let prompt = PromptBuilder::qa(&question, &labeled.context);
        let raw = bounded(
            self.llm.name(),
            "generate",
            self.timeout,
            self.llm.generate(&prompt, &GenerationOptions::default()),
        )
        .await?;

        let has_answer = !is_no_answer(&raw);
        let (answer, citations) = link_citations(&raw, &labeled.labels);
        let citation_texts: Vec<String> = citations.iter().map(CitationRecord::display).collect();

        tracing::info!(
            "Answered in subject {} with {} passages, {} citations (has_answer={})",
            subject_id,
            labeled.len(),
            citations.len(),
            has_answer
        );

        let stored_citations = citation_texts.clone();
        let answer_text = answer.text.clone();
        let session_id = request.session_id;
        let (session_id, turn) = self
            .db
            .call(move |db| {
                let session_id = match session_id {
                    Some(id) => id,
                    None => {
                        let title: String = question.chars().take(SESSION_TITLE_CHARS).collect();
                        db.insert_chat_session(user_id, subject_id, &title)?.id
                    }
                };
                let turn = db.insert_qa_turn(
                    session_id,
                    user_id,
                    &question,
                    &answer_text,
                    has_answer,
                    &stored_citations,
                )?;
                Ok((session_id, turn))
            })
            .await?;

        Ok(ChatAnswer {
            session_id,
            turn_id: turn.id,
            answer: answer.text,
            has_answer,
            citations,
            citation_texts,
            passages_used: labeled.len(),
        })
    }

    pub async fn sessions(&self, user_id: Uuid, subject_id: i64) -> Result<Vec<ChatSession>> {
        require_subject(&self.db, user_id, subject_id).await?;
        self.db
            .call(move |db| db.list_chat_sessions(user_id, subject_id))
            .await
    }

    pub async fn turns(&self, user_id: Uuid, session_id: i64) -> Result<Vec<QaTurn>> {
        self.db
            .call(move |db| {
                db.get_chat_session(user_id, session_id)?
                    .ok_or_else(|| Error::not_found(format!("chat session {}", session_id)))?;
                db.list_qa_turns(session_id)
            })
            .await
    }
}
