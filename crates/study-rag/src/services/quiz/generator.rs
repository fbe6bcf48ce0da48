//! Quiz item generation from registered material
//!
//! Each item is written by the model from a random sample of the material's
//! chunks, then checked against the subject's vector index: the question and
//! answer are used as a retrieval probe and the item is regenerated once when
//! the best re-ranked passage scores below the grounding threshold. The
//! surviving passages become the item's citations.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::generation::{LabeledContext, PromptBuilder};
use crate::providers::llm::generate_structured;
use crate::providers::{bounded, CollectionSpec, GenerationOptions, LlmProvider};
use crate::retrieval::RetrievalPipeline;
use crate::types::quiz::QuizItemDraft;
use crate::types::{CitationRecord, Difficulty, QuestionType, QuizQuestion, QuizSet};

use super::grading::{normalize_answer, resolve_option};
use super::registry::QuizMaterialRegistry;

/// Options a multiple-choice item must carry
const MCQ_OPTIONS: usize = 4;

/// One generation request
#[derive(Debug, Clone, Copy)]
pub struct QuizParams<'a> {
    pub material: &'a str,
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
    pub num_questions: usize,
    pub sample_span: usize,
    pub seed: Option<u64>,
    /// Index used for the grounding check; `None` skips it
    pub collection: Option<&'a CollectionSpec>,
}

#[derive(Clone)]
pub struct QuizGenerator {
    registry: Arc<QuizMaterialRegistry>,
    llm: Arc<dyn LlmProvider>,
    pipeline: RetrievalPipeline,
    timeout: Duration,
    grounding_threshold: f32,
}

impl QuizGenerator {
    pub fn new(
        registry: Arc<QuizMaterialRegistry>,
        llm: Arc<dyn LlmProvider>,
        pipeline: RetrievalPipeline,
        timeout: Duration,
        grounding_threshold: f32,
    ) -> Self {
        Self {
            registry,
            llm,
            pipeline,
            timeout,
            grounding_threshold,
        }
    }

    pub fn registry(&self) -> &Arc<QuizMaterialRegistry> {
        &self.registry
    }

    pub async fn generate(&self, params: QuizParams<'_>) -> Result<QuizSet> {
        if params.num_questions == 0 {
            return Err(Error::invalid_input("num_questions must be at least 1"));
        }

        let chunks = self.registry.chunks(params.material)?;
        if chunks.is_empty() {
            return Err(Error::NoRelevantMaterial(params.material.to_string()));
        }
        let span = params.sample_span.clamp(1, chunks.len());

        let mut rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut items = Vec::with_capacity(params.num_questions);
        for index in 0..params.num_questions {
            let id = index as u32 + 1;
            let context = chunks
                .choose_multiple(&mut rng, span)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("\n\n");

            let item = self.grounded_item(id, &params, &context).await?;
            items.push(item);
        }

        tracing::info!(
            "Generated {} {} questions from '{}'",
            items.len(),
            params.question_type.as_str(),
            params.material
        );

        Ok(QuizSet {
            source: params.material.to_string(),
            items,
        })
    }

    async fn grounded_item(&self, id: u32, params: &QuizParams<'_>, context: &str) -> Result<QuizQuestion> {
        let mut item = self.draft_item(id, params, context).await?;
        let Some(collection) = params.collection else {
            return Ok(item);
        };

        let (mut best, mut labeled) = self.probe(collection, &item).await?;
        if best < self.grounding_threshold {
            tracing::warn!(
                "Question {} weakly grounded (score {:.2} < {:.2}), regenerating",
                id,
                best,
                self.grounding_threshold
            );
            item = self.draft_item(id, params, context).await?;
            (best, labeled) = self.probe(collection, &item).await?;
            if best < self.grounding_threshold {
                tracing::warn!("Question {} still weakly grounded (score {:.2})", id, best);
            }
        }

        item.citations = labeled
            .labels
            .iter()
            .map(|(label, source)| CitationRecord::new(*label, source.clone()))
            .collect();
        Ok(item)
    }

    /// Best re-rank score for the item's question and answer, plus the
    /// labeled passages behind it
    async fn probe(&self, collection: &CollectionSpec, item: &QuizQuestion) -> Result<(f32, LabeledContext)> {
        let query = format!("{}\nAnswer: {}", item.question, item.answer);
        match self.pipeline.search(collection, &query).await {
            Ok(passages) => {
                let best = passages.first().map_or(0.0, |p| p.rerank_score);
                Ok((best, LabeledContext::build(&passages)))
            }
            Err(Error::NoRelevantMaterial(_)) => Ok((0.0, LabeledContext::default())),
            Err(e) => Err(e),
        }
    }

    /// Ask for one item, retrying once on unreadable or malformed output
    async fn draft_item(&self, id: u32, params: &QuizParams<'_>, context: &str) -> Result<QuizQuestion> {
        let prompt = PromptBuilder::quiz_item(id, params.question_type, params.difficulty, context);
        let mut last_error = None;

        for attempt in 0..2 {
            let draft = bounded(
                self.llm.name(),
                "generate",
                self.timeout,
                generate_structured::<QuizItemDraft>(self.llm.as_ref(), &prompt, &GenerationOptions::json()),
            )
            .await;

            let error = match draft {
                Ok(draft) => match to_question(id, params, draft) {
                    Ok(question) => return Ok(question),
                    Err(e) => e,
                },
                Err(e @ Error::GenerationParse(_)) => e,
                Err(e) => return Err(e),
            };
            tracing::warn!("Question {} attempt {} rejected: {}", id, attempt + 1, error);
            last_error = Some(error);
        }

        Err(last_error.unwrap_or_else(|| Error::parse("no quiz item produced")))
    }
}

/// Validate a draft and fill in the requested type
fn to_question(id: u32, params: &QuizParams<'_>, draft: QuizItemDraft) -> Result<QuizQuestion> {
    let question = draft.question.trim().to_string();
    let mut answer = draft.answer.trim().to_string();
    if question.is_empty() || answer.is_empty() {
        return Err(Error::parse("item is missing its question or answer"));
    }

    let difficulty = draft
        .difficulty
        .as_deref()
        .and_then(Difficulty::normalize)
        .unwrap_or(params.difficulty);

    let options = match params.question_type {
        QuestionType::MultipleChoice => {
            let options: Vec<String> = draft
                .options
                .unwrap_or_default()
                .into_iter()
                .map(|o| o.trim().to_string())
                .collect();
            if options.len() != MCQ_OPTIONS {
                return Err(Error::parse(format!(
                    "expected {} options, got {}",
                    MCQ_OPTIONS,
                    options.len()
                )));
            }
            answer = matching_option(&options, &answer)
                .ok_or_else(|| Error::parse("answer is not one of the options"))?;
            Some(options)
        }
        _ => None,
    };

    Ok(QuizQuestion {
        id,
        question_type: params.question_type,
        difficulty,
        question,
        options,
        answer,
        explanation: draft.explanation.filter(|e| !e.trim().is_empty()),
        citations: Vec::new(),
    })
}

/// The option an answer names, by text or by letter/number
fn matching_option(options: &[String], answer: &str) -> Option<String> {
    let wanted = normalize_answer(answer);
    options
        .iter()
        .find(|o| normalize_answer(o) == wanted)
        .or_else(|| resolve_option(&wanted, options.len()).map(|i| &options[i]))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::TextChunker;
    use crate::providers::embedding::MockEmbeddingProvider;
    use crate::providers::llm::MockLlmProvider;
    use crate::providers::local::LocalVectorStore;
    use crate::providers::reranker::MockReranker;
    use crate::providers::{EmbeddedChunk, VectorStoreProvider};
    use crate::retrieval::Retriever;
    use crate::types::{Chunk, ChunkMetadata, SourceKind};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    const MCQ: &str = r#"{"type": "multiple_choice", "difficulty": "easy", "question": "Where is ATP made?",
        "options": ["Nucleus", "Mitochondria", "Ribosome", "Golgi body"], "answer": "Mitochondria",
        "explanation": "The notes say so."}"#;

    fn scripted_llm(responses: Vec<&'static str>) -> (Arc<MockLlmProvider>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut llm = MockLlmProvider::new();
        llm.expect_name().return_const("mock".to_string());
        llm.expect_generate().returning(move |_, _| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Ok(responses[n.min(responses.len() - 1)].to_string())
        });
        (Arc::new(llm), calls)
    }

    fn pipeline(reranker: MockReranker) -> (RetrievalPipeline, Arc<LocalVectorStore>) {
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_name().return_const("mock".to_string());
        embedder.expect_embed().returning(|_| Ok(vec![1.0, 0.0]));
        let store = Arc::new(LocalVectorStore::new());
        let retriever = Retriever::new(Arc::new(embedder), store.clone(), Duration::from_secs(5));
        let pipeline = RetrievalPipeline::new(retriever, Arc::new(reranker), 8, 5, Duration::from_secs(5));
        (pipeline, store)
    }

    fn idle_pipeline() -> RetrievalPipeline {
        pipeline(MockReranker::new()).0
    }

    fn registry() -> Arc<QuizMaterialRegistry> {
        let registry = QuizMaterialRegistry::new(TextChunker::new(500, 60).unwrap());
        registry.register(
            "1/bio.txt",
            vec!["ATP is made in the mitochondria. The nucleus holds DNA.".to_string()],
        );
        Arc::new(registry)
    }

    fn params(n: usize, collection: Option<&CollectionSpec>) -> QuizParams<'_> {
        QuizParams {
            material: "1/bio.txt",
            question_type: QuestionType::MultipleChoice,
            difficulty: Difficulty::Medium,
            num_questions: n,
            sample_span: 1,
            seed: Some(7),
            collection,
        }
    }

    #[tokio::test]
    async fn test_generates_requested_items() {
        let (llm, calls) = scripted_llm(vec![MCQ]);
        let generator = QuizGenerator::new(registry(), llm, idle_pipeline(), Duration::from_secs(5), 0.2);

        let set = generator.generate(params(3, None)).await.unwrap();
        assert_eq!(set.source, "1/bio.txt");
        assert_eq!(set.items.len(), 3);
        assert_eq!(set.items[2].id, 3);
        assert_eq!(set.items[0].answer, "Mitochondria");
        assert_eq!(set.items[0].difficulty, Difficulty::Easy);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_malformed_mcq_regenerated_once() {
        let three_options = r#"{"question": "Where is ATP made?", "options": ["A", "B", "C"], "answer": "A"}"#;
        let (llm, calls) = scripted_llm(vec![three_options, MCQ]);
        let generator = QuizGenerator::new(registry(), llm, idle_pipeline(), Duration::from_secs(5), 0.2);

        let set = generator.generate(params(1, None)).await.unwrap();
        assert_eq!(set.items[0].options.as_ref().map(Vec::len), Some(4));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unreadable_twice_is_parse_error() {
        let (llm, calls) = scripted_llm(vec!["I cannot write a quiz today"]);
        let generator = QuizGenerator::new(registry(), llm, idle_pipeline(), Duration::from_secs(5), 0.2);

        let err = generator.generate(params(1, None)).await.unwrap_err();
        assert!(matches!(err, Error::GenerationParse(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unknown_material() {
        let (llm, _) = scripted_llm(vec![MCQ]);
        let generator = QuizGenerator::new(registry(), llm, idle_pipeline(), Duration::from_secs(5), 0.2);
        let mut p = params(1, None);
        p.material = "9/missing.txt";
        assert!(matches!(generator.generate(p).await.unwrap_err(), Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_weak_grounding_regenerates_and_cites() {
        let dir = tempfile::tempdir().unwrap();
        let rerank_calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&rerank_calls);
        let mut reranker = MockReranker::new();
        reranker.expect_name().return_const("mock");
        reranker.expect_score().returning(move |_, passages| {
            let score = if counter.fetch_add(1, Ordering::SeqCst) == 0 { 0.05 } else { 0.9 };
            Ok(vec![score; passages.len()])
        });

        let (pipeline, store) = pipeline(reranker);
        let collection = CollectionSpec::new("study_test", dir.path().join("study_test"));
        let metadata = ChunkMetadata {
            user_id: Uuid::nil(),
            subject_id: 1,
            source: SourceKind::Pdf,
            source_name: "bio.pdf".to_string(),
            page: Some(4),
        };
        store
            .upsert(
                &collection,
                vec![EmbeddedChunk {
                    chunk: Chunk::new(1, 0, "ATP is made in the mitochondria.", metadata),
                    vector: vec![1.0, 0.0],
                }],
            )
            .await
            .unwrap();

        let (llm, calls) = scripted_llm(vec![MCQ]);
        let generator = QuizGenerator::new(registry(), llm, pipeline, Duration::from_secs(5), 0.2);
        let set = generator.generate(params(1, Some(&collection))).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(rerank_calls.load(Ordering::SeqCst), 2);
        assert_eq!(set.items[0].citations, vec![CitationRecord::new(1, "bio.pdf, p.4")]);
    }

    #[test]
    fn test_answer_letter_resolves_to_option() {
        let draft: QuizItemDraft = serde_json::from_str(
            r#"{"question": "q", "options": ["w", "x", "y", "z"], "answer": "C"}"#,
        )
        .unwrap();
        let item = to_question(1, &params(1, None), draft).unwrap();
        assert_eq!(item.answer, "y");
    }

    #[test]
    fn test_numeric_answer_matches_option_text() {
        let draft: QuizItemDraft = serde_json::from_str(
            r#"{"question": "2 + 1?", "options": ["2", "3", "4", "5"], "answer": "3"}"#,
        )
        .unwrap();
        let item = to_question(1, &params(1, None), draft).unwrap();
        assert_eq!(item.answer, "3");
    }

    #[test]
    fn test_short_answer_drops_options() {
        let draft: QuizItemDraft =
            serde_json::from_str(r#"{"question": "q", "options": ["a"], "answer": "ATP"}"#).unwrap();
        let mut p = params(1, None);
        p.question_type = QuestionType::ShortAnswer;
        let item = to_question(1, &p, draft).unwrap();
        assert!(item.options.is_none());
        assert_eq!(item.question_type, QuestionType::ShortAnswer);
    }
}
