mod common;

use std::time::Duration;

use common::{HashEmbedder, Harness, ScriptedLlm};
use study_rag::types::{SourceKind, SummaryKind};
use study_rag::{
    AskRequest, Error, IndexState, SummaryRequest, TextBlock, UploadInput,
};

const PASS: &str = r#"{"ok": true, "reason": "faithful"}"#;

fn text_upload(subject_id: i64, title: &str, text: &str) -> UploadInput {
    UploadInput {
        subject_id: Some(subject_id),
        title: Some(title.to_string()),
        source_kind: SourceKind::Text,
        blocks: vec![TextBlock::new(text)],
    }
}

#[tokio::test]
async fn upload_then_ask_returns_cited_answer() {
    let llm = ScriptedLlm::new(&["ATP is produced in the mitochondria [1]."]);
    let harness = Harness::new(llm.clone(), ScriptedLlm::new(&[PASS]));
    let subject = harness.subject("Biology").await;

    let receipt = harness
        .services
        .documents
        .upload(
            harness.user,
            text_upload(
                subject.id,
                "cells.txt",
                "The mitochondria produce ATP through cellular respiration.",
            ),
        )
        .await
        .unwrap();
    assert_eq!(receipt.doc_count, 1);
    assert!(receipt.chunk_count >= 1);

    let answer = harness
        .services
        .chat
        .ask(harness.user, AskRequest::new(subject.id, "Where is ATP produced?"))
        .await
        .unwrap();

    assert!(answer.has_answer);
    assert!(!answer.citations.is_empty());
    assert!(answer.citation_texts[0].starts_with("[1] cells.txt"));
    assert_eq!(llm.call_count(), 1);

    let turns = harness
        .services
        .chat
        .turns(harness.user, answer.session_id)
        .await
        .unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].citations, answer.citation_texts);
}

#[tokio::test]
async fn ask_without_upload_is_index_not_ready() {
    let llm = ScriptedLlm::new(&["should not be called"]);
    let harness = Harness::new(llm.clone(), ScriptedLlm::new(&[PASS]));
    let subject = harness.subject("History").await;

    let err = harness
        .services
        .chat
        .ask(harness.user, AskRequest::new(subject.id, "Who won?"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::IndexNotReady(IndexState::Missing)));
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn unknown_citation_labels_are_dropped() {
    let llm = ScriptedLlm::new(&["Enzymes speed up reactions [1] and lower activation energy [7]."]);
    let harness = Harness::new(llm, ScriptedLlm::new(&[PASS]));
    let subject = harness.subject("Chemistry").await;

    harness
        .services
        .documents
        .upload(
            harness.user,
            UploadInput {
                subject_id: Some(subject.id),
                title: Some("enzymes.pdf".to_string()),
                source_kind: SourceKind::Pdf,
                blocks: vec![
                    TextBlock::page("Enzymes speed up chemical reactions.", 1),
                    TextBlock::page("Enzymes lower the activation energy.", 2),
                    TextBlock::page("Enzymes are proteins with active sites.", 3),
                ],
            },
        )
        .await
        .unwrap();

    let answer = harness
        .services
        .chat
        .ask(harness.user, AskRequest::new(subject.id, "What do enzymes do?"))
        .await
        .unwrap();

    assert_eq!(answer.passages_used, 3);
    assert_eq!(answer.citations.len(), 1);
    assert_eq!(answer.citations[0].label, 1);
    assert!(answer.citation_texts[0].starts_with("[1] enzymes.pdf, p."));
}

#[tokio::test]
async fn summary_judge_never_satisfied_stops_after_three_generations() {
    let llm = ScriptedLlm::new(&["draft one", "draft two", "draft three", "draft four"]);
    let judge = ScriptedLlm::new(&[
        r#"{"ok": false, "reason": "invents a date"}"#,
        r#"{"ok": false, "reason": "still invents a date"}"#,
        r#"{"ok": false, "reason": "mentions an unknown author"}"#,
    ]);
    let harness = Harness::new(llm.clone(), judge.clone());
    let subject = harness.subject("Physics").await;

    harness
        .services
        .documents
        .upload(
            harness.user,
            text_upload(subject.id, "motion.txt", "Newton's first law describes inertia."),
        )
        .await
        .unwrap();

    let outcome = harness
        .services
        .summaries
        .create(
            harness.user,
            SummaryRequest::new(subject.id, "Newton's laws").with_kind(SummaryKind::Traps),
        )
        .await
        .unwrap();

    assert!(!outcome.ok);
    assert_eq!(outcome.reason, "mentions an unknown author");
    assert_eq!(outcome.summary, "draft three");
    assert_eq!(llm.call_count(), 3);
    assert_eq!(judge.call_count(), 3);

    let stored = harness
        .services
        .summaries
        .list(harness.user, subject.id)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert!(!stored[0].grounded);
    assert_eq!(stored[0].model, "scripted-model");
}

#[tokio::test]
async fn summary_passing_judge_is_grounded() {
    let llm = ScriptedLlm::new(&["1) Core concepts: inertia"]);
    let harness = Harness::new(llm.clone(), ScriptedLlm::new(&[PASS]));
    let subject = harness.subject("Physics").await;

    harness
        .services
        .documents
        .upload(
            harness.user,
            text_upload(subject.id, "motion.txt", "Newton's first law describes inertia."),
        )
        .await
        .unwrap();

    let outcome = harness
        .services
        .summaries
        .create(harness.user, SummaryRequest::new(subject.id, "   "))
        .await
        .unwrap();

    assert!(outcome.ok);
    assert_eq!(llm.call_count(), 1);
    let prompt = llm.prompts.lock()[0].clone();
    assert!(prompt.contains(SummaryRequest::DEFAULT_TOPIC));
}

#[tokio::test]
async fn slow_generation_times_out() {
    let llm = ScriptedLlm::slow("too late [1]", Duration::from_secs(3));
    let harness = Harness::with_config(llm, ScriptedLlm::new(&[PASS]), |config| {
        config.llm.timeout_secs = 1;
    });
    let subject = harness.subject("Biology").await;

    harness
        .services
        .documents
        .upload(
            harness.user,
            text_upload(subject.id, "cells.txt", "Cells are the unit of life."),
        )
        .await
        .unwrap();

    let err = harness
        .services
        .chat
        .ask(harness.user, AskRequest::new(subject.id, "What are cells?"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ProviderTimeout { .. }));
}

#[tokio::test]
async fn upload_validation() {
    let harness = Harness::new(ScriptedLlm::new(&["x"]), ScriptedLlm::new(&[PASS]));
    let subject = harness.subject("Biology").await;
    let docs = &harness.services.documents;

    let mut missing_subject = text_upload(subject.id, "a.txt", "text");
    missing_subject.subject_id = None;
    assert!(matches!(
        docs.upload(harness.user, missing_subject).await,
        Err(Error::InvalidInput(_))
    ));

    let mut no_blocks = text_upload(subject.id, "a.txt", "text");
    no_blocks.blocks.clear();
    assert!(matches!(
        docs.upload(harness.user, no_blocks).await,
        Err(Error::InvalidInput(_))
    ));

    assert!(matches!(
        docs.upload(harness.user, text_upload(subject.id, "a.txt", "<p>  </p>")).await,
        Err(Error::NoTextExtracted)
    ));

    // Another user's subject is invisible
    let stranger = uuid::Uuid::new_v4();
    assert!(matches!(
        docs.upload(stranger, text_upload(subject.id, "a.txt", "text")).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn sentinel_answer_has_no_citations() {
    let harness = Harness::new(ScriptedLlm::new(&["No answer."]), ScriptedLlm::new(&[PASS]));
    let subject = harness.subject("Biology").await;
    harness
        .services
        .documents
        .upload(
            harness.user,
            text_upload(subject.id, "cells.txt", "Cells are the unit of life."),
        )
        .await
        .unwrap();

    let answer = harness
        .services
        .chat
        .ask(harness.user, AskRequest::new(subject.id, "Who painted the Mona Lisa?"))
        .await
        .unwrap();

    assert!(!answer.has_answer);
    assert!(answer.citations.is_empty());
}

#[tokio::test]
async fn slow_embeddings_do_not_share_one_deadline() {
    let embedder = HashEmbedder::slow(Duration::from_millis(300));
    let harness = Harness::with_embedder(
        embedder.clone(),
        ScriptedLlm::new(&["x"]),
        ScriptedLlm::new(&[PASS]),
        |config| config.llm.timeout_secs = 1,
    );
    let subject = harness.subject("Geology").await;

    let blocks: Vec<TextBlock> = (1..=40)
        .map(|page| TextBlock::page(format!("Rock layer {} formed by sediment.", page), page))
        .collect();
    let receipt = harness
        .services
        .documents
        .upload(
            harness.user,
            UploadInput {
                subject_id: Some(subject.id),
                title: Some("strata.pdf".to_string()),
                source_kind: SourceKind::Pdf,
                blocks,
            },
        )
        .await
        .unwrap();

    assert_eq!(receipt.chunk_count, 40);
    assert_eq!(embedder.call_count(), 40);
}
