use std::collections::HashSet;
use std::sync::Arc;

use wafrag_ingest::embedding::{EmbeddingError, EmbeddingIdentity};
use wafrag_ingest::{IndexError, VectorIndex};
use wafrag_llm::prompt::{build_context, INSUFFICIENT, REFUSAL};
use wafrag_llm::{AnswerError, EngineOptions, PromptTemplate, RagSession};

use crate::helpers::*;

#[tokio::test]
async fn prompt_carries_retrieved_context_and_question() {
    let llm = StubLlm::new(Reply::Text("IoT devices should receive OTA updates.".into()));
    let engine = engine(llm.clone(), 2);

    let answer = engine.ask("  How do IoT devices get security updates?  ").await.unwrap();

    let prompt = llm.last_prompt();
    assert_eq!(answer.hits.len(), 2);
    assert!(prompt.contains(&format!("Context:\n{}\n\n", build_context(&answer.hits))));
    assert!(prompt.ends_with("Question: How do IoT devices get security updates?\n\nDetailed Answer:"));
    assert_eq!(answer.question, "How do IoT devices get security updates?");
}

#[tokio::test]
async fn grounded_answer_cites_only_retrieved_origins() {
    let llm = StubLlm::new(Reply::Text("Use the IoT lens.\n".into()));
    let engine = engine(llm, 3);

    let answer = engine.ask("What does the IoT lens say about devices?").await.unwrap();

    assert_eq!(answer.text, "Use the IoT lens.");
    let retrieved: HashSet<&str> = answer.hits.iter().map(|h| h.chunk.origin.as_str()).collect();
    assert!(answer.sources.iter().all(|s| retrieved.contains(s.origin.as_str())));

    // Two IoT chunks collapse into one source, ranked first.
    assert_eq!(answer.sources[0].origin, IOT_PDF);
    assert_eq!(answer.sources[0].label, "Iot Lens");
    let origins: Vec<&str> = answer.sources.iter().map(|s| s.origin.as_str()).collect();
    assert_eq!(origins.iter().filter(|o| **o == IOT_PDF).count(), 1);

    let rendered = answer.rendered();
    assert!(rendered.starts_with("Use the IoT lens.\n\n---\n📚 **Sources:**\n"));
    assert!(rendered.contains("• Iot Lens"));
}

#[tokio::test]
async fn off_domain_question_gets_refusal() {
    let llm = StubLlm::new(Reply::Policy);
    let engine = engine(llm.clone(), 2);

    let answer = engine.ask("What is the weather today?").await.unwrap();
    assert_eq!(answer.text, REFUSAL);
    assert!(llm.last_prompt().contains("Question: What is the weather today?"));
}

#[tokio::test]
async fn uncovered_question_gets_insufficient_reply() {
    let llm = StubLlm::new(Reply::Policy);
    let engine = engine(llm, 2);

    let answer = engine.ask("How should the reliability pillar be reviewed?").await.unwrap();
    assert_eq!(answer.text, INSUFFICIENT);
}

#[tokio::test]
async fn empty_question_never_reaches_the_model() {
    let llm = StubLlm::new(Reply::Text("unused".into()));
    let engine = engine(llm.clone(), 2);

    let err = engine.ask("   \n").await.unwrap_err();
    assert!(matches!(err, AnswerError::EmptyQuestion));
    assert!(llm.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn top_k_larger_than_index_returns_everything() {
    let engine = engine(StubLlm::new(Reply::Text("ok".into())), 50);
    let hits = engine.retrieve("security").await.unwrap();
    assert_eq!(hits.len(), 4);
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
}

#[tokio::test(start_paused = true)]
async fn hanging_model_times_out() {
    let engine = engine(StubLlm::new(Reply::Hang), 2);

    let err = engine.ask("What is the security pillar?").await.unwrap_err();
    assert!(matches!(err, AnswerError::Timeout(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn provider_errors_are_classified() {
    let engine = engine(StubLlm::new(Reply::Fail(503)), 2);
    let err = engine.ask("What is the cost pillar?").await.unwrap_err();
    assert!(matches!(err, AnswerError::Llm(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn embedding_outage_stops_before_generation() {
    let llm = StubLlm::new(Reply::Text("unused".into()));
    let engine = engine_with(Arc::new(UnreachableEmbedder), llm.clone(), 2);

    let err = engine.ask("What is the security pillar?").await.unwrap_err();
    assert!(matches!(err, AnswerError::Embedding(EmbeddingError::Api(_))));
    assert!(err.is_retryable());
    assert!(!err.is_timeout());
    assert!(llm.prompts.lock().unwrap().is_empty());
}

#[test]
fn session_rejects_index_from_other_embedder() {
    let foreign = VectorIndex::from_parts(
        EmbeddingIdentity::new("openai", "text-embedding-3-small", VOCAB.len()),
        vec![],
        vec![],
    );
    // An empty index is rejected before identity is even considered.
    assert!(matches!(foreign, Err(IndexError::Empty)));

    let index = corpus_index();
    let mismatched = VectorIndex::from_parts(
        EmbeddingIdentity::new("openai", "text-embedding-3-small", VOCAB.len()),
        index.chunks().to_vec(),
        index.chunks().iter().map(|c| keyword_vector(&c.text)).collect(),
    )
    .unwrap();

    let result = RagSession::new(
        Arc::new(KeywordEmbedder),
        Arc::new(mismatched),
        StubLlm::new(Reply::Text("unused".into())),
    );
    match result {
        Err(AnswerError::Index(IndexError::EmbeddingMismatch { .. })) => {}
        other => panic!("expected embedding mismatch, got {:?}", other.err()),
    }
}

#[test]
fn zero_top_k_is_rejected() {
    let session = RagSession::new(
        Arc::new(KeywordEmbedder),
        corpus_index(),
        StubLlm::new(Reply::Text("unused".into())),
    )
    .unwrap();
    let options = EngineOptions {
        top_k: 0,
        ..EngineOptions::default()
    };
    let result = wafrag_llm::AnswerEngine::new(session, PromptTemplate::builtin().unwrap(), options);
    assert!(matches!(result, Err(AnswerError::Config(_))));
}
