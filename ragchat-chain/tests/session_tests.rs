use std::sync::Arc;

use ragchat_chain::{ChainError, ChatSession, RagChain, Stage};
use ragchat_model::{Llm, Message, MockLlm, Role};
use ragchat_rag::{
    Document, InMemoryVectorStore, MockEmbeddingProvider, RagPipeline, RecursiveChunker,
};

async fn chain_with(llm: Arc<dyn Llm>) -> Arc<RagChain> {
    let pipeline = RagPipeline::builder()
        .embedding_provider(Arc::new(MockEmbeddingProvider::new(16)))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .chunker(Arc::new(RecursiveChunker::new(100, 10)))
        .build()
        .unwrap();
    let docs = vec![
        Document::new("handbook.md", "Employees get 25 days of annual leave."),
        Document::new("office.md", "The office opens at 8am on weekdays."),
    ];
    pipeline.ingest_documents(&docs, true).await.unwrap();
    Arc::new(RagChain::new(llm, Arc::new(pipeline)).await.unwrap())
}

#[tokio::test]
async fn successful_turns_grow_history_in_order() {
    let llm = Arc::new(MockLlm::new().with_replies([
        "25 days.",
        "Can leave be carried over to next year?",
        "The handbook does not say.",
    ]));
    let mut session = ChatSession::new(chain_with(llm.clone()).await);

    let first = session.send("How much annual leave do I get?").await.unwrap();
    assert_eq!(first.answer, "25 days.");
    assert_eq!(session.history().len(), 2);

    let second = session.send("  Can it be carried over?  ").await.unwrap();
    assert_eq!(second.standalone_question, "Can leave be carried over to next year?");

    let history = session.history();
    assert_eq!(
        history,
        &[
            Message::user("How much annual leave do I get?"),
            Message::assistant("25 days."),
            Message::user("Can it be carried over?"),
            Message::assistant("The handbook does not say."),
        ]
    );
    assert!(!session.last_sources().is_empty());

    // The rewrite request carries the first exchange as history.
    let rewrite = &llm.requests().await[1];
    assert_eq!(rewrite.messages[1], Message::user("How much annual leave do I get?"));
    assert_eq!(rewrite.messages[2].role, Role::Assistant);
}

#[tokio::test]
async fn failed_turn_leaves_history_unchanged() {
    let mut session = ChatSession::new(chain_with(Arc::new(MockLlm::failing("timed out"))).await);

    let err = session.send("Anyone there?").await.unwrap_err();
    assert!(matches!(err, ChainError::GenerationFailed { stage: Stage::Answer, .. }));
    assert!(session.history().is_empty());
    assert!(session.last_sources().is_empty());
}

#[tokio::test]
async fn blank_input_is_rejected_without_model_calls() {
    let llm = Arc::new(MockLlm::new());
    let mut session = ChatSession::new(chain_with(llm.clone()).await);

    assert!(matches!(session.send("   ").await, Err(ChainError::EmptyInput)));
    assert_eq!(llm.call_count().await, 0);
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn clear_resets_the_conversation() {
    let llm = Arc::new(MockLlm::new());
    let mut session = ChatSession::new(chain_with(llm.clone()).await);
    let id = session.id().to_string();

    session.send("When does the office open?").await.unwrap();
    session.clear();
    assert!(session.history().is_empty());
    assert!(session.last_sources().is_empty());
    assert_eq!(session.id(), id);

    // With history gone the next question is not rewritten.
    session.send("Annual leave?").await.unwrap();
    assert_eq!(llm.call_count().await, 2);
}

#[tokio::test]
async fn sessions_have_distinct_ids() {
    let chain = chain_with(Arc::new(MockLlm::new())).await;
    let a = ChatSession::new(chain.clone());
    let b = ChatSession::new(chain);
    assert_ne!(a.id(), b.id());
}
