//! History-aware retrieval chain.
//!
//! One [`RagChain::ask`] call runs three steps:
//!
//! 1. **Contextualize**: with prior turns, ask the model to rewrite the
//!    question so it stands on its own. Without history the question is used
//!    as is and the model is not called.
//! 2. **Retrieve**: look up the nearest chunks for the standalone question.
//! 3. **Answer**: ask the model again with the retrieved passages, the
//!    history and the original question.

use std::sync::Arc;

use ragchat_model::{Llm, LlmRequest, Message};
use ragchat_rag::{RagError, RagPipeline, SearchResult};
use tracing::{debug, info, warn};

use crate::error::{ChainError, Result, Stage};
use crate::prompts::{contextualize_messages, format_context, qa_messages};

/// The outcome of one chain invocation.
#[derive(Debug, Clone)]
pub struct RagAnswer {
    /// Generated answer text.
    pub answer: String,
    /// The question actually used for retrieval.
    pub standalone_question: String,
    /// Chunks fed to the model, nearest first.
    pub sources: Vec<SearchResult>,
}

/// Retrieval-augmented question answering over a built index.
pub struct RagChain {
    llm: Arc<dyn Llm>,
    pipeline: Arc<RagPipeline>,
    temperature: Option<f32>,
}

impl std::fmt::Debug for RagChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagChain")
            .field("llm", &self.llm.name())
            .field("collection", &self.pipeline.collection())
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl RagChain {
    /// Create a chain over an existing index.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::StoreUnavailable`] if nothing has been ingested
    /// yet, or [`ChainError::Index`] if the index was built with another
    /// embedding model.
    pub async fn new(llm: Arc<dyn Llm>, pipeline: Arc<RagPipeline>) -> Result<Self> {
        match pipeline.ensure_index().await {
            Ok(spec) => {
                info!(
                    collection = %spec.name,
                    embedding_model = %spec.embedding_model,
                    llm = llm.name(),
                    "chain ready"
                );
                Ok(Self { llm, pipeline, temperature: None })
            }
            Err(RagError::StoreNotFound { location }) => {
                warn!(%location, "no index found");
                Err(ChainError::StoreUnavailable { location })
            }
            Err(e) => Err(ChainError::Index(e)),
        }
    }

    /// Sampling temperature for both model calls; `None` keeps the provider default.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn pipeline(&self) -> &RagPipeline {
        &self.pipeline
    }

    async fn complete(&self, stage: Stage, messages: Vec<Message>) -> Result<String> {
        let request = LlmRequest::new(messages).with_temperature(self.temperature);
        let response = self.llm.generate(request).await.map_err(|e| {
            warn!(%stage, error = %e, "model call failed");
            ChainError::at(stage, e)
        })?;
        Ok(response.content.trim().to_string())
    }

    /// Rewrite `question` so it can be understood without `history`.
    ///
    /// Returns `question` unchanged when `history` is empty.
    pub async fn contextualize(&self, question: &str, history: &[Message]) -> Result<String> {
        if history.is_empty() {
            return Ok(question.to_string());
        }
        let rewritten =
            self.complete(Stage::Contextualize, contextualize_messages(history, question)).await?;
        debug!(original = question, standalone = %rewritten, "contextualized question");
        Ok(rewritten)
    }

    /// Answer `question` given the prior conversation.
    ///
    /// # Errors
    ///
    /// Any failing step yields [`ChainError::GenerationFailed`] naming the
    /// step; no partial answer is returned.
    pub async fn ask(&self, question: &str, history: &[Message]) -> Result<RagAnswer> {
        let standalone_question = self.contextualize(question, history).await?;

        let sources = self.pipeline.retrieve(&standalone_question).await.map_err(|e| {
            warn!(error = %e, "retrieval failed");
            ChainError::at(Stage::Retrieve, e)
        })?;
        debug!(source_count = sources.len(), "retrieved context");

        let context = format_context(&sources);
        let answer = self.complete(Stage::Answer, qa_messages(&context, history, question)).await?;

        Ok(RagAnswer { answer, standalone_question, sources })
    }
}

#[cfg(test)]
mod tests {
    use ragchat_model::{MockLlm, Role};
    use ragchat_rag::{
        Document, InMemoryVectorStore, MockEmbeddingProvider, RagConfig, RecursiveChunker,
    };

    use super::*;

    async fn indexed_pipeline() -> Arc<RagPipeline> {
        let pipeline = RagPipeline::builder()
            .config(RagConfig::builder().top_k(2).build().unwrap())
            .embedding_provider(Arc::new(MockEmbeddingProvider::new(16)))
            .vector_store(Arc::new(InMemoryVectorStore::new()))
            .chunker(Arc::new(RecursiveChunker::new(200, 0)))
            .build()
            .unwrap();
        let docs = vec![
            Document::new("rust.md", "Rust was first released in 2015."),
            Document::new("tea.md", "Green tea is brewed at 80 degrees."),
        ];
        pipeline.ingest_documents(&docs, true).await.unwrap();
        Arc::new(pipeline)
    }

    #[tokio::test]
    async fn empty_history_skips_rewriting() {
        let llm = Arc::new(MockLlm::new());
        let chain = RagChain::new(llm.clone(), indexed_pipeline().await).await.unwrap();
        let standalone = chain.contextualize("What is X?", &[]).await.unwrap();
        assert_eq!(standalone, "What is X?");
        assert_eq!(llm.call_count().await, 0);
    }

    #[tokio::test]
    async fn history_triggers_rewrite() {
        let llm = Arc::new(MockLlm::new().with_replies(["  When was Rust released?  ", "2015."]));
        let chain = RagChain::new(llm.clone(), indexed_pipeline().await).await.unwrap();
        let history = vec![Message::user("Tell me about Rust"), Message::assistant("A language.")];

        let answer = chain.ask("When was it released?", &history).await.unwrap();
        assert_eq!(answer.standalone_question, "When was Rust released?");
        assert_eq!(answer.answer, "2015.");
        assert_eq!(answer.sources.len(), 2);

        let requests = llm.requests().await;
        assert_eq!(requests.len(), 2);
        // The answer call sees the original question, not the rewrite.
        let last = requests[1].messages.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(last.content, "When was it released?");
    }

    #[tokio::test]
    async fn retrieved_text_reaches_the_prompt() {
        let llm = Arc::new(MockLlm::new().with_replies(["In 2015."]));
        let chain = RagChain::new(llm.clone(), indexed_pipeline().await).await.unwrap();

        let answer = chain.ask("Rust was first released in 2015.", &[]).await.unwrap();
        assert_eq!(answer.sources[0].chunk.document_id, "rust.md");

        let requests = llm.requests().await;
        let system = &requests[0].messages[0];
        assert_eq!(system.role, Role::System);
        assert!(system.content.contains("Rust was first released in 2015."));
        assert!(system.content.contains("Green tea is brewed at 80 degrees."));
    }

    #[tokio::test]
    async fn temperature_is_forwarded() {
        let llm = Arc::new(MockLlm::new());
        let chain = RagChain::new(llm.clone(), indexed_pipeline().await)
            .await
            .unwrap()
            .with_temperature(Some(0.2));
        chain.ask("anything", &[]).await.unwrap();
        assert_eq!(llm.requests().await[0].temperature, Some(0.2));
    }

    #[tokio::test]
    async fn missing_index_is_store_unavailable() {
        let pipeline = RagPipeline::builder()
            .embedding_provider(Arc::new(MockEmbeddingProvider::new(16)))
            .vector_store(Arc::new(InMemoryVectorStore::new()))
            .chunker(Arc::new(RecursiveChunker::new(200, 0)))
            .build()
            .unwrap();
        let err = RagChain::new(Arc::new(MockLlm::new()), Arc::new(pipeline)).await.unwrap_err();
        assert!(matches!(err, ChainError::StoreUnavailable { .. }));
        assert!(err.to_string().contains("ragchat --ingest"));
    }

    #[tokio::test]
    async fn model_failure_names_the_stage() {
        let llm = Arc::new(MockLlm::failing("connection refused"));
        let chain = RagChain::new(llm, indexed_pipeline().await).await.unwrap();

        let err = chain.ask("q", &[]).await.unwrap_err();
        assert!(matches!(err, ChainError::GenerationFailed { stage: Stage::Answer, .. }));

        let history = vec![Message::user("hi"), Message::assistant("hello")];
        let err = chain.ask("q", &history).await.unwrap_err();
        assert!(matches!(err, ChainError::GenerationFailed { stage: Stage::Contextualize, .. }));
        assert!(err.to_string().contains("connection refused"));
    }
}
