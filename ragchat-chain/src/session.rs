//! Per-conversation state.

use std::sync::Arc;

use ragchat_model::Message;
use ragchat_rag::SearchResult;
use tracing::{info, warn};
use uuid::Uuid;

use crate::chain::{RagAnswer, RagChain};
use crate::error::{ChainError, Result};

/// A conversation with a [`RagChain`].
///
/// History only grows on success: a failed turn leaves it exactly as it was.
#[derive(Debug)]
pub struct ChatSession {
    id: String,
    chain: Arc<RagChain>,
    history: Vec<Message>,
    last_sources: Vec<SearchResult>,
}

impl ChatSession {
    pub fn new(chain: Arc<RagChain>) -> Self {
        let id = Uuid::new_v4().to_string();
        info!(session_id = %id, "chat session started");
        Self { id, chain, history: Vec::new(), last_sources: Vec::new() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Ask a question in the context of this conversation.
    ///
    /// # Errors
    ///
    /// [`ChainError::EmptyInput`] for blank input, otherwise whatever the
    /// chain reports. History is unchanged on error.
    pub async fn send(&mut self, input: &str) -> Result<RagAnswer> {
        let question = input.trim();
        if question.is_empty() {
            return Err(ChainError::EmptyInput);
        }

        let answer = self.chain.ask(question, &self.history).await.map_err(|e| {
            warn!(session_id = %self.id, error = %e, "turn failed");
            e
        })?;

        self.history.push(Message::user(question));
        self.history.push(Message::assistant(answer.answer.clone()));
        self.last_sources = answer.sources.clone();
        info!(session_id = %self.id, turns = self.history.len() / 2, "turn completed");
        Ok(answer)
    }

    /// All turns so far, oldest first.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Sources used for the most recent successful answer.
    pub fn last_sources(&self) -> &[SearchResult] {
        &self.last_sources
    }

    /// Forget the conversation, keeping the session id.
    pub fn clear(&mut self) {
        self.history.clear();
        self.last_sources.clear();
        info!(session_id = %self.id, "history cleared");
    }
}
