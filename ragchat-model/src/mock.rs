//! Scripted model for tests and offline runs.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{ModelError, Result};
use crate::llm::{Llm, LlmRequest, LlmResponse};

/// An [`Llm`] that replays queued replies and records every request.
///
/// When the queue runs dry it echoes the last user message back, so tests
/// that don't care about the text need no script at all.
#[derive(Debug, Default)]
pub struct MockLlm {
    name: String,
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<LlmRequest>>,
    fail_with: Option<String>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self { name: "mock-llm".to_string(), ..Default::default() }
    }

    /// Queue replies returned in order, one per `generate` call.
    pub fn with_replies<I, S>(self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { replies: Mutex::new(replies.into_iter().map(Into::into).collect()), ..self }
    }

    /// A model whose every call fails as if the API were unreachable.
    pub fn failing(message: impl Into<String>) -> Self {
        Self { fail_with: Some(message.into()), ..Self::new() }
    }

    /// Every request received so far, oldest first.
    pub async fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of `generate` calls so far.
    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl Llm for MockLlm {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse> {
        let echo = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == crate::Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.requests.lock().await.push(request);

        if let Some(message) = &self.fail_with {
            return Err(ModelError::Request { provider: "mock".into(), message: message.clone() });
        }
        let content = self.replies.lock().await.pop_front().unwrap_or(echo);
        Ok(LlmResponse { content, finish_reason: Some("stop".to_string()) })
    }
}
