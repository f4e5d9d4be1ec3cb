//! The chat model abstraction.

use async_trait::async_trait;

use crate::error::Result;
use crate::message::Message;

/// A single non-streaming completion request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmRequest {
    /// Conversation to complete, oldest first.
    pub messages: Vec<Message>,
    /// Sampling temperature; `None` leaves the provider default.
    pub temperature: Option<f32>,
}

impl LlmRequest {
    /// A request for `messages` at the provider's default temperature.
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages, temperature: None }
    }

    /// Override the sampling temperature.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

/// The model's reply.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    /// Generated assistant text.
    pub content: String,
    /// Why generation stopped, when the provider reports it.
    pub finish_reason: Option<String>,
}

impl LlmResponse {
    /// A reply with no finish reason.
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into(), finish_reason: None }
    }
}

/// A hosted or mocked chat model.
#[async_trait]
pub trait Llm: Send + Sync {
    /// Model identifier, used in logs.
    fn name(&self) -> &str;

    /// Produce one assistant reply for `request`.
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse>;
}
