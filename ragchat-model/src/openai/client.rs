//! OpenAI client implementation.

use async_openai::Client;
use async_openai::config::OpenAIConfig as AsyncOpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
};
use async_trait::async_trait;
use tracing::{debug, error};

use super::config::OpenAIConfig;
use crate::error::{ModelError, Result};
use crate::llm::{Llm, LlmRequest, LlmResponse};
use crate::message::{Message, Role};

const PROVIDER: &str = "OpenAI";

/// OpenAI client for the standard OpenAI API and OpenAI-compatible APIs.
pub struct OpenAIClient {
    client: Client<AsyncOpenAIConfig>,
    model: String,
}

impl OpenAIClient {
    /// Create a new OpenAI client.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(ModelError::Config("API key must not be empty".into()));
        }
        if config.model.is_empty() {
            return Err(ModelError::Config("model name must not be empty".into()));
        }

        let mut openai_config = AsyncOpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(config.api_base());
        if let Some(org_id) = &config.organization_id {
            openai_config = openai_config.with_org_id(org_id);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ModelError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client: Client::with_config(openai_config).with_http_client(http),
            model: config.model,
        })
    }

    /// Create a client for an OpenAI-compatible API.
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        Self::new(OpenAIConfig::compatible(api_key, base_url, model))
    }
}

fn to_openai_message(message: &Message) -> Result<ChatCompletionRequestMessage> {
    let content = message.content.as_str();
    let converted: std::result::Result<ChatCompletionRequestMessage, OpenAIError> =
        match message.role {
            Role::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(content)
                .build()
                .map(Into::into),
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(content)
                .build()
                .map(Into::into),
            Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                .content(content)
                .build()
                .map(Into::into),
        };
    converted.map_err(|e| {
        ModelError::Config(format!("failed to build {} message: {e}", message.role))
    })
}

fn from_openai_error(e: OpenAIError) -> ModelError {
    match e {
        OpenAIError::ApiError(api) => {
            ModelError::Api { provider: PROVIDER.into(), message: api.message }
        }
        OpenAIError::InvalidArgument(message) => ModelError::Config(message),
        other => ModelError::Request { provider: PROVIDER.into(), message: other.to_string() },
    }
}

/// Pull the first choice's text out of a completion.
fn into_response(response: CreateChatCompletionResponse) -> Result<LlmResponse> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ModelError::EmptyResponse { provider: PROVIDER.into() })?;
    let content = choice
        .message
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ModelError::EmptyResponse { provider: PROVIDER.into() })?;
    let finish_reason = choice
        .finish_reason
        .and_then(|reason| serde_json::to_value(reason).ok())
        .and_then(|value| value.as_str().map(str::to_string));
    Ok(LlmResponse { content, finish_reason })
}

#[async_trait]
impl Llm for OpenAIClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse> {
        debug!(
            provider = PROVIDER,
            model = %self.model,
            message_count = request.messages.len(),
            "chat completion request"
        );

        let messages =
            request.messages.iter().map(to_openai_message).collect::<Result<Vec<_>>>()?;
        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder.model(&self.model).messages(messages);
        if let Some(temperature) = request.temperature {
            request_builder.temperature(temperature);
        }
        let openai_request = request_builder
            .build()
            .map_err(|e| ModelError::Config(format!("failed to build request: {e}")))?;

        let response = self.client.chat().create(openai_request).await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "chat completion failed");
            from_openai_error(e)
        })?;

        let reply = into_response(response)?;
        debug!(
            provider = PROVIDER,
            finish_reason = reply.finish_reason.as_deref().unwrap_or("unknown"),
            "chat completion done"
        );
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completion(choices: serde_json::Value) -> CreateChatCompletionResponse {
        serde_json::from_value(serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gpt-4o",
            "choices": choices,
        }))
        .unwrap()
    }

    #[test]
    fn rejects_empty_api_key() {
        let result = OpenAIClient::new(OpenAIConfig::new("", "gpt-4o"));
        assert!(matches!(result, Err(ModelError::Config(_))));
    }

    #[test]
    fn messages_keep_role_and_content() {
        let messages =
            [Message::system("be brief"), Message::user("hi"), Message::assistant("hello")];
        for message in messages {
            let converted = serde_json::to_value(to_openai_message(&message).unwrap()).unwrap();
            assert_eq!(converted["role"], message.role.as_str());
            assert_eq!(converted["content"], message.content.as_str());
        }
    }

    #[test]
    fn first_choice_is_the_reply() {
        let response = completion(serde_json::json!([{
            "index": 0,
            "message": {"role": "assistant", "content": "Paris"},
            "finish_reason": "stop"
        }]));
        let reply = into_response(response).unwrap();
        assert_eq!(reply.content, "Paris");
        assert_eq!(reply.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn missing_or_blank_content_is_empty_response() {
        let response = completion(serde_json::json!([{
            "index": 0,
            "message": {"role": "assistant", "content": "  "}
        }]));
        assert!(matches!(into_response(response), Err(ModelError::EmptyResponse { .. })));

        let response = completion(serde_json::json!([]));
        assert!(matches!(into_response(response), Err(ModelError::EmptyResponse { .. })));
    }

    #[test]
    fn invalid_argument_is_a_config_error() {
        let err = from_openai_error(OpenAIError::InvalidArgument("bad model".into()));
        assert!(matches!(err, ModelError::Config(ref m) if m == "bad model"));
    }
}
