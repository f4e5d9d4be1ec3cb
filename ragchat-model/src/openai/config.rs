//! OpenAI client configuration.

use std::time::Duration;

/// The default OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Chat model used when none is configured.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";

/// Configuration for the OpenAI chat completions client.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Bearer token sent with every request.
    pub api_key: String,
    /// Model name, e.g. `gpt-4o`.
    pub model: String,
    /// Base URL; `None` means [`OPENAI_API_BASE`].
    pub base_url: Option<String>,
    /// Optional `OpenAI-Organization` header.
    pub organization_id: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl OpenAIConfig {
    /// Configuration for the public OpenAI API.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            organization_id: None,
            timeout: Duration::from_secs(60),
        }
    }

    /// Configuration for an OpenAI-compatible server (vLLM, Ollama, ...).
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self::new(api_key, model).with_base_url(base_url)
    }

    /// Point the client at another OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Send `OpenAI-Organization` with every request.
    pub fn with_organization(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    /// Replace the 60 second default timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The API base without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.base_url.as_deref().unwrap_or(OPENAI_API_BASE).trim_end_matches('/')
    }
}
