//! OpenAI provider.
//!
//! Built on `async-openai`. Any OpenAI-compatible server (vLLM, Ollama,
//! LiteLLM) works with a custom base URL.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragchat_model::openai::{OpenAIClient, OpenAIConfig};
//!
//! let model = OpenAIClient::new(OpenAIConfig::new(
//!     std::env::var("OPENAI_API_KEY")?,
//!     "gpt-4o",
//! ))?;
//! ```

mod client;
mod config;

pub use client::OpenAIClient;
pub use config::{DEFAULT_CHAT_MODEL, OPENAI_API_BASE, OpenAIConfig};
