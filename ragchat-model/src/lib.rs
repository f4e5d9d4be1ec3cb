//! # ragchat-model
//!
//! Chat model integration for ragchat.
//!
//! ## Overview
//!
//! - [`Llm`] - the seam every chat model implements
//! - [`OpenAIClient`] - OpenAI chat completions (and compatible servers)
//! - [`MockLlm`] - scripted model for testing
//! - [`Message`] / [`Role`] - conversation turns
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ragchat_model::{Llm, LlmRequest, Message};
//! use ragchat_model::openai::{OpenAIClient, OpenAIConfig};
//!
//! let model = OpenAIClient::new(OpenAIConfig::new(
//!     std::env::var("OPENAI_API_KEY")?,
//!     "gpt-4o",
//! ))?;
//! let reply = model.generate(LlmRequest::new(vec![Message::user("Hello")])).await?;
//! ```

pub mod error;
pub mod llm;
pub mod message;
pub mod mock;
pub mod openai;

pub use error::{ModelError, Result};
pub use llm::{Llm, LlmRequest, LlmResponse};
pub use message::{Message, Role};
pub use mock::MockLlm;
pub use openai::{OpenAIClient, OpenAIConfig};
