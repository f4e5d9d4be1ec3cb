//! # ragchat-chain
//!
//! Conversational question answering over a ragchat index.
//!
//! - [`RagChain`] rewrites follow-ups into standalone questions, retrieves
//!   context and asks the model for a grounded answer
//! - [`ChatSession`] keeps the turn history of one conversation
//! - [`prompts`] holds the instruction templates
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragchat_chain::{ChatSession, RagChain};
//!
//! let chain = Arc::new(RagChain::new(llm, pipeline).await?);
//! let mut session = ChatSession::new(chain);
//! let answer = session.send("What does the handbook say about leave?").await?;
//! println!("{}", answer.answer);
//! ```

pub mod chain;
pub mod error;
pub mod prompts;
pub mod session;

pub use chain::{RagAnswer, RagChain};
pub use error::{ChainError, Result, Stage};
pub use session::ChatSession;
