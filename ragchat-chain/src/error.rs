//! Error types for the `ragchat-chain` crate.

use std::fmt;

use ragchat_rag::RagError;
use thiserror::Error;

/// Step of a chain invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Rewriting the question into a standalone one.
    Contextualize,
    /// Looking up relevant chunks.
    Retrieve,
    /// Generating the final answer.
    Answer,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Contextualize => "contextualize",
            Stage::Retrieve => "retrieve",
            Stage::Answer => "answer",
        })
    }
}

/// Errors raised while building or running a chain.
#[derive(Debug, Error)]
pub enum ChainError {
    /// No index has been built yet.
    #[error("Vector store not found at {location}. Please run ingestion first (`ragchat --ingest`).")]
    StoreUnavailable {
        /// Where the index was expected.
        location: String,
    },

    /// The index exists but cannot serve this configuration.
    #[error("Vector index cannot be used: {0}")]
    Index(#[source] RagError),

    /// A step of the chain failed; nothing was answered.
    #[error("Error generating response during {stage}: {source}")]
    GenerationFailed {
        /// The step that failed.
        stage: Stage,
        /// The underlying model or retrieval error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The user sent nothing to answer.
    #[error("Question must not be empty")]
    EmptyInput,
}

impl ChainError {
    pub(crate) fn at(stage: Stage, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        ChainError::GenerationFailed { stage, source: Box::new(source) }
    }
}

/// A convenience result type for chain operations.
pub type Result<T> = std::result::Result<T, ChainError>;
