//! Error types for the `ragchat-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading, indexing or retrieving documents.
#[derive(Debug, Error)]
pub enum RagError {
    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// No index exists at the configured location.
    #[error("Vector store not found at {location}. Please run ingestion first.")]
    StoreNotFound {
        /// Where the index was expected (path and collection).
        location: String,
    },

    /// A vector did not match the dimensionality the collection was built with.
    #[error(
        "Embedding dimension mismatch: index expects {expected}, got {actual}. \
         Rebuild the index after changing the embedding model."
    )]
    DimensionMismatch {
        /// Dimensionality fixed when the collection was created.
        expected: usize,
        /// Dimensionality of the offending vector.
        actual: usize,
    },

    /// A document source could not be read.
    #[error("Loader error ({}): {message}", path.display())]
    LoaderError {
        /// The path being loaded.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error in the ingestion or retrieval orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),

    /// Filesystem failure in a persistent backend.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
