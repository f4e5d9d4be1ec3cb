//! Error types for ragchat-model.

use thiserror::Error;

/// Errors that can occur when calling a chat model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Invalid client configuration
    #[error("Invalid model configuration: {0}")]
    Config(String),

    /// The request never produced an HTTP response (connect, timeout, decode)
    #[error("{provider} request failed: {message}")]
    Request { provider: String, message: String },

    /// The API rejected the request with an error body
    #[error("{provider} API error: {message}")]
    Api { provider: String, message: String },

    /// The API answered without any generated text
    #[error("{provider} returned an empty response")]
    EmptyResponse { provider: String },
}

/// Result type alias for ModelError
pub type Result<T> = std::result::Result<T, ModelError>;
