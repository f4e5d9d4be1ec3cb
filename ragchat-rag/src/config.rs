//! Chunking and retrieval settings.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Tunables shared by ingestion and retrieval.
///
/// Defaults: 1000-character chunks overlapping by 200, three results per
/// query, no score cut-off, 64 texts per embedding request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Upper bound on chunk length, in characters.
    pub chunk_size: usize,
    /// Characters repeated at the start of each following chunk.
    pub chunk_overlap: usize,
    /// Results returned per query.
    pub top_k: usize,
    /// Results scoring below this are dropped. `None` keeps everything.
    pub similarity_threshold: Option<f32>,
    /// Chunk texts per embedding call during ingestion.
    pub embed_batch_size: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 3,
            similarity_threshold: None,
            embed_batch_size: 64,
        }
    }
}

impl RagConfig {
    /// Start from the defaults; [`RagConfigBuilder::build`] validates.
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that the values can drive a pipeline.
    ///
    /// # Errors
    ///
    /// [`RagError::ConfigError`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let problem = if self.chunk_size == 0 {
            Some("chunk_size must be greater than zero".to_string())
        } else if self.chunk_overlap >= self.chunk_size {
            Some(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            ))
        } else if self.top_k == 0 {
            Some("top_k must be greater than zero".to_string())
        } else if self.embed_batch_size == 0 {
            Some("embed_batch_size must be greater than zero".to_string())
        } else {
            None
        };
        problem.map_or(Ok(()), |msg| Err(RagError::ConfigError(msg)))
    }
}

/// Builds a [`RagConfig`] starting from the defaults; [`build`](Self::build)
/// validates.
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Maximum characters per chunk.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Characters shared between neighbouring chunks.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Results returned per query.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Drop results scoring below `threshold`.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = Some(threshold);
        self
    }

    /// Chunk texts sent per embedding request.
    pub fn embed_batch_size(mut self, size: usize) -> Self {
        self.config.embed_batch_size = size;
        self
    }

    /// Validate and return the config.
    ///
    /// # Errors
    ///
    /// [`RagError::ConfigError`] if [`RagConfig::validate`] fails.
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
