//! Vector store trait for storing and searching vector embeddings.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};

/// Parameters fixed when a collection is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSpec {
    /// Collection name.
    pub name: String,
    /// Length of every vector stored in the collection.
    pub dimensions: usize,
    /// Embedding model the vectors were produced with.
    pub embedding_model: String,
}

impl CollectionSpec {
    /// Create a spec for `name` holding `dimensions`-long vectors from `embedding_model`.
    pub fn new(
        name: impl Into<String>,
        dimensions: usize,
        embedding_model: impl Into<String>,
    ) -> Self {
        Self { name: name.into(), dimensions, embedding_model: embedding_model.into() }
    }

    /// Check that an existing collection is compatible with `other`.
    pub(crate) fn ensure_compatible(&self, other: &CollectionSpec) -> Result<()> {
        if self.dimensions != other.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: other.dimensions,
            });
        }
        if self.embedding_model != other.embedding_model {
            return Err(RagError::VectorStoreError {
                backend: "collection".to_string(),
                message: format!(
                    "collection '{}' was built with embedding model '{}', not '{}'; rebuild the index",
                    self.name, self.embedding_model, other.embedding_model
                ),
            });
        }
        Ok(())
    }

    /// Check that `embedding` has this collection's dimensionality.
    pub(crate) fn ensure_dimensions(&self, embedding: &[f32]) -> Result<()> {
        if embedding.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: embedding.len(),
            });
        }
        Ok(())
    }
}

/// A storage backend for vector embeddings with similarity search.
///
/// Implementations manage named collections of [`Chunk`]s and support
/// upserting, deleting, and searching by vector similarity.
///
/// # Example
///
/// ```rust,ignore
/// use ragchat_rag::{CollectionSpec, InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection(&CollectionSpec::new("docs", 384, "mock")).await?;
/// store.upsert("docs", &chunks).await?;
/// let results = store.search("docs", &query_embedding, 5).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Human-readable description of where the data lives, used in errors.
    fn location(&self) -> String;

    /// Create a collection. No-op if a compatible one already exists.
    ///
    /// Fails if a collection of that name exists with different dimensions
    /// or embedding model.
    async fn create_collection(&self, spec: &CollectionSpec) -> Result<()>;

    /// Delete a named collection and all its data.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Return the spec of a collection, or `None` if it does not exist.
    async fn collection(&self, name: &str) -> Result<Option<CollectionSpec>>;

    /// Whether a named collection exists.
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.collection(name).await?.is_some())
    }

    /// Remove every collection together with any persisted state.
    async fn clear(&self) -> Result<()>;

    /// Upsert chunks into a collection. Chunks must have embeddings set.
    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Delete chunks by their IDs from a collection.
    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()>;

    /// Number of chunks stored in a collection.
    async fn count(&self, collection: &str) -> Result<usize>;

    /// Search for the `top_k` most similar chunks to the given embedding.
    ///
    /// Returns results ordered by descending similarity score. Fails with
    /// [`RagError::StoreNotFound`] if the collection does not exist.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>>;
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Score every chunk against `query` and keep the `top_k` best, nearest first.
///
/// Ties are broken by chunk id so results are deterministic.
pub(crate) fn rank<'a>(
    chunks: impl Iterator<Item = &'a Chunk>,
    query: &[f32],
    top_k: usize,
) -> Vec<SearchResult> {
    let mut scored: Vec<SearchResult> = chunks
        .map(|chunk| {
            let score = cosine_similarity(&chunk.embedding, query);
            SearchResult { chunk: chunk.clone(), score }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.chunk.id.cmp(&b.chunk.id))
    });
    scored.truncate(top_k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_parallel_vectors_is_one() {
        let score = cosine_similarity(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]);
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_with_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn incompatible_specs_are_rejected() {
        let built = CollectionSpec::new("docs", 3, "small");
        assert!(built.ensure_compatible(&CollectionSpec::new("docs", 3, "small")).is_ok());
        assert!(matches!(
            built.ensure_compatible(&CollectionSpec::new("docs", 4, "small")),
            Err(RagError::DimensionMismatch { expected: 3, actual: 4 })
        ));
        assert!(built.ensure_compatible(&CollectionSpec::new("docs", 3, "large")).is_err());
    }
}
