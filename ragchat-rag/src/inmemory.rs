//! Volatile vector store for tests and throwaway sessions.
//!
//! Holds every collection in process memory behind a `tokio::sync::RwLock`.
//! Same contract as the on-disk store, minus persistence.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{CollectionSpec, VectorStore, rank};

#[derive(Debug)]
struct Collection {
    spec: CollectionSpec,
    chunks: HashMap<String, Chunk>,
}

/// A [`VectorStore`] that forgets everything when dropped.
///
/// # Example
///
/// ```rust,ignore
/// use ragchat_rag::{CollectionSpec, InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection(&CollectionSpec::new("docs", 384, "mock")).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing(collection: &str) -> RagError {
    RagError::StoreNotFound { location: format!("memory (collection '{collection}')") }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn location(&self) -> String {
        "memory".to_string()
    }

    async fn create_collection(&self, spec: &CollectionSpec) -> Result<()> {
        let mut collections = self.collections.write().await;
        if let Some(existing) = collections.get(&spec.name) {
            return existing.spec.ensure_compatible(spec);
        }
        collections
            .insert(spec.name.clone(), Collection { spec: spec.clone(), chunks: HashMap::new() });
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(name);
        Ok(())
    }

    async fn collection(&self, name: &str) -> Result<Option<CollectionSpec>> {
        let collections = self.collections.read().await;
        Ok(collections.get(name).map(|c| c.spec.clone()))
    }

    async fn clear(&self) -> Result<()> {
        self.collections.write().await.clear();
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| missing(collection))?;
        for chunk in chunks {
            store.spec.ensure_dimensions(&chunk.embedding)?;
        }
        for chunk in chunks {
            store.chunks.insert(chunk.id.clone(), chunk.clone());
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| missing(collection))?;
        for id in ids {
            store.chunks.remove(*id);
        }
        Ok(())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| missing(collection))?;
        Ok(store.chunks.len())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| missing(collection))?;
        store.spec.ensure_dimensions(embedding)?;
        Ok(rank(store.chunks.values(), embedding, top_k))
    }
}
