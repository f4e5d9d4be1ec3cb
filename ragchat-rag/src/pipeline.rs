//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates the ingest-and-retrieve workflow by
//! composing an [`EmbeddingProvider`], a [`VectorStore`] and a [`Chunker`]
//! around one named collection.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragchat_rag::{RagPipeline, RagConfig, LanceVectorStore};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_store(Arc::new(LanceVectorStore::open("data/processed/vector_db")))
//!     .collection("rag_collection")
//!     .build()?;
//!
//! pipeline.ingest_documents(&documents, true).await?;
//! let results = pipeline.retrieve("search query").await?;
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::chunking::{Chunker, RecursiveChunker, split_documents};
use crate::config::RagConfig;
use crate::document::{Chunk, Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::{CollectionSpec, VectorStore};

/// Collection used when none is configured.
pub const DEFAULT_COLLECTION: &str = "rag_collection";

/// Outcome of an ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Collection written to.
    pub collection: String,
    /// Documents that were split.
    pub document_count: usize,
    /// Chunks embedded and stored.
    pub chunk_count: usize,
    /// Whether the store was wiped first.
    pub reset: bool,
}

/// Errors the caller can act on pass through untouched; everything else is
/// wrapped with `context`.
fn wrap(context: String, e: RagError) -> RagError {
    match e {
        RagError::StoreNotFound { .. }
        | RagError::DimensionMismatch { .. }
        | RagError::ConfigError(_) => e,
        other => RagError::PipelineError(format!("{context}: {other}")),
    }
}

/// The RAG pipeline orchestrator.
///
/// Coordinates index building (embed → store) and retrieval
/// (embed → search → filter). Construct one via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
    collection: String,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Name of the collection this pipeline reads and writes.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn not_found(&self) -> RagError {
        RagError::StoreNotFound {
            location: format!(
                "{} (collection '{}')",
                self.vector_store.location(),
                self.collection
            ),
        }
    }

    fn spec(&self) -> CollectionSpec {
        CollectionSpec::new(
            &self.collection,
            self.embedding_provider.dimensions(),
            self.embedding_provider.model_name(),
        )
    }

    /// Check that an index exists and was built with this pipeline's
    /// embedding model.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::StoreNotFound`] if nothing has been ingested, or
    /// a mismatch error if the index must be rebuilt.
    pub async fn ensure_index(&self) -> Result<CollectionSpec> {
        let existing = self
            .vector_store
            .collection(&self.collection)
            .await
            .map_err(|e| wrap(format!("failed to open collection '{}'", self.collection), e))?
            .ok_or_else(|| self.not_found())?;
        existing.ensure_compatible(&self.spec())?;
        Ok(existing)
    }

    /// Number of chunks currently stored.
    pub async fn count(&self) -> Result<usize> {
        self.vector_store.count(&self.collection).await
    }

    /// Split documents with the configured chunker, then build the index.
    ///
    /// See [`build_index`](Self::build_index) for the meaning of `reset`.
    pub async fn ingest_documents(
        &self,
        documents: &[Document],
        reset: bool,
    ) -> Result<IngestReport> {
        let chunks = split_documents(self.chunker.as_ref(), documents);
        info!(document_count = documents.len(), chunk_count = chunks.len(), "split documents");
        let mut report = self.build_index(chunks, reset).await?;
        report.document_count = documents.len();
        Ok(report)
    }

    /// Embed `chunks` and store them in the collection.
    ///
    /// With `reset`, every existing collection and its persisted data is
    /// destroyed first, so the index afterwards holds exactly `chunks`.
    /// Without it, chunks are upserted by id into any existing index.
    /// An empty `chunks` is logged and otherwise does nothing.
    ///
    /// Every chunk is embedded before the store is touched, so a failed
    /// embedding call leaves the previous index as it was. If storing fails
    /// after a reset, the half-built collection is dropped again.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if embedding or storage fails.
    pub async fn build_index(&self, mut chunks: Vec<Chunk>, reset: bool) -> Result<IngestReport> {
        self.embed_chunks(&mut chunks).await?;

        if reset {
            self.vector_store.clear().await.map_err(|e| {
                error!(error = %e, "failed to reset vector store");
                wrap("failed to reset vector store".to_string(), e)
            })?;
            info!(location = %self.vector_store.location(), "reset vector store");
        }

        let mut report = IngestReport {
            collection: self.collection.clone(),
            document_count: 0,
            chunk_count: 0,
            reset,
        };
        if chunks.is_empty() {
            warn!("no chunks to ingest");
            return Ok(report);
        }

        let existed = self.vector_store.collection_exists(&self.collection).await.map_err(|e| {
            wrap(format!("failed to open collection '{}'", self.collection), e)
        })?;
        if let Err(e) = self.store_chunks(&chunks).await {
            if !existed {
                if let Err(cleanup) = self.vector_store.delete_collection(&self.collection).await {
                    warn!(error = %cleanup, "failed to drop partially built collection");
                }
            }
            return Err(e);
        }

        report.chunk_count = chunks.len();
        info!(collection = %self.collection, chunk_count = report.chunk_count, "built index");
        Ok(report)
    }

    async fn embed_chunks(&self, chunks: &mut [Chunk]) -> Result<()> {
        for batch in chunks.chunks_mut(self.config.embed_batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let embeddings = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
                error!(error = %e, "embedding failed during ingestion");
                wrap("embedding failed".to_string(), e)
            })?;
            if embeddings.len() != batch.len() {
                return Err(RagError::PipelineError(format!(
                    "embedding provider returned {} vectors for {} chunks",
                    embeddings.len(),
                    batch.len()
                )));
            }
            for (chunk, embedding) in batch.iter_mut().zip(embeddings) {
                chunk.embedding = embedding;
            }
        }
        Ok(())
    }

    async fn store_chunks(&self, chunks: &[Chunk]) -> Result<()> {
        self.vector_store.create_collection(&self.spec()).await.map_err(|e| {
            error!(collection = %self.collection, error = %e, "failed to create collection");
            wrap(format!("failed to create collection '{}'", self.collection), e)
        })?;
        self.vector_store.upsert(&self.collection, chunks).await.map_err(|e| {
            error!(collection = %self.collection, error = %e, "upsert failed during ingestion");
            wrap(format!("upsert failed for collection '{}'", self.collection), e)
        })
    }

    /// Retrieve the configured `top_k` chunks nearest to `query`.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.retrieve_k(query, self.config.top_k).await
    }

    /// Retrieve the `k` chunks nearest to `query`, nearest first.
    ///
    /// Results below the configured `similarity_threshold`, if any, are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::StoreNotFound`] if no index exists, or
    /// [`RagError::PipelineError`] if embedding or search fails.
    pub async fn retrieve_k(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        self.ensure_index().await?;

        let query_embedding = self.embedding_provider.embed(query).await.map_err(|e| {
            error!(error = %e, "embedding failed during query");
            wrap("query embedding failed".to_string(), e)
        })?;

        let results =
            self.vector_store.search(&self.collection, &query_embedding, k).await.map_err(|e| {
                error!(collection = %self.collection, error = %e, "vector store search failed");
                wrap(format!("search failed in collection '{}'", self.collection), e)
            })?;

        let results: Vec<SearchResult> = match self.config.similarity_threshold {
            Some(threshold) => results.into_iter().filter(|r| r.score >= threshold).collect(),
            None => results,
        };

        info!(result_count = results.len(), "retrieval completed");
        Ok(results)
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// `embedding_provider` and `vector_store` are required. The config defaults
/// to [`RagConfig::default()`], the chunker to a [`RecursiveChunker`] sized
/// by the config, and the collection to [`DEFAULT_COLLECTION`].
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
    collection: Option<String>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Use `chunker` instead of the config-sized [`RecursiveChunker`].
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the collection name.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.collection = Some(name.into());
        self
    }

    /// Build the [`RagPipeline`], validating the config and the required
    /// fields.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the config is invalid, a required
    /// field is missing or the collection name is empty.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let chunker = self.chunker.unwrap_or_else(|| {
            Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap))
        });
        let collection = self.collection.unwrap_or_else(|| DEFAULT_COLLECTION.to_string());
        if collection.trim().is_empty() {
            return Err(RagError::ConfigError("collection name must not be empty".to_string()));
        }

        Ok(RagPipeline {
            config,
            embedding_provider,
            vector_store,
            chunker,
            collection,
        })
    }
}
