//! # ragchat-rag
//!
//! Document ingestion and retrieval for ragchat.
//!
//! ## Overview
//!
//! - [`load_documents`] reads text files from a directory into [`Document`]s
//! - [`RecursiveChunker`] / [`FixedSizeChunker`] split them into overlapping [`Chunk`]s
//! - [`EmbeddingProvider`] turns text into vectors ([`OpenAIEmbeddingProvider`], [`MockEmbeddingProvider`])
//! - [`VectorStore`] keeps embedded chunks ([`LanceVectorStore`] on disk, [`InMemoryVectorStore`])
//! - [`RagPipeline`] ties them together: build an index, retrieve the nearest chunks
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragchat_rag::{
//!     LanceVectorStore, OpenAIEmbeddingProvider, RagConfig, RagPipeline, load_documents,
//! };
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(OpenAIEmbeddingProvider::from_env()?))
//!     .vector_store(Arc::new(LanceVectorStore::open("data/processed/vector_db")))
//!     .build()?;
//!
//! let docs = load_documents("data/raw")?;
//! pipeline.ingest_documents(&docs, true).await?;
//! let hits = pipeline.retrieve("What is X?").await?;
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
pub mod lance;
pub mod loader;
pub mod mock;
pub mod openai;
pub mod pipeline;
pub mod vectorstore;

pub use chunking::{Chunker, FixedSizeChunker, RecursiveChunker, split_documents};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use inmemory::InMemoryVectorStore;
pub use lance::LanceVectorStore;
pub use loader::load_documents;
pub use mock::MockEmbeddingProvider;
pub use openai::OpenAIEmbeddingProvider;
pub use pipeline::{DEFAULT_COLLECTION, IngestReport, RagPipeline, RagPipelineBuilder};
pub use vectorstore::{CollectionSpec, VectorStore, cosine_similarity};
