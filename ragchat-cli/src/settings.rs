//! Runtime settings, read from flags or the environment (`.env` included).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Args;
use ragchat_model::openai::{DEFAULT_CHAT_MODEL, OPENAI_API_BASE, OpenAIClient, OpenAIConfig};
use ragchat_rag::openai::DEFAULT_MODEL as DEFAULT_EMBEDDING_MODEL;
use ragchat_rag::{
    DEFAULT_COLLECTION, EmbeddingProvider, LanceVectorStore, OpenAIEmbeddingProvider, RagConfig,
    RagPipeline,
};

/// Settings shared by ingestion and chat.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// API key for the OpenAI-compatible endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = OPENAI_API_BASE)]
    pub openai_base_url: String,

    /// Chat model used for rewriting and answering
    #[arg(long, env = "MODEL_NAME", default_value = DEFAULT_CHAT_MODEL)]
    pub model_name: String,

    /// Embedding model used for indexing and queries
    #[arg(long, env = "EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    pub embedding_model: String,

    /// Embedding size, required for models ragchat does not know
    #[arg(long, env = "EMBEDDING_DIMENSIONS")]
    pub embedding_dimensions: Option<usize>,

    /// Directory holding the persisted vector index
    #[arg(long, env = "PERSIST_DIRECTORY", default_value = "data/processed/vector_db")]
    pub persist_directory: PathBuf,

    /// Name of the collection inside the index
    #[arg(long, env = "COLLECTION_NAME", default_value = DEFAULT_COLLECTION)]
    pub collection_name: String,

    /// Directory scanned for documents by `--ingest`
    #[arg(long, env = "RAW_DATA_DIR", default_value = "data/raw")]
    pub raw_data_dir: PathBuf,

    /// Maximum chunk length in characters
    #[arg(long, env = "CHUNK_SIZE", default_value_t = 1000)]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[arg(long, env = "CHUNK_OVERLAP", default_value_t = 200)]
    pub chunk_overlap: usize,

    /// Number of chunks retrieved per question
    #[arg(long, env = "RETRIEVAL_K", default_value_t = 3)]
    pub retrieval_k: usize,

    /// Sampling temperature for the chat model (provider default when unset)
    #[arg(long, env = "TEMPERATURE")]
    pub temperature: Option<f32>,
}

impl Settings {
    /// Validated retrieval settings.
    pub fn rag_config(&self) -> Result<RagConfig> {
        RagConfig::builder()
            .chunk_size(self.chunk_size)
            .chunk_overlap(self.chunk_overlap)
            .top_k(self.retrieval_k)
            .build()
            .context("invalid settings")
    }

    /// The API key, or an error telling the user how to provide one.
    pub fn api_key(&self) -> Result<&str> {
        self.openai_api_key.as_deref().filter(|k| !k.trim().is_empty()).ok_or_else(|| {
            anyhow!("OPENAI_API_KEY is not set; add it to .env or pass --openai-api-key")
        })
    }

    pub fn embedding_provider(&self) -> Result<OpenAIEmbeddingProvider> {
        let mut provider =
            OpenAIEmbeddingProvider::new(self.api_key()?)?.with_base_url(&self.openai_base_url);
        if let Some(dims) = self.embedding_dimensions {
            provider = provider.with_dimensions(dims);
        }
        Ok(provider.with_model(&self.embedding_model)?)
    }

    pub fn chat_model(&self) -> Result<OpenAIClient> {
        let config = OpenAIConfig::new(self.api_key()?, &self.model_name)
            .with_base_url(&self.openai_base_url);
        Ok(OpenAIClient::new(config)?)
    }

    /// A pipeline over the persisted index using `embedder`. Chunks are
    /// sized by `--chunk-size` and `--chunk-overlap`.
    pub fn pipeline(&self, embedder: Arc<dyn EmbeddingProvider>) -> Result<RagPipeline> {
        Ok(RagPipeline::builder()
            .config(self.rag_config()?)
            .embedding_provider(embedder)
            .vector_store(Arc::new(LanceVectorStore::open(&self.persist_directory)))
            .collection(&self.collection_name)
            .build()?)
    }
}
