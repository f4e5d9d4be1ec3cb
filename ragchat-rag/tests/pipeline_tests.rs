//! End-to-end ingestion and retrieval against the mock embedder.

use std::sync::Arc;

use async_trait::async_trait;
use ragchat_rag::{
    Chunk, CollectionSpec, Document, InMemoryVectorStore, LanceVectorStore, MockEmbeddingProvider,
    RagConfig, RagError, RagPipeline, RecursiveChunker, SearchResult, VectorStore,
};

const DIM: usize = 32;

fn pipeline_with(
    store: Arc<dyn VectorStore>,
    embedder: Arc<MockEmbeddingProvider>,
    top_k: usize,
) -> RagPipeline {
    RagPipeline::builder()
        .config(
            RagConfig::builder().chunk_size(200).chunk_overlap(20).top_k(top_k).build().unwrap(),
        )
        .embedding_provider(embedder)
        .vector_store(store)
        .chunker(Arc::new(RecursiveChunker::new(200, 20)))
        .build()
        .unwrap()
}

fn corpus() -> Vec<Document> {
    vec![
        Document::new("pets.md", "Cats sleep most of the day."),
        Document::new("space.md", "Mars has two small moons."),
        Document::new("food.md", "Sourdough needs a starter."),
    ]
}

#[tokio::test]
async fn retrieving_before_ingestion_is_store_not_found() {
    let pipeline = pipeline_with(
        Arc::new(InMemoryVectorStore::new()),
        Arc::new(MockEmbeddingProvider::new(DIM)),
        3,
    );
    let err = pipeline.retrieve("anything").await.unwrap_err();
    assert!(matches!(err, RagError::StoreNotFound { .. }));
    assert!(err.to_string().contains("run ingestion first"));
}

#[tokio::test]
async fn empty_reset_build_leaves_no_index() {
    let pipeline = pipeline_with(
        Arc::new(InMemoryVectorStore::new()),
        Arc::new(MockEmbeddingProvider::new(DIM)),
        3,
    );
    pipeline.ingest_documents(&corpus(), true).await.unwrap();

    let report = pipeline.build_index(Vec::new(), true).await.unwrap();
    assert_eq!(report.chunk_count, 0);
    assert!(report.reset);

    let err = pipeline.retrieve("Mars").await.unwrap_err();
    assert!(matches!(err, RagError::StoreNotFound { .. }));
}

#[tokio::test]
async fn exact_text_is_retrieved_first() {
    let embedder = Arc::new(MockEmbeddingProvider::new(DIM));
    let pipeline = pipeline_with(Arc::new(InMemoryVectorStore::new()), embedder, 1);
    let report = pipeline.ingest_documents(&corpus(), true).await.unwrap();
    assert_eq!(report.document_count, 3);
    assert_eq!(report.chunk_count, 3);

    let hits = pipeline.retrieve("Mars has two small moons.").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].chunk.document_id, "space.md");
    assert!((hits[0].score - 1.0).abs() < 1e-4);
}

#[tokio::test]
async fn retrieve_returns_at_most_top_k() {
    let pipeline = pipeline_with(
        Arc::new(InMemoryVectorStore::new()),
        Arc::new(MockEmbeddingProvider::new(DIM)),
        2,
    );
    pipeline.ingest_documents(&corpus(), true).await.unwrap();
    assert_eq!(pipeline.retrieve("moons").await.unwrap().len(), 2);
    assert_eq!(pipeline.retrieve_k("moons", 10).await.unwrap().len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn reset_replaces_previous_contents() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LanceVectorStore::open(dir.path().join("db")));
    let pipeline = pipeline_with(store, Arc::new(MockEmbeddingProvider::new(DIM)), 3);

    pipeline.ingest_documents(&corpus(), true).await.unwrap();
    assert_eq!(pipeline.count().await.unwrap(), 3);

    let replacement = vec![Document::new("only.md", "A single replacement document.")];
    pipeline.ingest_documents(&replacement, true).await.unwrap();
    assert_eq!(pipeline.count().await.unwrap(), 1);

    let hits = pipeline.retrieve("Cats sleep most of the day.").await.unwrap();
    assert!(hits.iter().all(|h| h.chunk.document_id == "only.md"));
}

#[tokio::test]
async fn build_without_reset_upserts_by_id() {
    let pipeline = pipeline_with(
        Arc::new(InMemoryVectorStore::new()),
        Arc::new(MockEmbeddingProvider::new(DIM)),
        3,
    );
    pipeline.ingest_documents(&corpus(), true).await.unwrap();
    let extra = vec![
        Document::new("pets.md", "Dogs like long walks."),
        Document::new("new.md", "Tea is brewed from leaves."),
    ];
    pipeline.ingest_documents(&extra, false).await.unwrap();
    // pets.md_0 is overwritten, new.md_0 is added.
    assert_eq!(pipeline.count().await.unwrap(), 4);
}

#[tokio::test(flavor = "multi_thread")]
async fn index_survives_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db");
    {
        let pipeline = pipeline_with(
            Arc::new(LanceVectorStore::open(&path)),
            Arc::new(MockEmbeddingProvider::new(DIM)),
            1,
        );
        pipeline.ingest_documents(&corpus(), true).await.unwrap();
    }

    let pipeline = pipeline_with(
        Arc::new(LanceVectorStore::open(&path)),
        Arc::new(MockEmbeddingProvider::new(DIM)),
        1,
    );
    let hits = pipeline.retrieve("Sourdough needs a starter.").await.unwrap();
    assert_eq!(hits[0].chunk.document_id, "food.md");
}

#[tokio::test]
async fn changed_embedding_dimensions_require_rebuild() {
    let store: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::new());
    let first = pipeline_with(store.clone(), Arc::new(MockEmbeddingProvider::new(DIM)), 3);
    first.ingest_documents(&corpus(), true).await.unwrap();

    let second = pipeline_with(store, Arc::new(MockEmbeddingProvider::new(DIM * 2)), 3);
    let err = second.retrieve("Mars").await.unwrap_err();
    assert!(matches!(err, RagError::DimensionMismatch { expected: DIM, .. }));
}

#[tokio::test]
async fn failing_embedder_surfaces_an_error() {
    let embedder = Arc::new(MockEmbeddingProvider::failing(DIM));
    let pipeline = pipeline_with(Arc::new(InMemoryVectorStore::new()), embedder.clone(), 3);
    let err = pipeline.ingest_documents(&corpus(), true).await.unwrap_err();
    assert!(matches!(err, RagError::PipelineError(_)));
    assert!(err.to_string().contains("embedding service unreachable"));
    assert_eq!(embedder.calls(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_ingestion_leaves_no_empty_index() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LanceVectorStore::open(dir.path().join("db")));
    let pipeline = pipeline_with(store, Arc::new(MockEmbeddingProvider::failing(DIM)), 3);

    assert!(pipeline.ingest_documents(&corpus(), true).await.is_err());
    let err = pipeline.ensure_index().await.unwrap_err();
    assert!(matches!(err, RagError::StoreNotFound { .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_reingestion_keeps_the_previous_index() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn VectorStore> = Arc::new(LanceVectorStore::open(dir.path().join("db")));
    let good = pipeline_with(store.clone(), Arc::new(MockEmbeddingProvider::new(DIM)), 3);
    good.ingest_documents(&corpus(), true).await.unwrap();

    let broken = pipeline_with(store, Arc::new(MockEmbeddingProvider::failing(DIM)), 3);
    let replacement = vec![Document::new("only.md", "A single replacement document.")];
    assert!(broken.ingest_documents(&replacement, true).await.is_err());

    assert_eq!(good.count().await.unwrap(), 3);
    let hits = good.retrieve("Mars has two small moons.").await.unwrap();
    assert_eq!(hits[0].chunk.document_id, "space.md");
}

/// Delegates to an in-memory store but refuses every upsert.
struct RejectingStore(InMemoryVectorStore);

#[async_trait]
impl VectorStore for RejectingStore {
    fn location(&self) -> String {
        "rejecting".to_string()
    }

    async fn create_collection(&self, spec: &CollectionSpec) -> ragchat_rag::Result<()> {
        self.0.create_collection(spec).await
    }

    async fn delete_collection(&self, name: &str) -> ragchat_rag::Result<()> {
        self.0.delete_collection(name).await
    }

    async fn collection(&self, name: &str) -> ragchat_rag::Result<Option<CollectionSpec>> {
        self.0.collection(name).await
    }

    async fn clear(&self) -> ragchat_rag::Result<()> {
        self.0.clear().await
    }

    async fn upsert(&self, _collection: &str, _chunks: &[Chunk]) -> ragchat_rag::Result<()> {
        Err(RagError::VectorStoreError {
            backend: "rejecting".to_string(),
            message: "disk full".to_string(),
        })
    }

    async fn delete(&self, collection: &str, ids: &[&str]) -> ragchat_rag::Result<()> {
        self.0.delete(collection, ids).await
    }

    async fn count(&self, collection: &str) -> ragchat_rag::Result<usize> {
        self.0.count(collection).await
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> ragchat_rag::Result<Vec<SearchResult>> {
        self.0.search(collection, embedding, top_k).await
    }
}

#[tokio::test]
async fn failed_upsert_drops_the_new_collection() {
    let pipeline = pipeline_with(
        Arc::new(RejectingStore(InMemoryVectorStore::new())),
        Arc::new(MockEmbeddingProvider::new(DIM)),
        3,
    );
    let err = pipeline.ingest_documents(&corpus(), true).await.unwrap_err();
    assert!(err.to_string().contains("disk full"));
    assert!(matches!(pipeline.ensure_index().await, Err(RagError::StoreNotFound { .. })));
}

#[test]
fn builder_validates_the_config() {
    let build = |config: RagConfig| {
        RagPipeline::builder()
            .config(config)
            .embedding_provider(Arc::new(MockEmbeddingProvider::new(DIM)))
            .vector_store(Arc::new(InMemoryVectorStore::new()))
            .build()
    };
    let zero_batch = RagConfig { embed_batch_size: 0, ..RagConfig::default() };
    assert!(matches!(build(zero_batch), Err(RagError::ConfigError(_))));
    let zero_k = RagConfig { top_k: 0, ..RagConfig::default() };
    assert!(matches!(build(zero_k), Err(RagError::ConfigError(_))));
    assert!(build(RagConfig::default()).is_ok());
}

#[tokio::test]
async fn default_chunker_is_sized_by_the_config() {
    let config = RagConfig { chunk_size: 20, chunk_overlap: 0, ..RagConfig::default() };
    let pipeline = RagPipeline::builder()
        .config(config)
        .embedding_provider(Arc::new(MockEmbeddingProvider::new(DIM)))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .build()
        .unwrap();
    let doc = Document::new("long.md", "one two three four five six seven eight nine ten");
    let report = pipeline.ingest_documents(&[doc], true).await.unwrap();
    assert!(report.chunk_count >= 3);

    let hits = pipeline.retrieve_k("one", 10).await.unwrap();
    assert_eq!(hits.len(), report.chunk_count);
    assert!(hits.iter().all(|h| h.chunk.text.chars().count() <= 20));
}

#[tokio::test]
async fn similarity_threshold_filters_weak_hits() {
    let config = RagConfig::builder().top_k(3).similarity_threshold(0.99).build().unwrap();
    let pipeline = RagPipeline::builder()
        .config(config)
        .embedding_provider(Arc::new(MockEmbeddingProvider::new(DIM)))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .chunker(Arc::new(RecursiveChunker::new(200, 20)))
        .build()
        .unwrap();
    pipeline.ingest_documents(&corpus(), true).await.unwrap();

    let hits = pipeline.retrieve("Cats sleep most of the day.").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].chunk.document_id, "pets.md");
}

#[tokio::test]
async fn chunks_carry_embeddings_in_store() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = pipeline_with(store.clone(), Arc::new(MockEmbeddingProvider::new(DIM)), 3);
    let chunk = Chunk {
        id: "manual_0".to_string(),
        text: "hand made".to_string(),
        embedding: Vec::new(),
        metadata: Default::default(),
        document_id: "manual".to_string(),
    };
    pipeline.build_index(vec![chunk], true).await.unwrap();
    let hits = store.search("rag_collection", &[0.1; DIM], 1).await.unwrap();
    assert_eq!(hits[0].chunk.embedding.len(), DIM);
}
