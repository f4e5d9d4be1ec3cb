//! LanceDB-backed persistent vector store.
//!
//! Each collection is a LanceDB table under the store's root directory. The
//! table schema carries the collection header: the vector column's fixed
//! size is the dimensionality, and the schema metadata records the embedding
//! model and creation time. Upserts go through `merge_insert` keyed on `id`;
//! search is LanceDB's cosine nearest-neighbour query.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragchat_rag::{CollectionSpec, LanceVectorStore, VectorStore};
//!
//! let store = LanceVectorStore::open("data/processed/vector_db");
//! store.create_collection(&CollectionSpec::new("docs", 1536, "text-embedding-3-small")).await?;
//! store.upsert("docs", &chunks).await?;
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow_array::types::Float32Type;
use arrow_array::{
    Array, ArrayRef, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator,
    StringArray,
};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType, Table};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{CollectionSpec, VectorStore};

const BACKEND: &str = "lancedb";

const EMBEDDING_MODEL_KEY: &str = "ragchat.embedding_model";
const CREATED_AT_KEY: &str = "ragchat.created_at";

const ID_COL: &str = "id";
const DOCUMENT_ID_COL: &str = "document_id";
const TEXT_COL: &str = "text";
const METADATA_COL: &str = "metadata";
const VECTOR_COL: &str = "vector";
const DISTANCE_COL: &str = "_distance";

fn lance_error(e: lancedb::Error) -> RagError {
    RagError::VectorStoreError { backend: BACKEND.to_string(), message: e.to_string() }
}

fn store_error(message: impl Into<String>) -> RagError {
    RagError::VectorStoreError { backend: BACKEND.to_string(), message: message.into() }
}

fn fields(dimensions: i32) -> Vec<Field> {
    vec![
        Field::new(ID_COL, DataType::Utf8, false),
        Field::new(DOCUMENT_ID_COL, DataType::Utf8, false),
        Field::new(TEXT_COL, DataType::Utf8, false),
        Field::new(METADATA_COL, DataType::Utf8, false),
        Field::new(
            VECTOR_COL,
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                dimensions,
            ),
            false,
        ),
    ]
}

fn dimensions_of(spec: &CollectionSpec) -> Result<i32> {
    i32::try_from(spec.dimensions).map_err(|_| {
        RagError::ConfigError(format!("{} dimensions do not fit a vector column", spec.dimensions))
    })
}

/// Schema for a new table, with the collection header in its metadata.
fn table_schema(spec: &CollectionSpec) -> Result<SchemaRef> {
    let metadata = HashMap::from([
        (EMBEDDING_MODEL_KEY.to_string(), spec.embedding_model.clone()),
        (CREATED_AT_KEY.to_string(), Utc::now().to_rfc3339()),
    ]);
    Ok(Arc::new(Schema::new_with_metadata(fields(dimensions_of(spec)?), metadata)))
}

/// Read the collection header back from a table's schema.
async fn spec_of(name: &str, table: &Table) -> Result<CollectionSpec> {
    let schema = table.schema().await.map_err(lance_error)?;
    let field = schema
        .field_with_name(VECTOR_COL)
        .map_err(|e| store_error(format!("table '{name}' has no vector column: {e}")))?;
    let dimensions = match field.data_type() {
        DataType::FixedSizeList(_, size) => usize::try_from(*size).unwrap_or_default(),
        other => {
            return Err(store_error(format!("table '{name}' has a {other} vector column")));
        }
    };
    let embedding_model = schema.metadata().get(EMBEDDING_MODEL_KEY).cloned().unwrap_or_default();
    Ok(CollectionSpec::new(name, dimensions, embedding_model))
}

fn to_record_batch(chunks: &[&Chunk], dimensions: i32) -> Result<RecordBatch> {
    let metadata = chunks
        .iter()
        .map(|c| serde_json::to_string(&c.metadata))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| store_error(format!("failed to encode chunk metadata: {e}")))?;
    let vectors = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
        chunks.iter().map(|c| Some(c.embedding.iter().copied().map(Some).collect::<Vec<_>>())),
        dimensions,
    );

    let ids = StringArray::from_iter_values(chunks.iter().map(|c| c.id.as_str()));
    let document_ids = StringArray::from_iter_values(chunks.iter().map(|c| c.document_id.as_str()));
    let texts = StringArray::from_iter_values(chunks.iter().map(|c| c.text.as_str()));

    RecordBatch::try_new(
        Arc::new(Schema::new(fields(dimensions))),
        vec![
            Arc::new(ids) as ArrayRef,
            Arc::new(document_ids) as ArrayRef,
            Arc::new(texts) as ArrayRef,
            Arc::new(StringArray::from(metadata)) as ArrayRef,
            Arc::new(vectors) as ArrayRef,
        ],
    )
    .map_err(|e| store_error(format!("failed to build record batch: {e}")))
}

fn string_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| store_error(format!("missing {name} column")))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| store_error(format!("{name} column has wrong type")))
}

fn float_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float32Array> {
    batch
        .column_by_name(name)
        .ok_or_else(|| store_error(format!("missing {name} column")))?
        .as_any()
        .downcast_ref::<Float32Array>()
        .ok_or_else(|| store_error(format!("{name} column has wrong type")))
}

/// Turn one batch of nearest-neighbour rows back into scored chunks.
fn read_results(batch: &RecordBatch) -> Result<Vec<SearchResult>> {
    let ids = string_col(batch, ID_COL)?;
    let document_ids = string_col(batch, DOCUMENT_ID_COL)?;
    let texts = string_col(batch, TEXT_COL)?;
    let metadata_json = string_col(batch, METADATA_COL)?;
    let distances = float_col(batch, DISTANCE_COL)?;
    let vectors = batch
        .column_by_name(VECTOR_COL)
        .and_then(|col| col.as_any().downcast_ref::<FixedSizeListArray>())
        .ok_or_else(|| store_error("missing vector column"))?;

    let mut results = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let embedding = vectors
            .value(i)
            .as_any()
            .downcast_ref::<Float32Array>()
            .map(|v| v.values().to_vec())
            .unwrap_or_default();
        let metadata = serde_json::from_str(metadata_json.value(i))
            .map_err(|e| store_error(format!("corrupt metadata for '{}': {e}", ids.value(i))))?;
        results.push(SearchResult {
            chunk: Chunk {
                id: ids.value(i).to_string(),
                text: texts.value(i).to_string(),
                embedding,
                metadata,
                document_id: document_ids.value(i).to_string(),
            },
            // Cosine distance is 1 - similarity.
            score: 1.0 - distances.value(i),
        });
    }
    Ok(results)
}

/// A [`VectorStore`] persisted as LanceDB tables under a root directory.
pub struct LanceVectorStore {
    root: PathBuf,
    connection: OnceCell<Connection>,
}

impl fmt::Debug for LanceVectorStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanceVectorStore")
            .field("root", &self.root)
            .field("connected", &self.connection.initialized())
            .finish()
    }
}

impl LanceVectorStore {
    /// Open a store rooted at `root`. Nothing touches the disk until the
    /// first write, so opening a store that was never built is cheap.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), connection: OnceCell::new() }
    }

    /// The directory holding the LanceDB tables.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn check_name(name: &str) -> Result<()> {
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if valid {
            Ok(())
        } else {
            Err(RagError::ConfigError(format!(
                "invalid collection name '{name}': use letters, digits, '-', '_' or '.'"
            )))
        }
    }

    fn not_found(&self, name: &str) -> RagError {
        RagError::StoreNotFound {
            location: format!("{} (collection '{name}')", self.root.display()),
        }
    }

    /// The database connection. With `create` unset, a root directory that
    /// does not exist yet yields `None` instead of being created.
    async fn connect(&self, create: bool) -> Result<Option<&Connection>> {
        if let Some(connection) = self.connection.get() {
            return Ok(Some(connection));
        }
        if !create && !tokio::fs::try_exists(&self.root).await? {
            return Ok(None);
        }
        tokio::fs::create_dir_all(&self.root).await?;
        let uri = self.root.to_string_lossy().to_string();
        let connection = self
            .connection
            .get_or_try_init(|| async {
                info!(uri = %uri, "connecting to LanceDB");
                lancedb::connect(&uri).execute().await.map_err(lance_error)
            })
            .await?;
        Ok(Some(connection))
    }

    async fn has_table(connection: &Connection, name: &str) -> Result<bool> {
        let names = connection.table_names().execute().await.map_err(lance_error)?;
        Ok(names.iter().any(|n| n == name))
    }

    /// Open `name`, or `None` if the store or the table does not exist.
    async fn table(&self, name: &str) -> Result<Option<Table>> {
        Self::check_name(name)?;
        let Some(connection) = self.connect(false).await? else {
            return Ok(None);
        };
        if !Self::has_table(connection, name).await? {
            return Ok(None);
        }
        let table = connection.open_table(name).execute().await.map_err(lance_error)?;
        Ok(Some(table))
    }

    async fn existing_table(&self, name: &str) -> Result<Table> {
        self.table(name).await?.ok_or_else(|| self.not_found(name))
    }
}

#[async_trait]
impl VectorStore for LanceVectorStore {
    fn location(&self) -> String {
        self.root.display().to_string()
    }

    async fn create_collection(&self, spec: &CollectionSpec) -> Result<()> {
        if let Some(table) = self.table(&spec.name).await? {
            return spec_of(&spec.name, &table).await?.ensure_compatible(spec);
        }
        let schema = table_schema(spec)?;
        let connection = self
            .connect(true)
            .await?
            .ok_or_else(|| store_error(format!("cannot open {}", self.root.display())))?;
        connection.create_empty_table(&spec.name, schema).execute().await.map_err(lance_error)?;
        info!(collection = %spec.name, dimensions = spec.dimensions, "created collection");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        Self::check_name(name)?;
        let Some(connection) = self.connect(false).await? else {
            return Ok(());
        };
        if Self::has_table(connection, name).await? {
            connection.drop_table(name, &[]).await.map_err(lance_error)?;
            info!(collection = name, "dropped collection");
        }
        Ok(())
    }

    async fn collection(&self, name: &str) -> Result<Option<CollectionSpec>> {
        match self.table(name).await? {
            Some(table) => Ok(Some(spec_of(name, &table).await?)),
            None => Ok(None),
        }
    }

    async fn clear(&self) -> Result<()> {
        let Some(connection) = self.connect(false).await? else {
            return Ok(());
        };
        let names = connection.table_names().execute().await.map_err(lance_error)?;
        for name in &names {
            connection.drop_table(name, &[]).await.map_err(lance_error)?;
        }
        info!(root = %self.root.display(), dropped = names.len(), "cleared vector store");
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let table = self.existing_table(collection).await?;
        let spec = spec_of(collection, &table).await?;
        for chunk in chunks {
            spec.ensure_dimensions(&chunk.embedding)?;
        }

        // merge_insert rejects a source with repeated keys; the last one wins.
        let mut seen = HashSet::new();
        let mut unique: Vec<&Chunk> =
            chunks.iter().rev().filter(|c| seen.insert(c.id.clone())).collect();
        if unique.is_empty() {
            return Ok(());
        }
        unique.reverse();

        let batch = to_record_batch(&unique, dimensions_of(&spec)?)?;
        let schema = batch.schema();
        let reader = RecordBatchIterator::new(vec![Ok(batch)], schema);

        let mut merge = table.merge_insert(&[ID_COL]);
        merge.when_matched_update_all(None).when_not_matched_insert_all();
        merge.execute(Box::new(reader)).await.map_err(lance_error)?;
        debug!(collection, chunk_count = unique.len(), "upserted chunks");
        Ok(())
    }

    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()> {
        let table = self.existing_table(collection).await?;
        if ids.is_empty() {
            return Ok(());
        }
        let quoted: Vec<String> =
            ids.iter().map(|id| format!("'{}'", id.replace('\'', "''"))).collect();
        let predicate = format!("{ID_COL} IN ({})", quoted.join(", "));
        table.delete(&predicate).await.map_err(lance_error)?;
        debug!(collection, id_count = ids.len(), "deleted chunks");
        Ok(())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let table = self.existing_table(collection).await?;
        table.count_rows(None).await.map_err(lance_error)
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let table = self.existing_table(collection).await?;
        spec_of(collection, &table).await?.ensure_dimensions(embedding)?;
        if top_k == 0 || table.count_rows(None).await.map_err(lance_error)? == 0 {
            return Ok(Vec::new());
        }

        let mut stream = table
            .vector_search(embedding.to_vec())
            .map_err(lance_error)?
            .distance_type(DistanceType::Cosine)
            .limit(top_k)
            .execute()
            .await
            .map_err(lance_error)?;

        let mut results = Vec::new();
        while let Some(batch) = stream.try_next().await.map_err(lance_error)? {
            results.extend(read_results(&batch)?);
        }
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk.id.cmp(&b.chunk.id))
        });
        results.truncate(top_k);
        Ok(results)
    }
}
