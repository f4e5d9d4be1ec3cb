//! `ragchat --ingest`: rebuild the index from the raw data directory.

use std::path::Path;

use anyhow::{Context, Result};
use ragchat_rag::{IngestReport, RagPipeline, load_documents};
use tracing::{info, warn};

/// Load every document under `raw_dir` and replace the index with them.
///
/// Returns `None` without touching the index when no documents are found.
pub async fn ingest(pipeline: &RagPipeline, raw_dir: &Path) -> Result<Option<IngestReport>> {
    info!(raw_dir = %raw_dir.display(), "loading documents");
    let documents = load_documents(raw_dir)
        .with_context(|| format!("failed to load documents from {}", raw_dir.display()))?;
    if documents.is_empty() {
        warn!(raw_dir = %raw_dir.display(), "no documents found");
        return Ok(None);
    }

    let report = pipeline.ingest_documents(&documents, true).await.context("ingestion failed")?;
    info!(
        collection = %report.collection,
        document_count = report.document_count,
        chunk_count = report.chunk_count,
        "ingestion complete"
    );
    Ok(Some(report))
}

/// One-line summary printed after a run.
pub fn summary(report: Option<&IngestReport>, raw_dir: &Path, persist_dir: &Path) -> String {
    match report {
        None => format!("No documents found in {}. Nothing was ingested.", raw_dir.display()),
        Some(r) => format!(
            "Ingested {} documents as {} chunks into collection '{}' at {}.",
            r.document_count,
            r.chunk_count,
            r.collection,
            persist_dir.display()
        ),
    }
}
