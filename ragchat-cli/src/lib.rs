//! # ragchat-cli
//!
//! The `ragchat` binary: `--ingest` rebuilds the index, otherwise an
//! interactive chat runs over it.

pub mod chat;
pub mod cli;
pub mod ingest;
pub mod settings;
pub mod telemetry;

use std::sync::Arc;

use anyhow::Result;
use ragchat_chain::{ChatSession, RagChain};

pub use cli::Cli;
pub use settings::Settings;

/// Run the mode selected on the command line.
pub async fn execute(cli: Cli) -> Result<()> {
    let settings = cli.settings;
    // Reject bad chunking or retrieval settings before any network or disk work.
    settings.rag_config()?;

    let embedder = Arc::new(settings.embedding_provider()?);
    let pipeline = settings.pipeline(embedder)?;

    if cli.ingest {
        let report = ingest::ingest(&pipeline, &settings.raw_data_dir).await?;
        println!(
            "{}",
            ingest::summary(report.as_ref(), &settings.raw_data_dir, &settings.persist_directory)
        );
        return Ok(());
    }

    let llm = Arc::new(settings.chat_model()?);
    let chain =
        RagChain::new(llm, Arc::new(pipeline)).await?.with_temperature(settings.temperature);
    chat::run(ChatSession::new(Arc::new(chain))).await
}
