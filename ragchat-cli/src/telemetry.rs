//! Logging setup.

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber on stderr, filtered by `RUST_LOG` or
/// `default_level` when it is unset.
pub fn init(default_level: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}
