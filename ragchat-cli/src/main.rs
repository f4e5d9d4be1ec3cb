use anyhow::Result;
use clap::Parser;
use ragchat_cli::{Cli, execute, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    // Values from .env never override variables already set in the environment.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    telemetry::init(cli.default_log_level())?;

    execute(cli).await
}
