use clap::Parser;

use crate::settings::Settings;

/// Chat with your documents.
///
/// Run once with `--ingest` to index the files under the raw data directory,
/// then without flags to start an interactive chat over them.
#[derive(Parser, Debug)]
#[command(name = "ragchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Rebuild the vector index from the raw data directory, then exit
    #[arg(long)]
    pub ingest: bool,

    #[command(flatten)]
    pub settings: Settings,
}

impl Cli {
    /// Log level used when `RUST_LOG` is unset.
    pub fn default_log_level(&self) -> &'static str {
        if self.ingest { "info" } else { "warn" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_is_the_default_mode() {
        let cli = Cli::try_parse_from(["ragchat"]).unwrap();
        assert!(!cli.ingest);
        assert_eq!(cli.default_log_level(), "warn");
    }

    #[test]
    fn ingest_flag_switches_mode() {
        let cli = Cli::try_parse_from(["ragchat", "--ingest", "--raw-data-dir", "docs"]).unwrap();
        assert!(cli.ingest);
        assert_eq!(cli.settings.raw_data_dir, std::path::PathBuf::from("docs"));
        assert_eq!(cli.default_log_level(), "info");
    }

    #[test]
    fn clap_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
