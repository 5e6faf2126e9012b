//! bookfill: enrich a book dataset from Kakao or Aladin.
//!
//! ## Commands
//!
//! - `bookfill run` - enrich a dataset in checkpointed batches
//! - `bookfill resume` - retry quarantined records with corrected keys
//! - `bookfill lookup` - look up a single book
//!
//! ## Configuration
//!
//! Flags fall back to environment variables, which may come from a `.env` file:
//!
//! - `KAKAO_API_KEY` - Kakao REST API key
//! - `ALADIN_API_KEY` - Aladin TTB key
//! - `RUST_LOG` - log filter (default: `info`)

mod commands;
mod display;
mod service;

use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use bookfill_enrich::EnrichmentProfile;
use service::Service;

/// Fill in book metadata and descriptions from Kakao or Aladin.
#[derive(Debug, Parser)]
#[command(name = "bookfill")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Kakao REST API key.
    #[arg(long, env = "KAKAO_API_KEY", hide_env_values = true, global = true)]
    kakao_api_key: Option<String>,

    /// Aladin TTB key.
    #[arg(long, env = "ALADIN_API_KEY", hide_env_values = true, global = true)]
    aladin_api_key: Option<String>,

    /// Timeout for each metadata request (in seconds).
    #[arg(long, default_value = "10", global = true)]
    lookup_timeout_secs: u64,

    /// Timeout for each description scrape (in seconds; default depends on the service).
    #[arg(long, global = true)]
    scrape_timeout_secs: Option<u64>,

    /// Skip description scraping (no browser needed).
    #[arg(long, global = true)]
    no_scrape: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            kakao_api_key: self.kakao_api_key.clone(),
            aladin_api_key: self.aladin_api_key.clone(),
            lookup_timeout: Duration::from_secs(self.lookup_timeout_secs),
            scrape_timeout: self.scrape_timeout_secs.map(Duration::from_secs),
            no_scrape: self.no_scrape,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Enrich a dataset in checkpointed batches.
    Run(commands::run::RunArgs),
    /// Retry quarantined records and reconcile them into the output.
    Resume(commands::resume::ResumeArgs),
    /// Look up a single book.
    Lookup(commands::lookup::LookupArgs),
}

/// Settings shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Config {
    kakao_api_key: Option<String>,
    aladin_api_key: Option<String>,
    lookup_timeout: Duration,
    scrape_timeout: Option<Duration>,
    no_scrape: bool,
}

/// Dataset and service selection shared by `run` and `resume`.
#[derive(Debug, Args)]
pub struct DatasetArgs {
    /// Upstream service.
    #[arg(long, value_enum)]
    service: Service,

    /// Input dataset (quoted CSV).
    #[arg(long)]
    input: std::path::PathBuf,

    /// Column identifying each record.
    #[arg(long, default_value = "자료명")]
    key_column: String,

    /// Columns tried as the search key before the identity key, in priority
    /// order (repeatable; default depends on the service).
    #[arg(long = "lookup-column")]
    lookup_columns: Vec<String>,
}

impl DatasetArgs {
    fn profile(&self) -> EnrichmentProfile {
        let profile = EnrichmentProfile::new(&self.key_column);
        if self.lookup_columns.is_empty() {
            profile.with_lookup_columns(self.service.default_lookup_columns().iter().copied())
        } else {
            profile.with_lookup_columns(self.lookup_columns.iter().cloned())
        }
    }
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.config();
    tracing::debug!("bookfill v{}", env!("CARGO_PKG_VERSION"));

    // Workers interleave on one thread; chunk size bounds the in-flight set.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match cli.command {
            Commands::Run(args) => commands::run::execute(args, &config).await,
            Commands::Resume(args) => commands::resume::execute(args, &config).await,
            Commands::Lookup(args) => commands::lookup::execute(args, &config).await,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_reach_config() {
        let cli = Cli::parse_from([
            "bookfill",
            "--kakao-api-key",
            "kakao-secret",
            "--lookup-timeout-secs",
            "5",
            "run",
            "--service",
            "kakao",
            "--input",
            "books.csv",
            "--no-scrape",
        ]);

        let config = cli.config();
        assert_eq!(config.kakao_api_key.as_deref(), Some("kakao-secret"));
        assert_eq!(config.lookup_timeout, Duration::from_secs(5));
        assert_eq!(config.scrape_timeout, None);
        assert!(config.no_scrape);
    }

    #[test]
    fn lookup_columns_default_per_service() {
        let cli = Cli::parse_from([
            "bookfill", "run", "--service", "aladin", "--input", "books.csv",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        let profile = args.dataset.profile();
        assert_eq!(profile.key_column(), "자료명");
        assert_eq!(profile.lookup_columns(), ["카카오ISBN", "ISBN"]);
    }

    #[test]
    fn lookup_columns_repeatable_in_order() {
        let cli = Cli::parse_from([
            "bookfill",
            "run",
            "--service",
            "kakao",
            "--input",
            "books.csv",
            "--key-column",
            "title",
            "--lookup-column",
            "isbn13",
            "--lookup-column",
            "isbn10",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        let profile = args.dataset.profile();
        assert_eq!(profile.key_column(), "title");
        assert_eq!(profile.lookup_columns(), ["isbn13", "isbn10"]);
    }

    #[test]
    fn unknown_service_rejected() {
        let result = Cli::try_parse_from([
            "bookfill", "run", "--service", "yes24", "--input", "books.csv",
        ]);
        assert!(result.is_err());
    }
}
