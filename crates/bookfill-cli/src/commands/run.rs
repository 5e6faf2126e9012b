//! Run command: enrich a whole dataset in checkpointed batches.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use bookfill_enrich::{BatchConfig, Quarantine, Scheduler, Worker};
use bookfill_store::{CheckpointPaths, CheckpointStore, read_records};
use clap::Args;
use tracing::{info, warn};

use crate::service::{self, Service};
use crate::{Config, DatasetArgs};

/// Arguments for the run command.
#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Directory for interim, final and quarantine files.
    #[arg(long, default_value = "dataset")]
    pub output_dir: PathBuf,

    /// Interim checkpoint path (overrides the default layout).
    #[arg(long)]
    pub interim: Option<PathBuf>,

    /// Final output path (overrides the default layout).
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Quarantine list path (overrides the default layout).
    #[arg(long)]
    pub quarantine: Option<PathBuf>,

    /// Records per checkpoint (default depends on the service).
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Records enriched concurrently (default depends on the service).
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Pause between batches in seconds (default depends on the service).
    #[arg(long)]
    pub batch_delay_secs: Option<u64>,

    /// Continue from the interim checkpoint of an interrupted run.
    #[arg(long)]
    pub resume: bool,
}

impl RunArgs {
    fn paths(&self) -> CheckpointPaths {
        let defaults = CheckpointPaths::in_dir(&self.output_dir, self.dataset.service.name());
        CheckpointPaths {
            interim: self.interim.clone().unwrap_or(defaults.interim),
            final_output: self.output.clone().unwrap_or(defaults.final_output),
            quarantine: self.quarantine.clone().unwrap_or(defaults.quarantine),
        }
    }

    fn batch_config(&self, service: Service) -> Result<BatchConfig> {
        let defaults = service.batch_defaults();
        let config = BatchConfig::new(
            self.batch_size.unwrap_or(defaults.batch_size),
            self.chunk_size.unwrap_or(defaults.chunk_size),
            self.batch_delay_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.batch_delay),
        )?;
        Ok(config)
    }
}

/// Execute the run command.
pub async fn execute(args: RunArgs, config: &Config) -> Result<()> {
    let service = args.dataset.service;
    let profile = args.dataset.profile();
    let batch_config = args.batch_config(service)?;

    let records = read_records(&args.dataset.input, profile.key_column())
        .with_context(|| format!("reading dataset {}", args.dataset.input.display()))?;
    info!(records = records.len(), service = service.name(), "dataset loaded");

    let store = CheckpointStore::new(args.paths(), profile.key_column());
    let (restored, quarantine) = if args.resume {
        let restored = match store.load_interim().context("reading interim checkpoint")? {
            Some(rows) => rows,
            None => {
                warn!(path = %store.paths().interim.display(), "no checkpoint to resume from, starting fresh");
                Vec::new()
            }
        };
        let quarantine = store.load_quarantine().context("reading quarantine list")?;
        (restored, Quarantine::from_keys(quarantine))
    } else {
        (Vec::new(), Quarantine::new())
    };

    let lookup = service.lookup_client(config)?;
    let scraper = service.scraper(config).await?;

    let mut worker = Worker::new(lookup.as_ref(), &profile, &quarantine);
    if let Some(scraper) = &scraper {
        worker = worker.with_scraper(scraper);
    }
    let scheduler = Scheduler::new(worker, batch_config, &store);
    let result = scheduler.run(&records, restored).await;
    service::shutdown(scraper).await;
    let (_, summary) = result.context("enrichment run failed")?;

    eprintln!(
        "Enriched {} records ({} restored, {} processed): {} merged, {} defaulted",
        summary.total, summary.restored, summary.processed, summary.merged, summary.defaulted
    );
    eprintln!("  Output:     {}", store.paths().final_output.display());
    eprintln!(
        "  Quarantine: {} ({} entries)",
        store.paths().quarantine.display(),
        summary.quarantined
    );
    Ok(())
}
