//! Resume command: retry quarantined records and reconcile them into the output.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bookfill_enrich::{CorrectionTable, KeyResolver, Prompt, Quarantine, ResumeController, Worker};
use bookfill_store::{
    CheckpointPaths, CheckpointStore, load_output, read_quarantine, read_records, read_table,
};
use clap::Args;
use tracing::info;

use crate::service;
use crate::{Config, DatasetArgs};

/// Arguments for the resume command.
#[derive(Debug, Args)]
pub struct ResumeArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Directory holding the run's output files (used when paths are not given).
    #[arg(long, default_value = "dataset")]
    pub output_dir: PathBuf,

    /// Full output of the previous run; updated in place.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Quarantine list of the previous run; updated in place.
    #[arg(long)]
    pub quarantine: Option<PathBuf>,

    /// CSV of corrections: first column the record key, second the corrected
    /// search key (`0` or empty skips the record).
    #[arg(long, conflicts_with = "interactive")]
    pub corrections: Option<PathBuf>,

    /// Prompt for each quarantined record's corrected key.
    #[arg(long, short = 'i')]
    pub interactive: bool,

    /// Retry records without a correction using their usual key.
    #[arg(long)]
    pub retry_unmapped: bool,
}

impl ResumeArgs {
    fn paths(&self) -> CheckpointPaths {
        let defaults = CheckpointPaths::in_dir(&self.output_dir, self.dataset.service.name());
        let output = self.output.clone().unwrap_or(defaults.final_output);
        CheckpointPaths {
            // Resolved rows are written straight back over the output.
            interim: output.clone(),
            final_output: output,
            quarantine: self.quarantine.clone().unwrap_or(defaults.quarantine),
        }
    }
}

/// Execute the resume command.
pub async fn execute(args: ResumeArgs, config: &Config) -> Result<()> {
    let service = args.dataset.service;
    let profile = args.dataset.profile();
    let paths = args.paths();
    let key_column = profile.key_column();

    let records = read_records(&args.dataset.input, key_column)
        .with_context(|| format!("reading dataset {}", args.dataset.input.display()))?;
    let mut output = load_output(&paths.final_output, key_column)
        .with_context(|| format!("reading output {}", paths.final_output.display()))?;
    let quarantine = Quarantine::from_keys(
        read_quarantine(&paths.quarantine, key_column)
            .with_context(|| format!("reading quarantine {}", paths.quarantine.display()))?,
    );
    if quarantine.is_empty() {
        eprintln!("Nothing to resume: {} is empty", paths.quarantine.display());
        return Ok(());
    }

    let mut resolver: Box<dyn KeyResolver> = if args.interactive {
        Box::new(Prompt::new(io::stdin().lock(), io::stderr()))
    } else {
        let corrections = match &args.corrections {
            Some(path) => read_corrections(path)?,
            None => HashMap::new(),
        };
        info!(corrections = corrections.len(), "corrections loaded");
        Box::new(CorrectionTable::new(corrections).retry_unmapped(args.retry_unmapped))
    };

    let lookup = service.lookup_client(config)?;
    let scraper = service.scraper(config).await?;
    let store = CheckpointStore::new(paths, key_column);

    let mut worker = Worker::new(lookup.as_ref(), &profile, &quarantine);
    if let Some(scraper) = &scraper {
        worker = worker.with_scraper(scraper);
    }
    let controller = ResumeController::new(worker, &store);
    let result = controller
        .run(&records, &mut output, resolver.as_mut())
        .await;
    service::shutdown(scraper).await;
    let summary = result.context("resume failed")?;

    eprintln!(
        "Resolved {}, still failing {}, skipped {}, unknown {}{}",
        summary.resolved,
        summary.still_failing,
        summary.skipped,
        summary.unknown,
        if summary.stopped { " (stopped early)" } else { "" }
    );
    eprintln!(
        "  Quarantine: {} ({} remaining)",
        store.paths().quarantine.display(),
        quarantine.len()
    );
    Ok(())
}

/// Read a two-column corrections table into key → corrected key.
fn read_corrections(path: &Path) -> Result<HashMap<String, String>> {
    let rows = read_table(path).with_context(|| format!("reading corrections {}", path.display()))?;
    let corrections = rows
        .iter()
        .filter_map(|row| {
            let mut values = row.iter().map(|(_, v)| v.unwrap_or("").trim());
            let key = values.next().filter(|k| !k.is_empty())?;
            let correction = values.next().unwrap_or("");
            Some((key.to_string(), correction.to_string()))
        })
        .collect();
    Ok(corrections)
}
