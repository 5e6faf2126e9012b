//! Batch scheduler: batches of chunks of concurrently enriched records.
//!
//! Within a chunk every record is enriched concurrently on the current task;
//! the next chunk starts only once the whole chunk is done. After each batch
//! the accumulated output and the quarantine are checkpointed, then the
//! scheduler sleeps before the next batch to stay under upstream rate limits.

use std::collections::HashMap;
use std::time::Duration;

use bookfill_core::{EnrichedRecord, Record};
use futures::future::join_all;
use tracing::{debug, info};

use crate::{CheckpointSink, EnrichError, Worker};

/// Batch/chunk sizing and pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Records per checkpoint.
    pub batch_size: usize,
    /// Records enriched concurrently.
    pub chunk_size: usize,
    /// Pause between batches.
    pub batch_delay: Duration,
}

impl BatchConfig {
    pub fn new(batch_size: usize, chunk_size: usize, batch_delay: Duration) -> Result<Self, EnrichError> {
        if batch_size == 0 || chunk_size == 0 {
            return Err(EnrichError::InvalidConfig(format!(
                "batch size ({batch_size}) and chunk size ({chunk_size}) must be positive"
            )));
        }
        Ok(Self {
            batch_size,
            chunk_size,
            batch_delay,
        })
    }
}

/// Counts for one scheduler run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Dataset size.
    pub total: usize,
    /// Rows carried over from a previous run's checkpoint.
    pub restored: usize,
    /// Rows enriched by this run.
    pub processed: usize,
    pub merged: usize,
    pub defaulted: usize,
    pub batches: usize,
    /// Quarantine size at the end of the run.
    pub quarantined: usize,
}

pub struct Scheduler<'a> {
    worker: Worker<'a>,
    config: BatchConfig,
    sink: &'a dyn CheckpointSink,
}

impl<'a> Scheduler<'a> {
    pub fn new(worker: Worker<'a>, config: BatchConfig, sink: &'a dyn CheckpointSink) -> Self {
        Self {
            worker,
            config,
            sink,
        }
    }

    /// Enrich every record of `records`, starting after the rows of `restored`.
    ///
    /// `restored` is a previous run's interim checkpoint (empty for a fresh
    /// run); it must cover exactly the first rows of `records`. Returns the
    /// complete output, which has also been saved as the final checkpoint.
    pub async fn run(
        &self,
        records: &[Record],
        restored: Vec<EnrichedRecord>,
    ) -> Result<(Vec<EnrichedRecord>, RunSummary), EnrichError> {
        let start = resume_point(records, &restored)?;
        let pending = &records[start..];
        let batches = pending.len().div_ceil(self.config.batch_size);
        let quarantine = self.worker.quarantine();

        let mut summary = RunSummary {
            total: records.len(),
            restored: start,
            batches,
            ..RunSummary::default()
        };
        if start > 0 {
            info!(restored = start, remaining = pending.len(), "resuming from checkpoint");
        }

        let mut results = restored;
        results.reserve(pending.len());

        for (i, batch) in pending.chunks(self.config.batch_size).enumerate() {
            let mut failures = 0;
            for chunk in batch.chunks(self.config.chunk_size) {
                debug!(batch = i + 1, size = chunk.len(), "dispatching chunk");
                let done = join_all(chunk.iter().map(|r| self.worker.enrich(r))).await;
                failures += done.iter().filter(|r| r.is_defaulted()).count();
                results.extend(done);
            }
            summary.processed += batch.len();
            summary.defaulted += failures;

            self.sink.save_interim(&results)?;
            self.sink.save_quarantine(&quarantine.snapshot())?;

            let processed = results.len();
            let percent = format!("{:.2}", processed as f64 / records.len() as f64 * 100.0);
            info!(
                batch = i + 1,
                batches,
                processed,
                total = records.len(),
                %percent,
                failures,
                quarantined = quarantine.len(),
                "batch complete"
            );

            if i + 1 < batches && !self.config.batch_delay.is_zero() {
                debug!(delay = ?self.config.batch_delay, "waiting before next batch");
                tokio::time::sleep(self.config.batch_delay).await;
            }
        }

        summary.merged = summary.processed - summary.defaulted;
        summary.quarantined = quarantine.len();
        self.sink.save_final(&results)?;
        info!(
            total = summary.total,
            merged = summary.merged,
            defaulted = summary.defaulted,
            quarantined = summary.quarantined,
            "enrichment complete"
        );
        Ok((results, summary))
    }
}

/// Number of leading dataset rows covered by a checkpoint.
///
/// The checkpoint's keys must be, as a multiset, exactly the keys of the first
/// `checkpoint.len()` records. Order is not compared, since rows within a
/// chunk may land in any order.
pub fn resume_point(records: &[Record], checkpoint: &[EnrichedRecord]) -> Result<usize, EnrichError> {
    let rows = checkpoint.len();
    if rows > records.len() {
        return Err(EnrichError::CheckpointTooLong {
            checkpoint: rows,
            dataset: records.len(),
        });
    }

    let mut expected: HashMap<&str, usize> = HashMap::new();
    for record in &records[..rows] {
        *expected.entry(record.key()).or_default() += 1;
    }
    for row in checkpoint {
        match expected.get_mut(row.key.as_str()) {
            Some(n) if *n > 0 => *n -= 1,
            _ => {
                return Err(EnrichError::CheckpointMismatch {
                    key: row.key.clone(),
                    rows,
                });
            }
        }
    }
    Ok(rows)
}
