//! Batch enrichment pipeline.
//!
//! A [`Worker`] enriches one record (lookup, scrape, merge); the [`Scheduler`]
//! drives workers over a dataset in checkpointed batches; the
//! [`ResumeController`] re-runs the quarantined subset with corrected keys.

mod checkpoint;
mod error;
mod profile;
mod quarantine;
pub mod resume;
pub mod scheduler;
mod worker;

#[cfg(test)]
mod testing;

pub use checkpoint::CheckpointSink;
pub use error::EnrichError;
pub use profile::EnrichmentProfile;
pub use quarantine::Quarantine;
pub use resume::{CorrectionTable, KeyResolver, Prompt, Resolution, ResumeController, ResumeSummary};
pub use scheduler::{BatchConfig, RunSummary, Scheduler, resume_point};
pub use worker::Worker;
