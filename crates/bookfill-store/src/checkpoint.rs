//! Checkpoint and quarantine persistence.
//!
//! Each save replaces its destination file wholesale. A run killed between
//! batches leaves the last completed batch's output and quarantine on disk,
//! which is what a resumed run starts from.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use bookfill_core::{EnrichedRecord, Outcome};
use tracing::info;

use crate::StoreError;
use crate::table::{read_table, write_keys, write_table};

/// Fixed destinations for one enrichment run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointPaths {
    /// Accumulated output, rewritten after every batch.
    pub interim: PathBuf,
    /// Complete output, written once at the end of the run.
    pub final_output: PathBuf,
    /// Deduplicated keys of records needing manual follow-up.
    pub quarantine: PathBuf,
}

impl CheckpointPaths {
    /// Default layout under `dir`, named after the upstream service.
    pub fn in_dir(dir: &Path, service: &str) -> Self {
        Self {
            interim: dir
                .join("interim")
                .join(format!("add_{service}_info_interim.csv")),
            final_output: dir
                .join(format!("{service}_info"))
                .join(format!("add_{service}_info.csv")),
            quarantine: dir
                .join("errors")
                .join(format!("error_books_{service}.csv")),
        }
    }
}

/// Writes checkpoints and quarantine lists to their fixed destinations.
pub struct CheckpointStore {
    paths: CheckpointPaths,
    key_column: String,
}

impl CheckpointStore {
    pub fn new(paths: CheckpointPaths, key_column: &str) -> Self {
        Self {
            paths,
            key_column: key_column.to_string(),
        }
    }

    pub fn paths(&self) -> &CheckpointPaths {
        &self.paths
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// Overwrite the interim checkpoint with everything accumulated so far.
    pub fn save_interim(&self, records: &[EnrichedRecord]) -> Result<(), StoreError> {
        let rows = write_table(&self.paths.interim, records.iter().map(|r| &r.fields))?;
        info!(rows, path = %self.paths.interim.display(), "saved interim checkpoint");
        Ok(())
    }

    /// Write the complete output of the run.
    pub fn save_final(&self, records: &[EnrichedRecord]) -> Result<(), StoreError> {
        let rows = write_table(&self.paths.final_output, records.iter().map(|r| &r.fields))?;
        info!(rows, path = %self.paths.final_output.display(), "saved final output");
        Ok(())
    }

    /// Overwrite the quarantine list, deduplicated by key.
    pub fn save_quarantine(&self, keys: &[String]) -> Result<(), StoreError> {
        let keys = dedup_keys(keys.iter().cloned());
        write_keys(&self.paths.quarantine, &self.key_column, &keys)?;
        info!(entries = keys.len(), path = %self.paths.quarantine.display(), "saved quarantine");
        Ok(())
    }

    /// Load the interim checkpoint of a previous run, if there is one.
    pub fn load_interim(&self) -> Result<Option<Vec<EnrichedRecord>>, StoreError> {
        if !self.paths.interim.exists() {
            return Ok(None);
        }
        load_output(&self.paths.interim, &self.key_column).map(Some)
    }

    /// Load the quarantine list of a previous run; a missing file is an empty list.
    pub fn load_quarantine(&self) -> Result<Vec<String>, StoreError> {
        if !self.paths.quarantine.exists() {
            return Ok(Vec::new());
        }
        read_quarantine(&self.paths.quarantine, &self.key_column)
    }
}

/// Read an output table back as enriched records.
pub fn load_output(path: &Path, key_column: &str) -> Result<Vec<EnrichedRecord>, StoreError> {
    read_table(path)?
        .into_iter()
        .enumerate()
        .map(|(i, fields)| {
            let key = fields
                .get(key_column)
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .ok_or_else(|| StoreError::Record {
                    path: path.to_path_buf(),
                    row: i + 1,
                    source: bookfill_core::RecordError::MissingKey(key_column.to_string()),
                })?
                .to_string();
            Ok(EnrichedRecord {
                key,
                fields,
                outcome: Outcome::Restored,
            })
        })
        .collect()
}

/// Read a quarantine list. Uses `key_column` when present, else the first column.
pub fn read_quarantine(path: &Path, key_column: &str) -> Result<Vec<String>, StoreError> {
    let rows = read_table(path)?;
    let keys = rows.iter().filter_map(|row| {
        let value = if row.contains(key_column) {
            row.get(key_column)
        } else {
            row.iter().next().and_then(|(_, v)| v)
        };
        value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    });
    Ok(dedup_keys(keys))
}

/// Drop repeated keys, keeping first-seen order.
pub fn dedup_keys(keys: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.into_iter()
        .filter(|k| seen.insert(k.clone()))
        .collect()
}
