use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table file not found: {0}")]
    TableNotFound(PathBuf),

    #[error("column `{column}` not found in {path}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("{path}, row {row}: {source}")]
    Record {
        path: PathBuf,
        row: usize,
        source: bookfill_core::RecordError,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        source: tempfile::PersistError,
    },

    #[error("{0}")]
    Other(String),
}
