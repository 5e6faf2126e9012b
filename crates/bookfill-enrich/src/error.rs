use bookfill_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid batch configuration: {0}")]
    InvalidConfig(String),
    #[error("checkpoint holds {checkpoint} rows but the dataset only {dataset}")]
    CheckpointTooLong { checkpoint: usize, dataset: usize },
    #[error("checkpoint is not a prefix of the dataset: key `{key}` has no counterpart in the first {rows} rows")]
    CheckpointMismatch { key: String, rows: usize },
}
