//! Storage layer: quoted-CSV tables, interim/final checkpoints, quarantine lists.

mod error;
pub use error::StoreError;

pub mod checkpoint;
pub mod table;

pub use checkpoint::{
    CheckpointPaths, CheckpointStore, dedup_keys, load_output, read_quarantine,
};
pub use table::{read_records, read_table, write_keys, write_table};
