//! Where the scheduler and the resume controller persist their progress.

use bookfill_core::EnrichedRecord;
use bookfill_store::{CheckpointStore, StoreError};

/// Full-overwrite persistence of accumulated output and the quarantine list.
pub trait CheckpointSink {
    fn save_interim(&self, records: &[EnrichedRecord]) -> Result<(), StoreError>;
    fn save_final(&self, records: &[EnrichedRecord]) -> Result<(), StoreError>;
    fn save_quarantine(&self, keys: &[String]) -> Result<(), StoreError>;
}

impl CheckpointSink for CheckpointStore {
    fn save_interim(&self, records: &[EnrichedRecord]) -> Result<(), StoreError> {
        CheckpointStore::save_interim(self, records)
    }

    fn save_final(&self, records: &[EnrichedRecord]) -> Result<(), StoreError> {
        CheckpointStore::save_final(self, records)
    }

    fn save_quarantine(&self, keys: &[String]) -> Result<(), StoreError> {
        CheckpointStore::save_quarantine(self, keys)
    }
}
