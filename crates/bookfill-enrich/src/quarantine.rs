//! The set of record keys awaiting manual follow-up.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Deduplicated, insertion-ordered quarantine set.
///
/// Shared by every worker of a chunk; all mutation goes through one mutex.
#[derive(Debug, Default)]
pub struct Quarantine {
    inner: Mutex<Entries>,
}

#[derive(Debug, Default)]
struct Entries {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl Quarantine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a previously persisted list.
    pub fn from_keys(keys: impl IntoIterator<Item = String>) -> Self {
        let quarantine = Self::new();
        for key in keys {
            quarantine.register(key);
        }
        quarantine
    }

    /// Add `key`; returns `false` when it was already present.
    pub fn register(&self, key: impl Into<String>) -> bool {
        let key = key.into();
        let mut entries = self.lock();
        if !entries.seen.insert(key.clone()) {
            return false;
        }
        entries.order.push(key);
        true
    }

    /// Drop `key` after a successful re-resolution.
    pub fn remove(&self, key: &str) -> bool {
        let mut entries = self.lock();
        if !entries.seen.remove(key) {
            return false;
        }
        entries.order.retain(|k| k != key);
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().seen.contains(key)
    }

    /// Current entries in first-registered order.
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().order.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panicking worker cannot leave the set half-updated, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
