//! Which columns identify a record and which feed the lookup.

use bookfill_core::{Record, SearchKey};

/// Key selection for one dataset.
///
/// The lookup uses the first lookup column holding a usable key (a stored ISBN
/// beats a fuzzy title match) and falls back to the identity key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentProfile {
    key_column: String,
    lookup_columns: Vec<String>,
}

impl EnrichmentProfile {
    pub fn new(key_column: impl Into<String>) -> Self {
        Self {
            key_column: key_column.into(),
            lookup_columns: Vec::new(),
        }
    }

    /// Lookup columns in priority order.
    pub fn with_lookup_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lookup_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    pub fn lookup_columns(&self) -> &[String] {
        &self.lookup_columns
    }

    pub fn search_key(&self, record: &Record) -> Option<SearchKey> {
        self.lookup_columns
            .iter()
            .filter_map(|column| record.fields().get(column))
            .find_map(SearchKey::parse)
            .or_else(|| SearchKey::parse(record.key()))
    }
}
