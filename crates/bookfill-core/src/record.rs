//! Dataset rows and the enriched rows produced from them.

use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("row has no value in key column `{0}`")]
    MissingKey(String),
}

/// An ordered set of named, nullable string fields.
///
/// Column order is significant: it is the order written back to CSV.
/// Empty strings are stored as null, matching how empty CSV cells load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields(Vec<(String, Option<String>)>);

impl Fields {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Value of `name`, or `None` when the column is absent or null.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(n, _)| n == name)
    }

    /// Set `name` in place, or append it as a new trailing column.
    pub fn set(&mut self, name: impl Into<String>, value: Option<String>) {
        let name = name.into();
        let value = value.filter(|v| !v.is_empty());
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (name, value) in iter {
            fields.set(name, value);
        }
        fields
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// One row of the dataset being enriched.
///
/// The identity key is the value of the key column (e.g. `자료명`) and is
/// fixed at construction; enrichment never rewrites it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    key_column: String,
    key: String,
    fields: Fields,
}

impl Record {
    pub fn new(key_column: &str, fields: Fields) -> Result<Self, RecordError> {
        let key = fields
            .get(key_column)
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| RecordError::MissingKey(key_column.to_string()))?
            .to_string();
        Ok(Self {
            key_column: key_column.to_string(),
            key,
            fields,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }
}

/// How an [`EnrichedRecord`] came to be.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum Outcome {
    /// Upstream metadata was merged (the description may still be null).
    Merged,
    /// Enrichment failed and the default shape was substituted.
    Defaulted(String),
    /// Loaded back from a previous checkpoint.
    Restored,
}

/// A record merged with real or default enrichment fields.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct EnrichedRecord {
    pub key: String,
    pub fields: Fields,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl EnrichedRecord {
    pub fn is_defaulted(&self) -> bool {
        matches!(self.outcome, Outcome::Defaulted(_))
    }
}
