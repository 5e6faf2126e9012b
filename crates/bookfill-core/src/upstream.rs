//! Interfaces to the two upstream capabilities: metadata lookup and description scraping.
//!
//! Both report failure as a value. Neither ever aborts the record being enriched.

use async_trait::async_trait;

use crate::record::Fields;
use crate::schema::ServiceSchema;
use crate::search_key::SearchKey;

/// Outcome of one metadata lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResult {
    /// The top-ranked upstream result, as enrichment fields of the service schema.
    Found(Fields),
    /// No usable result; the reason carries the underlying cause.
    NotFound(String),
}

/// Outcome of one description scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeResult {
    /// Whitespace-normalized description text.
    Extracted(String),
    Unavailable(String),
}

impl ScrapeResult {
    /// Wrap raw extracted text, normalizing it first.
    ///
    /// Text that is empty after normalization is reported as unavailable.
    pub fn from_raw(raw: &str) -> Self {
        let text = normalize_description(raw);
        if text.is_empty() {
            Self::Unavailable("content region is empty".into())
        } else {
            Self::Extracted(text)
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Extracted(text) => Some(text),
            Self::Unavailable(_) => None,
        }
    }
}

/// Strip embedded line breaks and surrounding whitespace.
pub fn normalize_description(raw: &str) -> String {
    raw.replace(['\r', '\n'], "").trim().to_string()
}

/// A structured metadata service queried by search key.
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    /// Columns this service produces; also the default shape on failure.
    fn schema(&self) -> &ServiceSchema;

    /// Look up `key`, returning the single best match. Makes one outbound call
    /// and never retries.
    async fn lookup(&self, key: &SearchKey) -> LookupResult;
}

/// A page scraper returning the description text found at a URL.
#[async_trait]
pub trait DescriptionScraper: Send + Sync {
    /// Extract the description at `url`, giving up after a bounded wait.
    async fn scrape(&self, url: &str) -> ScrapeResult;
}
