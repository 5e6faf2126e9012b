//! Per-record enrichment: lookup, scrape, merge.
//!
//! A record moves `Start → LookedUp → {Merged | Defaulted} → Done`. Every path
//! ends in exactly one [`EnrichedRecord`]; failures are absorbed into the
//! default shape and the quarantine set, never returned.

use bookfill_core::{
    DescriptionScraper, EnrichedRecord, Fields, LookupResult, MetadataLookup, Outcome, Record,
    ScrapeResult, SearchKey, merge, with_defaults,
};
use tracing::{debug, warn};

use crate::{EnrichmentProfile, Quarantine};

/// Found metadata that cannot be merged (e.g. no detail URL to scrape).
#[derive(Debug)]
struct MergeFailure(String);

pub struct Worker<'a> {
    lookup: &'a dyn MetadataLookup,
    scraper: Option<&'a dyn DescriptionScraper>,
    profile: &'a EnrichmentProfile,
    quarantine: &'a Quarantine,
}

impl<'a> Worker<'a> {
    pub fn new(
        lookup: &'a dyn MetadataLookup,
        profile: &'a EnrichmentProfile,
        quarantine: &'a Quarantine,
    ) -> Self {
        Self {
            lookup,
            scraper: None,
            profile,
            quarantine,
        }
    }

    /// Scrape a description from each found record's detail page.
    pub fn with_scraper(mut self, scraper: &'a dyn DescriptionScraper) -> Self {
        self.scraper = Some(scraper);
        self
    }

    pub fn quarantine(&self) -> &'a Quarantine {
        self.quarantine
    }

    pub fn profile(&self) -> &'a EnrichmentProfile {
        self.profile
    }

    /// Enrich `record` using the key chosen by the profile.
    pub async fn enrich(&self, record: &Record) -> EnrichedRecord {
        match self.profile.search_key(record) {
            Some(key) => self.enrich_with_key(record, &key).await,
            None => self.defaulted(record, "no usable search key".into()),
        }
    }

    /// Enrich `record` looking it up by an explicit key.
    pub async fn enrich_with_key(&self, record: &Record, key: &SearchKey) -> EnrichedRecord {
        let upstream = match self.lookup.lookup(key).await {
            LookupResult::Found(fields) => fields,
            LookupResult::NotFound(reason) => return self.defaulted(record, reason),
        };
        match self.merge_found(record, upstream).await {
            Ok(fields) => EnrichedRecord {
                key: record.key().to_string(),
                fields,
                outcome: Outcome::Merged,
            },
            Err(MergeFailure(reason)) => self.defaulted(record, reason),
        }
    }

    async fn merge_found(
        &self,
        record: &Record,
        mut upstream: Fields,
    ) -> Result<Fields, MergeFailure> {
        let schema = self.lookup.schema();
        if let Some(scraper) = self.scraper {
            let url = upstream
                .get(schema.url_column)
                .ok_or_else(|| MergeFailure(format!("no detail URL in `{}`", schema.url_column)))?
                .to_string();
            let description = match scraper.scrape(&url).await {
                ScrapeResult::Extracted(text) => Some(text),
                ScrapeResult::Unavailable(reason) => {
                    debug!(key = record.key(), %reason, "no description");
                    None
                }
            };
            upstream.set(schema.description_column, description);
        }
        Ok(merge(record, &upstream, schema))
    }

    fn defaulted(&self, record: &Record, reason: String) -> EnrichedRecord {
        warn!(key = record.key(), %reason, "enrichment failed, using defaults");
        self.quarantine.register(record.key());
        EnrichedRecord {
            key: record.key().to_string(),
            fields: with_defaults(record, self.lookup.schema()),
            outcome: Outcome::Defaulted(reason),
        }
    }
}
