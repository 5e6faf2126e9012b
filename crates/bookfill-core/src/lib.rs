//! Core types for book enrichment: records, service schemas, search keys,
//! the record merger, and the upstream lookup/scrape traits.

pub mod merge;
pub mod record;
pub mod schema;
pub mod search_key;
pub mod upstream;

pub use merge::{merge, with_defaults};
pub use record::{EnrichedRecord, Fields, Outcome, Record, RecordError};
pub use schema::{ServiceSchema, aladin, kakao};
pub use search_key::SearchKey;
pub use upstream::{
    DescriptionScraper, LookupResult, MetadataLookup, ScrapeResult, normalize_description,
};
