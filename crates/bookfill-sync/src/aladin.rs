//! Aladin TTB open API client.
//!
//! Numeric keys go to `ItemLookUp.aspx` (exact match by ISBN, ISBN-13, or
//! Aladin item id); text keys go to `ItemSearch.aspx` ranked by accuracy.

use std::time::Duration;

use async_trait::async_trait;
use bookfill_core::{Fields, LookupResult, MetadataLookup, SearchKey, ServiceSchema, aladin};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::LookupError;

pub const DEFAULT_BASE_URL: &str = "http://www.aladin.co.kr/ttb/api";
const API_VERSION: &str = "20131101";

/// How numeric keys are interpreted by `ItemLookUp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumericId {
    /// ISBN-13 for 13-digit keys, ISBN-10 otherwise.
    #[default]
    Isbn,
    /// Aladin's own item id.
    ItemId,
}

/// Aladin TTB client.
pub struct AladinClient {
    client: reqwest::Client,
    base_url: String,
    ttb_key: String,
    numeric_id: NumericId,
    details: bool,
}

#[derive(Deserialize)]
struct ItemResponse {
    #[serde(default)]
    item: Vec<Item>,
    #[serde(rename = "errorCode")]
    error_code: Option<i64>,
    #[serde(rename = "errorMessage")]
    error_message: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Item {
    title: String,
    #[serde(default)]
    original_title: String,
    #[serde(default)]
    sub_title: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    publisher: String,
    #[serde(default)]
    pub_date: String,
    #[serde(default)]
    isbn: String,
    #[serde(default)]
    toc: String,
    #[serde(default)]
    cover_small_url: String,
    #[serde(default)]
    cover_large_url: String,
    #[serde(default)]
    cover: String,
    #[serde(default)]
    isbn13: String,
    #[serde(default)]
    description: String,
    category_id: Option<i64>,
    #[serde(default)]
    category_name: String,
    #[serde(default)]
    link: String,
}

impl AladinClient {
    /// Create a client for the given TTB key. Every request is bounded by `timeout`.
    pub fn new(ttb_key: String, timeout: Duration) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            ttb_key,
            numeric_id: NumericId::default(),
            details: false,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_numeric_id(mut self, numeric_id: NumericId) -> Self {
        self.numeric_id = numeric_id;
        self
    }

    /// Also report the bibliographic detail columns (title, author, table of
    /// contents, cover sizes) used by single-book lookups.
    pub fn with_details(mut self) -> Self {
        self.details = true;
        self
    }

    fn request(&self, key: &SearchKey) -> reqwest::RequestBuilder {
        let common = [
            ("ttbkey", self.ttb_key.as_str()),
            ("output", "js"),
            ("Version", API_VERSION),
        ];
        match key {
            SearchKey::Numeric(id) => {
                let id_type = match self.numeric_id {
                    NumericId::ItemId => "ItemId",
                    NumericId::Isbn if key.is_isbn13() => "ISBN13",
                    NumericId::Isbn => "ISBN",
                };
                self.client
                    .get(format!("{}/ItemLookUp.aspx", self.base_url))
                    .query(&common)
                    .query(&[("itemIdType", id_type), ("ItemId", id.as_str())])
            }
            SearchKey::Text(query) => self
                .client
                .get(format!("{}/ItemSearch.aspx", self.base_url))
                .query(&common)
                .query(&[
                    ("Query", query.as_str()),
                    ("QueryType", "Title"),
                    ("Sort", "Accuracy"),
                    ("MaxResults", "10"),
                    ("start", "1"),
                    ("SearchTarget", "Book"),
                ]),
        }
    }

    /// Look up and normalize the top item into Aladin enrichment fields.
    pub async fn search(&self, key: &SearchKey) -> Result<Fields, LookupError> {
        debug!(key = %key, "querying aladin");
        // The TTB key rides in the query string; keep it out of error messages.
        let resp = self
            .request(key)
            .send()
            .await
            .map_err(|e| LookupError::Http(e.without_url()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LookupError::Server {
                status: status.as_u16(),
                body,
            });
        }
        let body = resp
            .text()
            .await
            .map_err(|e| LookupError::Http(e.without_url()))?;
        parse_response(&body, self.details)
    }
}

#[async_trait]
impl MetadataLookup for AladinClient {
    fn schema(&self) -> &ServiceSchema {
        &aladin::SCHEMA
    }

    async fn lookup(&self, key: &SearchKey) -> LookupResult {
        match self.search(key).await {
            Ok(fields) => LookupResult::Found(fields),
            Err(e) => {
                warn!(key = %key, error = %e, "aladin lookup failed");
                LookupResult::NotFound(e.to_string())
            }
        }
    }
}

fn parse_response(body: &str, details: bool) -> Result<Fields, LookupError> {
    let response: ItemResponse = serde_json::from_str(&sanitize_js(body))?;
    if let Some(code) = response.error_code {
        return Err(LookupError::Api {
            code,
            message: response.error_message.unwrap_or_default(),
        });
    }
    let item = response
        .item
        .into_iter()
        .next()
        .ok_or(LookupError::NoResults)?;

    let mut fields = Fields::new();
    if details {
        fields.set(aladin::TITLE, Some(item.title.clone()));
        fields.set(aladin::ORIGINAL_TITLE, Some(item.original_title));
        fields.set(aladin::SUBTITLE, Some(item.sub_title));
        fields.set(aladin::AUTHOR, Some(item.author));
        fields.set(aladin::PUBLISHER, Some(item.publisher));
        fields.set(aladin::PUB_DATE, Some(item.pub_date));
        fields.set(aladin::ISBN, Some(item.isbn));
        fields.set(aladin::TOC, Some(item.toc));
        fields.set(aladin::COVER_SMALL, Some(item.cover_small_url));
        fields.set(aladin::COVER_LARGE, Some(item.cover_large_url));
    }
    fields.set(aladin::COVER, Some(item.cover));
    fields.set(aladin::ISBN13, Some(item.isbn13));
    fields.set(aladin::DESCRIPTION, Some(item.description.replace('\n', "")));
    fields.set(aladin::CATEGORY_ID, item.category_id.map(|id| id.to_string()));
    fields.set(aladin::CATEGORY_NAME, Some(item.category_name));
    fields.set(aladin::LINK, Some(item.link));
    debug!(title = %item.title, "aladin item found");
    Ok(fields)
}

/// `output=js` bodies are JavaScript literals: they may end in `;` and escape
/// single quotes, neither of which JSON allows.
fn sanitize_js(body: &str) -> String {
    body.trim()
        .trim_end_matches(';')
        .replace("\\'", "'")
}
