//! Kakao book search client (`GET /v3/search/book`).

use std::time::Duration;

use async_trait::async_trait;
use bookfill_core::{Fields, LookupResult, MetadataLookup, SearchKey, ServiceSchema, kakao};
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::LookupError;

pub const DEFAULT_BASE_URL: &str = "https://dapi.kakao.com";

/// Kakao book search client.
///
/// ISBN keys search with `target=isbn`, anything else with `target=title`;
/// results are ranked by accuracy and only the first is kept.
pub struct KakaoClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    documents: Vec<Document>,
}

#[derive(Deserialize)]
struct Document {
    title: String,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(default)]
    translators: Vec<String>,
    #[serde(default)]
    isbn: String,
    #[serde(default)]
    publisher: String,
    #[serde(default)]
    datetime: String,
    #[serde(default)]
    thumbnail: String,
    #[serde(default)]
    url: String,
}

impl KakaoClient {
    /// Create a client authenticating with the given REST API key.
    ///
    /// Every request is bounded by `timeout`.
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
        })
    }

    /// Point the client at another host (no trailing slash needed).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn request(&self, key: &SearchKey) -> reqwest::RequestBuilder {
        let target = if key.is_numeric() { "isbn" } else { "title" };
        self.client
            .get(format!("{}/v3/search/book", self.base_url))
            .header("Authorization", format!("KakaoAK {}", self.api_key))
            .query(&[
                ("query", key.as_str()),
                ("sort", "accuracy"),
                ("page", "1"),
                ("size", "10"),
                ("target", target),
            ])
    }

    /// Search and normalize the top result into Kakao enrichment fields.
    pub async fn search(&self, key: &SearchKey) -> Result<Fields, LookupError> {
        debug!(key = %key, "searching kakao");
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
        let body = resp.text().await?;
        parse_response(&body)
    }
}

#[async_trait]
impl MetadataLookup for KakaoClient {
    fn schema(&self) -> &ServiceSchema {
        &kakao::SCHEMA
    }

    async fn lookup(&self, key: &SearchKey) -> LookupResult {
        match self.search(key).await {
            Ok(fields) => LookupResult::Found(fields),
            Err(e) => {
                warn!(key = %key, error = %e, "kakao lookup failed");
                LookupResult::NotFound(e.to_string())
            }
        }
    }
}

/// Normalize a search response body into enrichment fields.
fn parse_response(body: &str) -> Result<Fields, LookupError> {
    let response: SearchResponse = serde_json::from_str(body)?;
    let doc = response
        .documents
        .into_iter()
        .next()
        .ok_or(LookupError::NoResults)?;

    let mut fields = Fields::new();
    fields.set(kakao::TITLE, Some(doc.title));
    fields.set(kakao::AUTHORS, Some(doc.authors.join(", ")));
    fields.set(kakao::TRANSLATORS, Some(doc.translators.join(", ")));
    fields.set(kakao::ISBN, pick_isbn13(&doc.isbn));
    fields.set(kakao::PUBLISHER, Some(doc.publisher));
    fields.set(kakao::PUBLISHED, format_date(&doc.datetime)?);
    fields.set(kakao::THUMBNAIL, Some(doc.thumbnail));
    fields.set(kakao::URL, Some(doc.url));
    Ok(fields)
}

/// Kakao's `isbn` holds "ISBN10 ISBN13" (either may be missing); keep the 13-digit one.
fn pick_isbn13(raw: &str) -> Option<String> {
    let mut tokens = raw.split_whitespace();
    let first = tokens.next()?;
    std::iter::once(first)
        .chain(tokens)
        .find(|t| t.len() == 13)
        .or(Some(first))
        .map(str::to_string)
}

/// `2014-11-17T00:00:00.000+09:00` → `2014-11-17`.
fn format_date(raw: &str) -> Result<Option<String>, LookupError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt.format("%Y-%m-%d").to_string()));
    }
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map(|d| Some(d.format("%Y-%m-%d").to_string()))
        .map_err(|e| LookupError::Malformed {
            field: "datetime",
            detail: format!("{raw:?}: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const RESPONSE: &str = r#"{
        "documents": [
            {
                "authors": ["헤르만 헤세"],
                "contents": "...",
                "datetime": "2000-12-20T00:00:00.000+09:00",
                "isbn": "8937460440 9788937460449",
                "price": 8000,
                "publisher": "민음사",
                "sale_price": 7200,
                "status": "정상판매",
                "thumbnail": "https://search1.kakaocdn.net/thumb/a.jpg",
                "title": "데미안",
                "translators": ["전영애"],
                "url": "https://search.daum.net/search?w=bookpage&bookId=1"
            },
            {
                "authors": [],
                "datetime": "",
                "isbn": "",
                "publisher": "",
                "thumbnail": "",
                "title": "second",
                "translators": [],
                "url": ""
            }
        ],
        "meta": {"is_end": false, "pageable_count": 2, "total_count": 2}
    }"#;

    fn client() -> KakaoClient {
        KakaoClient::new("secret".into(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn top_document_normalized() {
        let fields = parse_response(RESPONSE).unwrap();
        assert_eq!(fields.get(kakao::TITLE), Some("데미안"));
        assert_eq!(fields.get(kakao::AUTHORS), Some("헤르만 헤세"));
        assert_eq!(fields.get(kakao::TRANSLATORS), Some("전영애"));
        assert_eq!(fields.get(kakao::ISBN), Some("9788937460449"));
        assert_eq!(fields.get(kakao::PUBLISHER), Some("민음사"));
        assert_eq!(fields.get(kakao::PUBLISHED), Some("2000-12-20"));
        assert_eq!(
            fields.get(kakao::URL),
            Some("https://search.daum.net/search?w=bookpage&bookId=1")
        );
        // The scraped description is not the client's job.
        assert!(!fields.contains(kakao::DESCRIPTION));
    }

    #[test]
    fn empty_lists_and_strings_become_null() {
        let body = r#"{"documents":[{"title":"t","authors":["a","b"],"translators":[],"isbn":"","datetime":"","url":""}]}"#;
        let fields = parse_response(body).unwrap();
        assert_eq!(fields.get(kakao::AUTHORS), Some("a, b"));
        assert_eq!(fields.get(kakao::TRANSLATORS), None);
        assert_eq!(fields.get(kakao::ISBN), None);
        assert_eq!(fields.get(kakao::PUBLISHED), None);
        assert_eq!(fields.get(kakao::URL), None);
    }

    #[test]
    fn zero_documents_is_no_results() {
        let err = parse_response(r#"{"documents":[],"meta":{}}"#).unwrap_err();
        assert!(matches!(err, LookupError::NoResults));
    }

    #[test]
    fn malformed_json_is_error() {
        let err = parse_response("<html>gateway timeout</html>").unwrap_err();
        assert!(matches!(err, LookupError::Json(_)));
    }

    #[test]
    fn missing_title_is_error() {
        let err = parse_response(r#"{"documents":[{"url":"x"}]}"#).unwrap_err();
        assert!(matches!(err, LookupError::Json(_)));
    }

    #[test]
    fn isbn_selection() {
        assert_eq!(
            pick_isbn13("8937460440 9788937460449").as_deref(),
            Some("9788937460449")
        );
        assert_eq!(
            pick_isbn13(" 9788937460449").as_deref(),
            Some("9788937460449")
        );
        assert_eq!(pick_isbn13("8937460440").as_deref(), Some("8937460440"));
        assert_eq!(pick_isbn13("  "), None);
    }

    #[test]
    fn date_formats() {
        assert_eq!(
            format_date("2014-11-17T00:00:00.000+09:00").unwrap().as_deref(),
            Some("2014-11-17")
        );
        assert_eq!(
            format_date("2014-11-17").unwrap().as_deref(),
            Some("2014-11-17")
        );
        assert!(format_date("not a date").is_err());
    }

    #[test]
    fn isbn_key_uses_isbn_target() {
        let key = SearchKey::parse("9788937460449").unwrap();
        let req = client().request(&key).build().unwrap();

        assert_eq!(req.url().path(), "/v3/search/book");
        let params: HashMap<_, _> = req.url().query_pairs().into_owned().collect();
        assert_eq!(params["query"], "9788937460449");
        assert_eq!(params["target"], "isbn");
        assert_eq!(params["sort"], "accuracy");
        assert_eq!(params["page"], "1");
        assert_eq!(params["size"], "10");
        assert_eq!(req.headers()["Authorization"], "KakaoAK secret");
    }

    #[test]
    fn title_key_uses_title_target() {
        let key = SearchKey::parse("데미안").unwrap();
        let req = client().request(&key).build().unwrap();

        let params: HashMap<_, _> = req.url().query_pairs().into_owned().collect();
        assert_eq!(params["query"], "데미안");
        assert_eq!(params["target"], "title");
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = client().with_base_url("http://localhost:4000/");
        assert_eq!(client.base_url, "http://localhost:4000");
    }

    #[tokio::test]
    async fn transport_error_is_not_found() {
        // Nothing listens on the discard port.
        let client = client().with_base_url("http://127.0.0.1:9");
        let key = SearchKey::parse("데미안").unwrap();

        match client.lookup(&key).await {
            LookupResult::NotFound(reason) => assert!(reason.contains("HTTP request failed")),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
