//! In-memory lookup, scraper and checkpoint sink for pipeline tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bookfill_core::{
    DescriptionScraper, EnrichedRecord, Fields, LookupResult, MetadataLookup, Record,
    ScrapeResult, SearchKey, ServiceSchema, kakao,
};
use bookfill_store::StoreError;

use crate::CheckpointSink;

pub fn record(key: &str) -> Record {
    let fields: Fields = [("자료명", Some(key.to_string())), ("ISBN", None)]
        .into_iter()
        .collect();
    Record::new("자료명", fields).unwrap()
}

fn detail_url(key: &str) -> String {
    format!("https://book.example/{key}")
}

#[derive(Default)]
pub struct FakeLookup {
    books: HashMap<String, Fields>,
    queries: Mutex<Vec<String>>,
}

impl FakeLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn found(mut self, key: &str) -> Self {
        let mut fields = Fields::new();
        fields.set(kakao::TITLE, Some(format!("{key} 제목")));
        fields.set(kakao::URL, Some(detail_url(key)));
        self.books.insert(key.to_string(), fields);
        self
    }

    pub fn found_without_url(mut self, key: &str) -> Self {
        let mut fields = Fields::new();
        fields.set(kakao::TITLE, Some(format!("{key} 제목")));
        self.books.insert(key.to_string(), fields);
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataLookup for FakeLookup {
    fn schema(&self) -> &ServiceSchema {
        &kakao::SCHEMA
    }

    async fn lookup(&self, key: &SearchKey) -> LookupResult {
        self.queries.lock().unwrap().push(key.as_str().to_string());
        tokio::task::yield_now().await;
        match self.books.get(key.as_str()) {
            Some(fields) => LookupResult::Found(fields.clone()),
            None => LookupResult::NotFound("no search results".into()),
        }
    }
}

#[derive(Default)]
pub struct FakeScraper {
    pages: HashMap<String, String>,
    calls: Mutex<usize>,
}

impl FakeScraper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, key: &str, text: &str) -> Self {
        self.pages.insert(detail_url(key), text.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl DescriptionScraper for FakeScraper {
    async fn scrape(&self, url: &str) -> ScrapeResult {
        *self.calls.lock().unwrap() += 1;
        tokio::task::yield_now().await;
        match self.pages.get(url) {
            Some(text) => ScrapeResult::from_raw(text),
            None => ScrapeResult::Unavailable("content region `.desc` not ready after 3s".into()),
        }
    }
}

/// Records every persist as the list of keys written.
#[derive(Default)]
pub struct RecordingSink {
    pub interim: Mutex<Vec<Vec<String>>>,
    pub finals: Mutex<Vec<Vec<String>>>,
    pub quarantine: Mutex<Vec<Vec<String>>>,
}

fn keys(records: &[EnrichedRecord]) -> Vec<String> {
    records.iter().map(|r| r.key.clone()).collect()
}

impl RecordingSink {
    pub fn interim_writes(&self) -> Vec<Vec<String>> {
        self.interim.lock().unwrap().clone()
    }

    pub fn final_writes(&self) -> Vec<Vec<String>> {
        self.finals.lock().unwrap().clone()
    }

    pub fn quarantine_writes(&self) -> Vec<Vec<String>> {
        self.quarantine.lock().unwrap().clone()
    }
}

impl CheckpointSink for RecordingSink {
    fn save_interim(&self, records: &[EnrichedRecord]) -> Result<(), StoreError> {
        self.interim.lock().unwrap().push(keys(records));
        Ok(())
    }

    fn save_final(&self, records: &[EnrichedRecord]) -> Result<(), StoreError> {
        self.finals.lock().unwrap().push(keys(records));
        Ok(())
    }

    fn save_quarantine(&self, keys: &[String]) -> Result<(), StoreError> {
        self.quarantine.lock().unwrap().push(keys.to_vec());
        Ok(())
    }
}
