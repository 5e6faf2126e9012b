//! Per-service wiring: clients, schemas, scrape profiles, batch defaults.

use std::time::Duration;

use anyhow::{Context, Result};
use bookfill_browser::{ChromiumScraper, ScrapeProfile};
use bookfill_core::{MetadataLookup, ServiceSchema, aladin, kakao};
use bookfill_sync::{AladinClient, KakaoClient, NumericId};

use crate::Config;

/// Upstream metadata service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Service {
    /// Kakao book search, scraping Daum detail pages.
    Kakao,
    /// Aladin TTB API, scraping Aladin product pages.
    Aladin,
}

/// Batch pacing a service tolerates without throttling.
pub struct BatchDefaults {
    pub batch_size: usize,
    pub chunk_size: usize,
    pub batch_delay: Duration,
}

impl Service {
    pub fn name(self) -> &'static str {
        self.schema().service
    }

    pub fn schema(self) -> &'static ServiceSchema {
        match self {
            Self::Kakao => &kakao::SCHEMA,
            Self::Aladin => &aladin::SCHEMA,
        }
    }

    pub fn batch_defaults(self) -> BatchDefaults {
        match self {
            Self::Kakao => BatchDefaults {
                batch_size: 100,
                chunk_size: 10,
                batch_delay: Duration::from_secs(2),
            },
            Self::Aladin => BatchDefaults {
                batch_size: 30,
                chunk_size: 3,
                batch_delay: Duration::from_secs(10),
            },
        }
    }

    /// Columns tried before the identity key, most precise first.
    pub fn default_lookup_columns(self) -> &'static [&'static str] {
        match self {
            Self::Kakao => &["ISBN"],
            // Datasets reaching Aladin usually went through Kakao first.
            Self::Aladin => &[kakao::ISBN, "ISBN"],
        }
    }

    pub fn scrape_profile(self, config: &Config) -> ScrapeProfile {
        let profile = match self {
            Self::Kakao => ScrapeProfile::kakao(),
            Self::Aladin => ScrapeProfile::aladin(),
        };
        match config.scrape_timeout {
            Some(timeout) => profile.with_timeout(timeout),
            None => profile,
        }
    }

    /// Build the client used for batch enrichment.
    pub fn lookup_client(self, config: &Config) -> Result<Box<dyn MetadataLookup>> {
        match self {
            Self::Kakao => Ok(Box::new(kakao_client(config)?)),
            Self::Aladin => Ok(Box::new(aladin_client(config)?)),
        }
    }

    /// Build the client for a single-book lookup, reporting detail columns.
    /// `item_id` makes Aladin treat numeric keys as item ids.
    pub fn finder_client(self, config: &Config, item_id: bool) -> Result<Box<dyn MetadataLookup>> {
        match self {
            Self::Kakao => Ok(Box::new(kakao_client(config)?)),
            Self::Aladin => {
                let numeric_id = if item_id { NumericId::ItemId } else { NumericId::Isbn };
                let client = aladin_client(config)?
                    .with_numeric_id(numeric_id)
                    .with_details();
                Ok(Box::new(client))
            }
        }
    }

    /// Launch the browser unless scraping is disabled.
    pub async fn scraper(self, config: &Config) -> Result<Option<ChromiumScraper>> {
        if config.no_scrape {
            return Ok(None);
        }
        let scraper = ChromiumScraper::launch(self.scrape_profile(config))
            .await
            .context("launching headless Chromium (use --no-scrape to skip descriptions)")?;
        Ok(Some(scraper))
    }
}

fn kakao_client(config: &Config) -> Result<KakaoClient> {
    let key = config
        .kakao_api_key
        .clone()
        .context("Kakao API key is required. Set KAKAO_API_KEY or use --kakao-api-key")?;
    Ok(KakaoClient::new(key, config.lookup_timeout)?)
}

fn aladin_client(config: &Config) -> Result<AladinClient> {
    let key = config
        .aladin_api_key
        .clone()
        .context("Aladin TTB key is required. Set ALADIN_API_KEY or use --aladin-api-key")?;
    Ok(AladinClient::new(key, config.lookup_timeout)?)
}

/// Close the browser, logging rather than failing on error.
pub async fn shutdown(scraper: Option<ChromiumScraper>) {
    if let Some(scraper) = scraper
        && let Err(e) = scraper.shutdown().await
    {
        tracing::warn!(error = %e, "browser did not shut down cleanly");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_defaults_per_service() {
        let kakao = Service::Kakao.batch_defaults();
        assert_eq!((kakao.batch_size, kakao.chunk_size), (100, 10));
        assert_eq!(kakao.batch_delay, Duration::from_secs(2));

        let aladin = Service::Aladin.batch_defaults();
        assert_eq!((aladin.batch_size, aladin.chunk_size), (30, 3));
        assert_eq!(aladin.batch_delay, Duration::from_secs(10));
    }

    #[test]
    fn missing_api_key_is_reported() {
        let config = Config::default();
        let err = Service::Kakao.lookup_client(&config).err().unwrap();
        assert!(err.to_string().contains("KAKAO_API_KEY"));
        let err = Service::Aladin.finder_client(&config, true).err().unwrap();
        assert!(err.to_string().contains("ALADIN_API_KEY"));
    }

    #[test]
    fn scrape_timeout_override() {
        let config = Config {
            scrape_timeout: Some(Duration::from_secs(1)),
            ..Config::default()
        };
        assert_eq!(
            Service::Aladin.scrape_profile(&config).timeout,
            Duration::from_secs(1)
        );
        assert_eq!(
            Service::Kakao.scrape_profile(&Config::default()).timeout,
            Duration::from_secs(3)
        );
    }
}
