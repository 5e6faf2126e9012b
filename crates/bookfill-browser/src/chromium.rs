//! Headless Chromium scraper over the DevTools protocol.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bookfill_core::{DescriptionScraper, ScrapeResult};
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::{ScrapeError, ScrapeProfile};

const BLANK_PAGE: &str = "about:blank";
const POLL_INTERVAL: Duration = Duration::from_millis(250);
const SCROLL_TO_MIDDLE: &str = "window.scrollTo(0, document.body.scrollHeight / 2)";

/// One headless browser shared by every scrape of a run.
///
/// Each `scrape` opens its own page and always closes it.
pub struct ChromiumScraper {
    browser: Browser,
    handler: JoinHandle<()>,
    profile: ScrapeProfile,
}

impl ChromiumScraper {
    /// Launch a headless browser. Fails when no Chrome/Chromium is installed.
    pub async fn launch(profile: ScrapeProfile) -> Result<Self, ScrapeError> {
        let config = BrowserConfig::builder()
            .build()
            .map_err(ScrapeError::Launch)?;
        let (browser, mut handler) = Browser::launch(config).await?;
        let handler = tokio::spawn(async move { drive_handler(&mut handler).await });
        debug!(profile = profile.name, "browser launched");
        Ok(Self {
            browser,
            handler,
            profile,
        })
    }

    pub fn profile(&self) -> &ScrapeProfile {
        &self.profile
    }

    /// Close the browser and wait for its process to exit.
    pub async fn shutdown(mut self) -> Result<(), ScrapeError> {
        self.browser.close().await?;
        self.browser.wait().await?;
        self.handler.abort();
        debug!("browser closed");
        Ok(())
    }

    /// Open a blank page under a guard first, so the page is released even
    /// when navigation fails. Navigation and the region poll share one timeout.
    async fn extract_from(&self, url: &str) -> Result<String, ScrapeError> {
        let page = self.browser.new_page(BLANK_PAGE).await?;
        let guard = PageGuard::new(page.clone(), url);
        let result = bounded(
            self.profile.timeout,
            self.profile.region,
            self.load_description(&page, url),
        )
        .await;
        guard.close().await;
        result
    }

    async fn load_description(&self, page: &Page, url: &str) -> Result<String, ScrapeError> {
        let profile = &self.profile;
        page.goto(url).await?;
        if profile.scroll_to_middle {
            page.evaluate(SCROLL_TO_MIDDLE).await?;
        }
        loop {
            if let Ok(region) = page.find_element(profile.region).await
                && let Some(html) = region.inner_html().await?
                && let Some(text) = profile.extract(&html)?
            {
                return Ok(text);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

/// Poll the CDP handler until the connection closes. Errors are per message
/// (e.g. an event this protocol version does not know) and do not end it.
async fn drive_handler<S, E>(events: &mut S)
where
    S: Stream<Item = Result<(), E>> + Unpin,
    E: fmt::Display,
{
    while let Some(event) = events.next().await {
        if let Err(e) = event {
            debug!(error = %e, "browser handler error");
        }
    }
    debug!("browser handler stopped");
}

async fn bounded<T>(
    timeout: Duration,
    selector: &'static str,
    work: impl Future<Output = Result<T, ScrapeError>>,
) -> Result<T, ScrapeError> {
    tokio::time::timeout(timeout, work)
        .await
        .unwrap_or_else(|_| Err(ScrapeError::Timeout { selector, timeout }))
}

#[async_trait]
impl DescriptionScraper for ChromiumScraper {
    async fn scrape(&self, url: &str) -> ScrapeResult {
        match self.extract_from(url).await {
            Ok(text) => ScrapeResult::Extracted(text),
            Err(e) => {
                warn!(url, error = %e, "description unavailable");
                ScrapeResult::Unavailable(e.to_string())
            }
        }
    }
}

/// Owns a page for one scrape. Dropping it without `close` (timeout,
/// cancellation, panic) closes the page on a background task.
struct PageGuard {
    page: Option<Page>,
    url: String,
    runtime: tokio::runtime::Handle,
}

impl PageGuard {
    fn new(page: Page, url: &str) -> Self {
        Self {
            page: Some(page),
            url: url.to_string(),
            runtime: tokio::runtime::Handle::current(),
        }
    }

    async fn close(mut self) {
        if let Some(page) = self.page.take() {
            match page.close().await {
                Ok(()) => trace!(url = %self.url, "page closed"),
                Err(e) => warn!(url = %self.url, error = %e, "failed to close page"),
            }
        }
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            let url = std::mem::take(&mut self.url);
            self.runtime.spawn(async move {
                if let Err(e) = page.close().await {
                    warn!(url = %url, error = %e, "page cleanup on drop failed");
                }
            });
        }
    }
}
