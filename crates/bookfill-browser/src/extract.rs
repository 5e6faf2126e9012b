//! Page profiles: where the description lives and how to pull it out.
//!
//! Extraction works on the content region's inner HTML, so it runs the same
//! against a live page and a saved fixture.

use std::time::Duration;

use bookfill_core::normalize_description;
use scraper::{ElementRef, Html, Selector};

use crate::ScrapeError;

/// How the description is picked out of the content region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    /// All text of the region.
    RegionText,
    /// Text of the first element matching `selector` after an HTML comment
    /// containing `marker`.
    AfterComment {
        marker: &'static str,
        selector: &'static str,
    },
}

/// Where to wait and what to extract on one kind of detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeProfile {
    pub name: &'static str,
    /// CSS selector of the content region to wait for.
    pub region: &'static str,
    pub timeout: Duration,
    /// Scroll halfway down before waiting, for lazily rendered sections.
    pub scroll_to_middle: bool,
    pub extraction: Extraction,
}

impl ScrapeProfile {
    /// Kakao/Daum book detail page.
    pub fn kakao() -> Self {
        Self {
            name: "kakao",
            region: ".desc",
            timeout: Duration::from_secs(3),
            scroll_to_middle: false,
            extraction: Extraction::RegionText,
        }
    }

    /// Aladin product page; the introduction follows a `책소개` marker comment.
    pub fn aladin() -> Self {
        Self {
            name: "aladin",
            region: ".Ere_prod_middlewrap",
            timeout: Duration::from_secs(10),
            scroll_to_middle: true,
            extraction: Extraction::AfterComment {
                marker: "책소개",
                selector: "div.Ere_prod_mconts_R",
            },
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Extract normalized description text from the region's inner HTML.
    ///
    /// `Ok(None)` means the region holds no description (yet).
    pub fn extract(&self, region_html: &str) -> Result<Option<String>, ScrapeError> {
        let fragment = Html::parse_fragment(region_html);
        let raw = match self.extraction {
            Extraction::RegionText => fragment.root_element().text().collect::<String>(),
            Extraction::AfterComment { marker, selector } => {
                let selector = Selector::parse(selector)
                    .map_err(|_| ScrapeError::Selector(selector.to_string()))?;
                match after_comment(&fragment, marker, &selector) {
                    Some(el) => el.text().collect(),
                    None => return Ok(None),
                }
            }
        };
        let text = normalize_description(&raw);
        Ok((!text.is_empty()).then_some(text))
    }
}

fn after_comment<'a>(
    fragment: &'a Html,
    marker: &str,
    selector: &Selector,
) -> Option<ElementRef<'a>> {
    let mut nodes = fragment.root_element().descendants();
    nodes.find(|node| {
        node.value()
            .as_comment()
            .is_some_and(|c| c.contains(marker))
    })?;
    nodes
        .filter_map(ElementRef::wrap)
        .find(|el| selector.matches(el))
}
