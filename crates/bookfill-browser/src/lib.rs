//! Description scraping: page profiles, HTML extraction, and the headless
//! Chromium driver behind the `chromium` feature.

mod error;
pub use error::ScrapeError;

pub mod extract;
pub use extract::{Extraction, ScrapeProfile};

#[cfg(feature = "chromium")]
pub mod chromium;
#[cfg(feature = "chromium")]
pub use chromium::ChromiumScraper;
