use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("browser launch failed: {0}")]
    Launch(String),
    #[cfg(feature = "chromium")]
    #[error("browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),
    #[error("browser process: {0}")]
    Process(#[from] std::io::Error),
    #[error("invalid selector `{0}`")]
    Selector(String),
    #[error("content region `{selector}` not ready after {timeout:?}")]
    Timeout {
        selector: &'static str,
        timeout: Duration,
    },
}
