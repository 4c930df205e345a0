//! Cache error types.

use thiserror::Error;

/// Why caching a single URL failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheFailure {
    /// The server answered with a non-success status.
    #[error("HTTP {0}")]
    Http(u16),

    /// The request could not be completed.
    #[error("Download failed: {0}")]
    Download(String),

    /// Writing the downloaded file failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// The downloading task was cancelled before it finished.
    #[error("Download was interrupted")]
    Interrupted,
}

/// A failure to cache one specific URL.
///
/// Isolated per URL: it never fails a feed fetch or a sibling download.
/// `Clone` so one outcome can be handed to every coalesced waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to cache {url}: {cause}")]
pub struct CacheError {
    pub url: String,
    pub cause: CacheFailure,
}

impl CacheError {
    pub fn new(url: impl Into<String>, cause: CacheFailure) -> Self {
        Self {
            url: url.into(),
            cause,
        }
    }
}

impl From<std::io::Error> for CacheFailure {
    fn from(e: std::io::Error) -> Self {
        CacheFailure::Io(e.to_string())
    }
}
