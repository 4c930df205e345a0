//! HTTP fetcher abstraction for testability.

use std::time::Duration;

use bytes::Bytes;
use futures::future::BoxFuture;

use super::error::CacheFailure;

/// Downloads the raw bytes behind an image URL.
///
/// Injected into [`ImageCache`](super::ImageCache) so tests can count and
/// gate downloads without a network.
pub trait ImageFetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Bytes, CacheFailure>>;
}

/// Real fetcher backed by an async reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Default per-download timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

    pub fn new() -> Result<Self, CacheFailure> {
        Self::with_timeout(Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, CacheFailure> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("photomap/{}", crate::VERSION))
            .build()
            .map_err(|e| CacheFailure::Download(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl ImageFetcher for ReqwestFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Bytes, CacheFailure>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| CacheFailure::Download(format!("Request failed: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                return Err(CacheFailure::Http(status.as_u16()));
            }

            response
                .bytes()
                .await
                .map_err(|e| CacheFailure::Download(format!("Failed to read response: {}", e)))
        })
    }
}
