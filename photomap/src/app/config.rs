//! Application configuration for PhotoMapApp.
//!
//! `AppConfig` combines everything needed to bootstrap the application: which
//! backend to talk to, where the image cache lives, how the feed behaves, and
//! where logs go.

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::{ReqwestFetcher, DEFAULT_DOWNLOAD_CONCURRENCY};
use crate::config::ConfigFile;
use crate::feed::FeedConfig;
use crate::logging::LoggingConfig;
use crate::repository::{Session, DEFAULT_TIMEOUT_SECS};

/// Application configuration combining all component configs.
#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub cache: CacheConfig,
    pub feed: FeedConfig,
    pub logging: LoggingConfig,
}

/// Which photo backend to use and how to reach it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendConfig {
    /// Hosted backend base URL. `None` selects the in-memory backend.
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    pub user_id: Option<String>,
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            access_token: None,
            user_id: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl BackendConfig {
    /// Configure a hosted backend at `url`.
    pub fn remote(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sign requests in as `user_id` using `access_token`.
    pub fn with_session(mut self, user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self.access_token = Some(access_token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_remote(&self) -> bool {
        self.url.is_some()
    }

    /// The signed-in session, when both user id and token are configured.
    pub fn session(&self) -> Option<Session> {
        match (&self.user_id, &self.access_token) {
            (Some(user_id), Some(access_token)) => Some(Session {
                user_id: user_id.clone(),
                access_token: access_token.clone(),
            }),
            _ => None,
        }
    }
}

/// Image cache configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    pub directory: PathBuf,
    /// Timeout for a single image download.
    pub download_timeout: Duration,
    /// Cap on simultaneous background pre-warm downloads.
    pub download_concurrency: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(crate::config::CacheSettings::default().directory)
    }
}

impl CacheConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            download_timeout: Duration::from_secs(ReqwestFetcher::DEFAULT_TIMEOUT_SECS),
            download_concurrency: DEFAULT_DOWNLOAD_CONCURRENCY,
        }
    }

    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    pub fn with_download_concurrency(mut self, concurrency: usize) -> Self {
        self.download_concurrency = concurrency;
        self
    }
}

impl AppConfig {
    /// Build the runtime configuration from the loaded configuration file.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        Self {
            backend: BackendConfig {
                url: config.backend.url.clone(),
                api_key: config.backend.api_key.clone(),
                access_token: config.backend.access_token.clone(),
                user_id: config.backend.user_id.clone(),
                timeout: Duration::from_secs(config.backend.timeout),
            },
            cache: CacheConfig::new(config.cache.directory.clone())
                .with_download_concurrency(config.cache.download_concurrency),
            feed: FeedConfig::default()
                .with_debounce(Duration::from_millis(config.feed.debounce_ms))
                .with_deviation_threshold_km(config.feed.deviation_threshold_km)
                .with_prewarm_images(config.feed.prewarm_images)
                .with_nearby_radius_km(config.feed.nearby_radius_km),
            logging: LoggingConfig::default()
                .with_directory(config.logging.directory.clone())
                .with_level(config.logging.level.clone()),
        }
    }

    pub fn with_backend(mut self, backend: BackendConfig) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_cache_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.cache.directory = directory.into();
        self
    }

    pub fn with_feed(mut self, feed: FeedConfig) -> Self {
        self.feed = feed;
        self
    }
}
