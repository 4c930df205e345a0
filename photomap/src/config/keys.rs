//! Addressable configuration keys (`section.key`).

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFile;
use super::ConfigError;

/// Log levels accepted by `logging.level`.
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Every setting in the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    BackendUrl,
    BackendApiKey,
    BackendAccessToken,
    BackendUserId,
    BackendTimeout,
    FeedDebounceMs,
    FeedDeviationThresholdKm,
    FeedPrewarmImages,
    FeedNearbyRadiusKm,
    CacheDirectory,
    CacheDownloadConcurrency,
    LoggingDirectory,
    LoggingLevel,
}

impl ConfigKey {
    /// All keys in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::BackendUrl,
            ConfigKey::BackendApiKey,
            ConfigKey::BackendAccessToken,
            ConfigKey::BackendUserId,
            ConfigKey::BackendTimeout,
            ConfigKey::FeedDebounceMs,
            ConfigKey::FeedDeviationThresholdKm,
            ConfigKey::FeedPrewarmImages,
            ConfigKey::FeedNearbyRadiusKm,
            ConfigKey::CacheDirectory,
            ConfigKey::CacheDownloadConcurrency,
            ConfigKey::LoggingDirectory,
            ConfigKey::LoggingLevel,
        ]
    }

    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::BackendUrl
            | ConfigKey::BackendApiKey
            | ConfigKey::BackendAccessToken
            | ConfigKey::BackendUserId
            | ConfigKey::BackendTimeout => "backend",
            ConfigKey::FeedDebounceMs
            | ConfigKey::FeedDeviationThresholdKm
            | ConfigKey::FeedPrewarmImages
            | ConfigKey::FeedNearbyRadiusKm => "feed",
            ConfigKey::CacheDirectory | ConfigKey::CacheDownloadConcurrency => "cache",
            ConfigKey::LoggingDirectory | ConfigKey::LoggingLevel => "logging",
        }
    }

    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::BackendUrl => "url",
            ConfigKey::BackendApiKey => "api_key",
            ConfigKey::BackendAccessToken => "access_token",
            ConfigKey::BackendUserId => "user_id",
            ConfigKey::BackendTimeout => "timeout",
            ConfigKey::FeedDebounceMs => "debounce_ms",
            ConfigKey::FeedDeviationThresholdKm => "deviation_threshold_km",
            ConfigKey::FeedPrewarmImages => "prewarm_images",
            ConfigKey::FeedNearbyRadiusKm => "nearby_radius_km",
            ConfigKey::CacheDirectory | ConfigKey::LoggingDirectory => "directory",
            ConfigKey::CacheDownloadConcurrency => "download_concurrency",
            ConfigKey::LoggingLevel => "level",
        }
    }

    /// Dotted name, e.g. `feed.debounce_ms`.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Credentials that should not be echoed in listings.
    pub fn is_secret(&self) -> bool {
        matches!(self, ConfigKey::BackendApiKey | ConfigKey::BackendAccessToken)
    }

    /// Current value as written to the file. Empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        let optional = |value: &Option<String>| value.clone().unwrap_or_default();
        match self {
            ConfigKey::BackendUrl => optional(&config.backend.url),
            ConfigKey::BackendApiKey => optional(&config.backend.api_key),
            ConfigKey::BackendAccessToken => optional(&config.backend.access_token),
            ConfigKey::BackendUserId => optional(&config.backend.user_id),
            ConfigKey::BackendTimeout => config.backend.timeout.to_string(),
            ConfigKey::FeedDebounceMs => config.feed.debounce_ms.to_string(),
            ConfigKey::FeedDeviationThresholdKm => config.feed.deviation_threshold_km.to_string(),
            ConfigKey::FeedPrewarmImages => config.feed.prewarm_images.to_string(),
            ConfigKey::FeedNearbyRadiusKm => config.feed.nearby_radius_km.to_string(),
            ConfigKey::CacheDirectory => config.cache.directory.display().to_string(),
            ConfigKey::CacheDownloadConcurrency => config.cache.download_concurrency.to_string(),
            ConfigKey::LoggingDirectory => config.logging.directory.display().to_string(),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
        }
    }

    /// Parse `value` and store it. An empty value clears optional settings.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let optional = |value: &str| (!value.is_empty()).then(|| value.to_string());

        match self {
            ConfigKey::BackendUrl => {
                config.backend.url = optional(value).map(|url| url.trim_end_matches('/').to_string())
            }
            ConfigKey::BackendApiKey => config.backend.api_key = optional(value),
            ConfigKey::BackendAccessToken => config.backend.access_token = optional(value),
            ConfigKey::BackendUserId => config.backend.user_id = optional(value),
            ConfigKey::BackendTimeout => {
                config.backend.timeout = self.parse_positive::<u64>(value)?;
            }
            ConfigKey::FeedDebounceMs => config.feed.debounce_ms = self.parse(value)?,
            ConfigKey::FeedDeviationThresholdKm => {
                config.feed.deviation_threshold_km = self.parse_distance(value)?;
            }
            ConfigKey::FeedPrewarmImages => config.feed.prewarm_images = self.parse_bool(value)?,
            ConfigKey::FeedNearbyRadiusKm => {
                config.feed.nearby_radius_km = self.parse_distance(value)?;
            }
            ConfigKey::CacheDirectory => config.cache.directory = self.parse_path(value)?,
            ConfigKey::CacheDownloadConcurrency => {
                config.cache.download_concurrency = self.parse_positive::<usize>(value)?;
            }
            ConfigKey::LoggingDirectory => config.logging.directory = self.parse_path(value)?,
            ConfigKey::LoggingLevel => {
                let level = value.to_ascii_lowercase();
                if !LOG_LEVELS.contains(&level.as_str()) {
                    return Err(self.invalid(value));
                }
                config.logging.level = level;
            }
        }
        Ok(())
    }

    fn invalid(&self, value: &str) -> ConfigError {
        ConfigError::InvalidValue {
            section: self.section().to_string(),
            key: self.key_name().to_string(),
            value: value.to_string(),
        }
    }

    fn parse<T: FromStr>(&self, value: &str) -> Result<T, ConfigError> {
        value.parse().map_err(|_| self.invalid(value))
    }

    fn parse_positive<T: FromStr + PartialOrd + Default>(&self, value: &str) -> Result<T, ConfigError> {
        let parsed: T = self.parse(value)?;
        if parsed <= T::default() {
            return Err(self.invalid(value));
        }
        Ok(parsed)
    }

    fn parse_distance(&self, value: &str) -> Result<f64, ConfigError> {
        let km: f64 = self.parse(value)?;
        if !km.is_finite() || km <= 0.0 {
            return Err(self.invalid(value));
        }
        Ok(km)
    }

    fn parse_bool(&self, value: &str) -> Result<bool, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(self.invalid(value)),
        }
    }

    fn parse_path(&self, value: &str) -> Result<PathBuf, ConfigError> {
        if value.is_empty() {
            return Err(self.invalid(value));
        }
        Ok(expand_home(value))
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == s)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}

/// Expand a leading `~` to the home directory.
fn expand_home(value: &str) -> PathBuf {
    match (value.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(value),
    }
}
