//! Loading and saving `config.ini`.

use std::path::{Path, PathBuf};

use ini::Ini;

use super::keys::ConfigKey;
use super::ConfigError;

/// Directory holding the configuration file.
pub fn config_directory() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("photomap")
}

/// Default location of the configuration file.
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackendSettings {
    /// Base URL of the hosted backend. `None` selects the in-memory backend.
    pub url: Option<String>,
    pub api_key: Option<String>,
    /// Bearer token of the signed-in user.
    pub access_token: Option<String>,
    /// Id of the signed-in user; required alongside `access_token` to upload.
    pub user_id: Option<String>,
    /// Request timeout in seconds.
    pub timeout: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            access_token: None,
            user_id: None,
            timeout: crate::repository::DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedSettings {
    pub debounce_ms: u64,
    pub deviation_threshold_km: f64,
    pub prewarm_images: bool,
    pub nearby_radius_km: f64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            debounce_ms: crate::feed::DEFAULT_DEBOUNCE.as_millis() as u64,
            deviation_threshold_km: crate::feed::DEFAULT_DEVIATION_THRESHOLD_KM,
            prewarm_images: true,
            nearby_radius_km: crate::repository::DEFAULT_NEARBY_RADIUS_KM,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    pub directory: PathBuf,
    /// Simultaneous background image downloads.
    pub download_concurrency: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            directory: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("photomap")
                .join("images"),
            download_concurrency: crate::cache::DEFAULT_DOWNLOAD_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("photomap")
                .join("logs"),
            level: "info".to_string(),
        }
    }
}

/// Parsed contents of `config.ini`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub backend: BackendSettings,
    pub feed: FeedSettings,
    pub cache: CacheSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from the default location, falling back to defaults when the
    /// file does not exist yet. Other errors are still reported.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::load() {
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(io) => ConfigError::Io(io),
            ini::Error::Parse(parse) => ConfigError::Parse {
                path: path.to_path_buf(),
                message: parse.to_string(),
            },
        })?;
        Self::from_ini(&ini)
    }

    /// Parse configuration text. Unknown sections and keys are ignored.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<string>"),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|section| section.get(key.key_name()));
            if let Some(value) = value {
                // Blank paths mean "use the default".
                let blank_path = value.trim().is_empty()
                    && matches!(key, ConfigKey::CacheDirectory | ConfigKey::LoggingDirectory);
                if !blank_path {
                    key.set(&mut config, value)?;
                }
            }
        }
        Ok(config)
    }

    /// Save to the default location, creating its directory.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.to_ini().write_to_file(path)?;
        Ok(())
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }
        ini
    }
}
