//! INI configuration file.
//!
//! The configuration lives at `<config_dir>/photomap/config.ini`. Every key
//! is optional; missing keys keep their defaults.
//!
//! ```ini
//! [backend]
//! url = https://example.supabase.co
//! api_key = ...
//! access_token = ...
//! user_id = ...
//! timeout = 30
//!
//! [feed]
//! debounce_ms = 1000
//! deviation_threshold_km = 10
//! prewarm_images = true
//! nearby_radius_km = 10
//!
//! [cache]
//! directory = ~/.cache/photomap/images
//! download_concurrency = 4
//!
//! [logging]
//! directory = ~/.local/share/photomap/logs
//! level = info
//! ```

mod file;
mod keys;

use std::path::PathBuf;

use thiserror::Error;

pub use file::{
    config_directory, config_file_path, BackendSettings, CacheSettings, ConfigFile,
    FeedSettings, LoggingSettings,
};
pub use keys::ConfigKey;

/// Errors reading, writing or editing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {section}.{key}: '{value}'")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },

    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Format a byte count for humans (`1.5 MB`).
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}
