//! Logging initialisation.
//!
//! Installs a global `tracing` subscriber writing to `<directory>/photomap.log`
//! through a non-blocking appender, and optionally mirroring to stderr. The
//! filter defaults to `photomap=<level>` and can be overridden with `RUST_LOG`.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Default log file name inside the log directory.
pub const LOG_FILE_NAME: &str = "photomap.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub file_name: String,
    /// Level applied to the `photomap` targets when `RUST_LOG` is unset.
    pub level: String,
    /// Also log to stderr.
    pub stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let settings = crate::config::LoggingSettings::default();
        Self {
            directory: settings.directory,
            file_name: LOG_FILE_NAME.to_string(),
            level: settings.level,
            stderr: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_stderr(mut self, stderr: bool) -> Self {
        self.stderr = stderr;
        self
    }

    pub fn log_file(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }

    /// Filter used when `RUST_LOG` is not set.
    pub fn default_directive(&self) -> String {
        format!("photomap={}", self.level)
    }
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to create log directory {path}: {source}")]
    Directory { path: PathBuf, source: io::Error },

    #[error("A global logger is already installed")]
    AlreadyInitialized,
}

/// Keeps the background log writer alive. Dropping it flushes and stops
/// file logging.
#[must_use = "logging stops when the guard is dropped"]
pub struct LoggingGuard {
    _worker: WorkerGuard,
    log_file: PathBuf,
}

impl LoggingGuard {
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }
}

/// Install the global subscriber described by `config`.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError> {
    std::fs::create_dir_all(&config.directory).map_err(|source| LoggingError::Directory {
        path: config.directory.clone(),
        source,
    })?;

    let appender = tracing_appender::rolling::never(&config.directory, &config.file_name);
    let (writer, worker) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_timer(LocalTime::new(Rfc3339))
        .with_target(true);

    let stderr_layer = config.stderr.then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_timer(LocalTime::new(Rfc3339))
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    Ok(LoggingGuard {
        _worker: worker,
        log_file: config.log_file(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        let config = LoggingConfig::default().with_level("debug");
        assert_eq!(config.default_directive(), "photomap=debug");
    }

    #[test]
    fn test_log_file_path() {
        let config = LoggingConfig::default().with_directory("/tmp/photomap-logs");
        assert_eq!(
            config.log_file(),
            PathBuf::from("/tmp/photomap-logs/photomap.log")
        );
    }

    #[test]
    fn test_unwritable_directory_is_reported() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"").unwrap();

        let config = LoggingConfig::default().with_directory(blocker.join("logs"));
        assert!(matches!(
            init_logging(&config),
            Err(LoggingError::Directory { .. })
        ));
    }
}
