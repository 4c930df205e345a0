//! Application error types.

use std::fmt;
use std::path::PathBuf;

use crate::cache::CacheFailure;
use crate::config::ConfigError;
use crate::logging::LoggingError;
use crate::repository::RepositoryError;

/// Errors that can occur while starting the application.
#[derive(Debug)]
pub enum AppError {
    /// The configuration file could not be loaded.
    Config(ConfigError),

    /// Logging could not be initialised.
    Logging(LoggingError),

    /// The photo backend could not be created.
    Backend(RepositoryError),

    /// The image fetcher could not be created.
    Fetcher(CacheFailure),

    /// The image cache directory could not be opened.
    CacheOpen {
        directory: PathBuf,
        source: std::io::Error,
    },

    /// Failed to create the Tokio runtime.
    RuntimeCreation(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::Logging(e) => write!(f, "Failed to initialise logging: {}", e),
            AppError::Backend(e) => write!(f, "Failed to create photo backend: {}", e),
            AppError::Fetcher(e) => write!(f, "Failed to create image fetcher: {}", e),
            AppError::CacheOpen { directory, source } => write!(
                f,
                "Failed to open image cache at {}: {}",
                directory.display(),
                source
            ),
            AppError::RuntimeCreation(msg) => {
                write!(f, "Failed to create Tokio runtime: {}", msg)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::Logging(e) => Some(e),
            AppError::Backend(e) => Some(e),
            AppError::Fetcher(e) => Some(e),
            AppError::CacheOpen { source, .. } => Some(source),
            AppError::RuntimeCreation(_) => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e)
    }
}

impl From<LoggingError> for AppError {
    fn from(e: LoggingError) -> Self {
        AppError::Logging(e)
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        AppError::Backend(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Backend(RepositoryError::Backend("bad url".into()));
        assert_eq!(
            err.to_string(),
            "Failed to create photo backend: Backend error: bad url"
        );
    }

    #[test]
    fn test_cache_open_has_source() {
        let err = AppError::CacheOpen {
            directory: PathBuf::from("/nope"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/nope"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_runtime_error_has_no_source() {
        let err = AppError::RuntimeCreation("no threads".into());
        assert!(err.source().is_none());
    }
}
