//! CLI error type.

use std::fmt;

use photomap::app::AppError;
use photomap::cache::CacheError;
use photomap::config::ConfigError;
use photomap::feed::FeedClosed;
use photomap::repository::RepositoryError;

/// Errors surfaced to the user by a CLI command.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be read, written or understood.
    Config(String),

    /// The application failed to start.
    App(AppError),

    /// A repository call failed.
    Repository(RepositoryError),

    /// One or more images could not be cached.
    Cache(String),

    /// The feed stopped unexpectedly.
    Feed(FeedClosed),

    /// A command-line argument was rejected.
    InvalidArgument(String),

    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::App(e) => write!(f, "{}", e),
            CliError::Repository(e) => write!(f, "{}", e),
            CliError::Cache(msg) => write!(f, "Cache error: {}", msg),
            CliError::Feed(e) => write!(f, "{}", e),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::App(e) => Some(e),
            CliError::Repository(e) => Some(e),
            CliError::Feed(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::App(e)
    }
}

impl From<RepositoryError> for CliError {
    fn from(e: RepositoryError) -> Self {
        CliError::Repository(e)
    }
}

impl From<CacheError> for CliError {
    fn from(e: CacheError) -> Self {
        CliError::Cache(e.to_string())
    }
}

impl From<FeedClosed> for CliError {
    fn from(e: FeedClosed) -> Self {
        CliError::Feed(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
