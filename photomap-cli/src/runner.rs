//! Shared setup for commands that talk to the backend or cache.

use std::future::Future;
use std::path::{Path, PathBuf};

use photomap::app::{AppConfig, PhotoMapApp};
use photomap::config::{ConfigError, ConfigFile};
use photomap::logging::{init_logging, LoggingGuard};
use tokio::runtime::Runtime;
use tracing::info;

use crate::error::CliError;

/// Loads configuration, starts logging and owns the Tokio runtime for one
/// CLI invocation.
pub struct CliRunner {
    config_path: PathBuf,
    config: ConfigFile,
    runtime: Runtime,
    _logging: LoggingGuard,
}

impl CliRunner {
    pub fn new(config_path: &Path, verbose: bool) -> Result<Self, CliError> {
        let config = load_config(config_path)?;

        let logging = AppConfig::from_config_file(&config)
            .logging
            .with_stderr(verbose);
        let guard = init_logging(&logging)
            .map_err(|e| CliError::Config(format!("Failed to start logging: {}", e)))?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            config_path: config_path.to_path_buf(),
            config,
            runtime,
            _logging: guard,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn app_config(&self) -> AppConfig {
        AppConfig::from_config_file(&self.config)
    }

    pub fn log_startup(&self, command: &str) {
        info!(
            version = photomap::VERSION,
            command,
            config = %self.config_path.display(),
            "PhotoMap CLI starting"
        );
    }

    /// Start the application on this runner's runtime.
    pub fn start_app(&self) -> Result<PhotoMapApp, CliError> {
        let app = self.block_on(PhotoMapApp::start(self.app_config()))?;
        if app.memory_backend().is_some() {
            eprintln!(
                "{}",
                console::style("No backend.url configured; using an empty in-memory backend.")
                    .yellow()
            );
        }
        Ok(app)
    }

    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

/// Load the configuration file, using defaults when it does not exist.
pub fn load_config(path: &Path) -> Result<ConfigFile, CliError> {
    match ConfigFile::load_from(path) {
        Ok(config) => Ok(config),
        Err(ConfigError::NotFound(_)) => Ok(ConfigFile::default()),
        Err(e) => Err(e.into()),
    }
}
