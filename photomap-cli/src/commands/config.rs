//! Configuration management CLI commands.
//!
//! Provides `config get`, `config set`, `config list`, and `config path`.

use std::path::Path;

use clap::Subcommand;
use photomap::config::ConfigKey;

use crate::error::CliError;
use crate::runner::load_config;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., feed.debounce_ms)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., backend.url)
        key: String,

        /// Value to set (empty to clear)
        value: String,
    },

    /// List all configuration settings
    List {
        /// Show API keys and access tokens instead of masking them
        #[arg(long)]
        show_secrets: bool,
    },

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(path: &Path, command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => run_get(path, &key),
        ConfigCommands::Set { key, value } => run_set(path, &key, &value),
        ConfigCommands::List { show_secrets } => run_list(path, show_secrets),
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'photomap config list' to see available keys.",
            key
        ))
    })
}

fn run_get(path: &Path, key: &str) -> Result<(), CliError> {
    let key = parse_key(key)?;
    let config = load_config(path)?;
    let value = key.get(&config);

    if value.is_empty() {
        println!("(not set)");
    } else {
        println!("{}", value);
    }
    Ok(())
}

fn run_set(path: &Path, key: &str, value: &str) -> Result<(), CliError> {
    let key = parse_key(key)?;
    let mut config = load_config(path)?;
    key.set(&mut config, value)?;
    config.save_to(path)?;

    println!("Set {} = {}", key, key.get(&config));
    Ok(())
}

fn run_list(path: &Path, show_secrets: bool) -> Result<(), CliError> {
    let config = load_config(path)?;

    println!("Configuration Settings");
    println!("======================");

    let mut current_section = "";
    for key in ConfigKey::all() {
        let section = key.section();
        if section != current_section {
            println!();
            println!("[{}]", section);
            current_section = section;
        }

        let value = key.get(&config);
        let shown = if value.is_empty() {
            "(not set)".to_string()
        } else if key.is_secret() && !show_secrets {
            mask(&value)
        } else {
            value
        };
        println!("  {} = {}", key.key_name(), shown);
    }
    Ok(())
}

/// Keep the last four characters of a secret.
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mask() {
        assert_eq!(mask("abc"), "****");
        assert_eq!(mask("eyJhbGciOiJIUzI1NiJ9.sig"), "****.sig");
    }

    #[test]
    fn test_set_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");

        run_set(&path, "feed.debounce_ms", "500").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.feed.debounce_ms, 500);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        assert!(matches!(
            run_set(&path, "feed.colour", "blue"),
            Err(CliError::Config(_))
        ));
        assert!(!path.exists());
    }
}
