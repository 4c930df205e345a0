//! Init command - write a configuration file.

use std::path::Path;

use dialoguer::Confirm;
use photomap::config::{ConfigFile, ConfigKey};

use crate::error::CliError;
use crate::runner::load_config;

/// Run the init command.
pub fn run(path: &Path, force: bool, backend_url: Option<String>) -> Result<(), CliError> {
    if path.exists() && !force && !confirm_overwrite(path) {
        println!("Keeping existing configuration at {}", path.display());
        return Ok(());
    }

    // Keep any settings the user already has.
    let mut config = if path.exists() {
        load_config(path).unwrap_or_default()
    } else {
        ConfigFile::default()
    };
    if let Some(url) = backend_url {
        ConfigKey::BackendUrl.set(&mut config, &url)?;
    }
    config.save_to(path)?;

    println!("Configuration file: {}", path.display());
    println!();
    match &config.backend.url {
        Some(url) => println!("Backend: {}", url),
        None => {
            println!("No backend configured; PhotoMap will use an in-memory backend.");
            println!("Set one with: photomap config set backend.url <URL>");
        }
    }
    println!("Image cache: {}", config.cache.directory.display());
    Ok(())
}

fn confirm_overwrite(path: &Path) -> bool {
    Confirm::new()
        .with_prompt(format!("{} already exists. Overwrite?", path.display()))
        .default(false)
        .interact()
        .unwrap_or(false)
}
