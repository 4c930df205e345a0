//! PhotoMap CLI - command-line front end for the photo feed.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use console::style;

use commands::cache::CacheAction;
use commands::config::ConfigCommands;
use commands::photos::PhotoCommands;
use commands::profile::ProfileCommands;
use commands::watch::WatchArgs;
use error::CliError;
use runner::CliRunner;

/// Browse geotagged photos by map region
#[derive(Debug, Parser)]
#[command(name = "photomap", version, about)]
struct Cli {
    /// Configuration file (defaults to <config dir>/photomap/config.ini)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Also log to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a configuration file
    Init {
        /// Overwrite an existing file without asking
        #[arg(long)]
        force: bool,

        /// Backend base URL to write into the new file
        #[arg(long)]
        backend_url: Option<String>,
    },

    /// Read or change configuration values
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Query and publish photos
    Photos {
        #[command(subcommand)]
        command: PhotoCommands,
    },

    /// Show or edit user profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Manage the local image cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Drive a live region feed from stdin
    Watch(WatchArgs),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli
        .config
        .unwrap_or_else(photomap::config::config_file_path);

    match cli.command {
        Commands::Init { force, backend_url } => {
            commands::init::run(&config_path, force, backend_url)
        }
        Commands::Config { command } => commands::config::run(&config_path, command),
        Commands::Photos { command } => {
            let runner = CliRunner::new(&config_path, cli.verbose)?;
            commands::photos::run(&runner, command)
        }
        Commands::Profile { command } => {
            let runner = CliRunner::new(&config_path, cli.verbose)?;
            commands::profile::run(&runner, command)
        }
        Commands::Cache { action } => {
            let runner = CliRunner::new(&config_path, cli.verbose)?;
            commands::cache::run(&runner, action)
        }
        Commands::Watch(args) => {
            let runner = CliRunner::new(&config_path, cli.verbose)?;
            commands::watch::run(&runner, args)
        }
    }
}
