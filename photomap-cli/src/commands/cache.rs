//! Image cache CLI commands.

use clap::Subcommand;
use console::style;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use photomap::cache::DEFAULT_DOWNLOAD_CONCURRENCY;
use photomap::config::format_size;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Download images into the cache
    Fetch {
        /// Image URLs to cache
        #[arg(required = true)]
        urls: Vec<String>,

        /// Maximum concurrent downloads
        #[arg(long, default_value_t = DEFAULT_DOWNLOAD_CONCURRENCY)]
        concurrency: usize,
    },
    /// Print the local path an image URL is cached at
    Path { url: String },
    /// Show cache directory statistics
    Stats,
    /// Remove every cached image
    Clear,
}

/// Run a cache subcommand.
pub fn run(runner: &CliRunner, action: CacheAction) -> Result<(), CliError> {
    runner.log_startup("cache");
    let app = runner.start_app()?;
    let cache = app.cache();

    match action {
        CacheAction::Fetch { urls, concurrency } => {
            let progress = ProgressBar::new(urls.len() as u64);
            progress.set_style(
                ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            );

            let failures = runner.block_on(async {
                let mut failures = Vec::new();
                let mut results = std::pin::pin!(cache.ensure_cached_stream(urls, concurrency));
                while let Some((url, result)) = results.next().await {
                    progress.inc(1);
                    match result {
                        Ok(path) => progress.set_message(path.display().to_string()),
                        Err(e) => failures.push((url, e)),
                    }
                }
                failures
            });
            progress.finish_and_clear();

            let stats = cache.stats();
            println!(
                "Cached {} image(s), {} downloaded",
                stats.ready, stats.downloads
            );
            if failures.is_empty() {
                return Ok(());
            }
            for (url, error) in &failures {
                eprintln!("{} {}: {}", style("failed").red(), url, error.cause);
            }
            Err(CliError::Cache(format!(
                "{} image(s) could not be cached",
                failures.len()
            )))
        }
        CacheAction::Path { url } => {
            let path = cache.path_for(&url);
            let marker = if path.exists() {
                style("cached").green()
            } else {
                style("not cached").yellow()
            };
            println!("{}  ({})", path.display(), marker);
            Ok(())
        }
        CacheAction::Stats => {
            let usage = runner.block_on(cache.disk_usage())?;
            println!("Image cache: {}", cache.directory().display());
            println!("  Files: {}", usage.files);
            println!("  Size:  {}", format_size(usage.bytes));
            Ok(())
        }
        CacheAction::Clear => {
            println!("Clearing image cache at: {}", cache.directory().display());
            let removed = runner.block_on(cache.clear())?;
            println!("Deleted {} files", removed);
            Ok(())
        }
    }
}
