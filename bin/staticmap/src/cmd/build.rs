//! Build command - generates the sitemap files once

use std::{path::Path, time::Instant};

use color_eyre::eyre::{Result, WrapErr};
use staticmap_core::SnapshotStore;
use staticmap_generator::{BuildOutcome, Builder};

use crate::load_config;

/// Run the build command.
///
/// Builds the sitemap and prints a summary.
pub fn run(config_path: &Path, store: Option<&Path>, home_url: Option<&str>) -> Result<()> {
    let start = Instant::now();
    tracing::info!(?config_path, ?store, ?home_url, "Starting build");

    let outcome = execute(config_path, store, home_url)?;
    let duration = start.elapsed();

    println!();
    match &outcome {
        BuildOutcome::Written { stats } => {
            println!("  Sitemap built successfully!");
            println!();
            println!("  URLs:       {}", stats.pages);
            println!("  Sitemaps:   {}", stats.shards);
            println!("  Files:      {}", stats.files);
            println!("  Bytes:      {}", stats.bytes);
            println!();
            println!("  Duration:   {:.2}s", duration.as_secs_f64());
            println!("  Sitemap:    {}", stats.sitemap_url);
        }
        BuildOutcome::Empty { .. } => {
            println!("  ⚠ {}", outcome.message());
        }
    }
    println!();

    tracing::info!(?outcome, ?duration, "Build finished");

    Ok(())
}

/// Load configuration, open the content store and run one build.
pub fn execute(
    config_path: &Path,
    store: Option<&Path>,
    home_url: Option<&str>,
) -> Result<BuildOutcome> {
    let mut config = load_config(config_path)?;

    // Override home URL if specified via CLI
    if let Some(url) = home_url {
        tracing::info!(home_url = url, "Overriding home URL from CLI");
        config.site.home_url = url.to_string();
        config.validate().wrap_err("Invalid --home-url")?;
    }

    // Override content snapshot if specified via CLI
    if let Some(path) = store {
        config.store.snapshot = path.to_path_buf();
    }

    tracing::debug!(?config, "Loaded configuration");

    let store = SnapshotStore::open(&config.store.snapshot, config.home_url())
        .wrap_err("Failed to open content store")?;

    Builder::new(config, store).build().wrap_err("Build failed")
}
