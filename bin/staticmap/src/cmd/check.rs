//! Check command - validate configuration and content store

use std::{num::NonZeroUsize, path::Path};

use color_eyre::eyre::{Result, bail};
use staticmap_core::{Config, SnapshotStore};
use staticmap_generator::{
    OutputWriter, PageCollector, partition::shard_count, stylesheet::STYLESHEET_FILE,
};

use crate::load_config;

/// Validation result.
#[derive(Debug, Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Run the check command.
///
/// Validates the configuration and reports what a build would publish.
pub fn run(config_path: &Path, strict: bool) -> Result<()> {
    tracing::info!(?config_path, strict, "Checking configuration and content store");

    let mut result = ValidationResult::default();

    println!("Checking configuration...");
    let config = match load_config(config_path) {
        Ok(c) => {
            println!("  ✓ Configuration valid");
            Some(c)
        }
        Err(e) => {
            result.add_error(format!("{e:#}"));
            println!("  ✗ Configuration invalid: {e:#}");
            None
        }
    };

    if let Some(ref cfg) = config {
        println!("\nChecking content store...");
        check_store(cfg, &mut result);

        println!("\nChecking output...");
        check_output(cfg, &mut result);

        println!("\nChecking stylesheet...");
        check_stylesheet(cfg, &mut result);
    }

    // Print summary
    println!();
    println!("Summary:");
    println!("  Errors:   {}", result.errors.len());
    println!("  Warnings: {}", result.warnings.len());

    if result.has_errors() {
        println!();
        println!("Errors:");
        for err in &result.errors {
            println!("  ✗ {err}");
        }
    }

    if result.has_warnings() {
        println!();
        println!("Warnings:");
        for warn in &result.warnings {
            println!("  ⚠ {warn}");
        }
    }

    if result.has_errors() {
        bail!("Validation failed with {} error(s)", result.errors.len());
    }

    if strict && result.has_warnings() {
        bail!(
            "Validation failed with {} warning(s) (strict mode)",
            result.warnings.len()
        );
    }

    println!();
    println!("✓ All checks passed");

    Ok(())
}

fn check_store(config: &Config, result: &mut ValidationResult) {
    let store = match SnapshotStore::open(&config.store.snapshot, config.home_url()) {
        Ok(store) => store,
        Err(e) => {
            println!("  ✗ {e}");
            result.add_error(e.to_string());
            return;
        }
    };
    println!(
        "  ✓ Loaded {} rows from {}",
        store.len(),
        store.path().display()
    );

    let collector = PageCollector::new(config, &store);
    match collector.collect() {
        Ok(items) if items.is_empty() => {
            println!("  ⚠ No eligible content");
            result.add_warning("No content to include in the sitemap");
        }
        Ok(items) => {
            let shards = NonZeroUsize::new(config.sitemap.items_per_sitemap)
                .map_or(0, |capacity| shard_count(items.len(), capacity));
            println!("  ✓ {} eligible URLs", items.len());
            if shards > 1 {
                println!("  ✓ {shards} sitemaps behind an index at {}", config.sitemap_url());
            } else {
                println!("  ✓ Single sitemap at {}", config.sitemap_url());
            }
        }
        Err(e) => {
            println!("  ✗ {e}");
            result.add_error(e.to_string());
        }
    }
}

fn check_output(config: &Config, result: &mut ValidationResult) {
    let public_dir = &config.site.public_dir;
    if !public_dir.exists() {
        println!("  ⚠ Public directory will be created");
        result.add_warning(format!(
            "Public directory does not exist: {}",
            public_dir.display()
        ));
    } else if !public_dir.is_dir() {
        result.add_error(format!(
            "Public directory is not a directory: {}",
            public_dir.display()
        ));
        return;
    }

    let target = config.output_dir();
    if target.exists() && !target.is_dir() {
        result.add_error(format!(
            "Sitemap folder path is a file: {}",
            target.display()
        ));
    } else {
        println!("  ✓ Sitemap folder: {}", target.display());
    }

    if OutputWriter::new(public_dir, &config.sitemap.folder).is_locked() {
        result.add_warning(format!(
            "Another build currently holds {}",
            target.display()
        ));
    }
}

fn check_stylesheet(config: &Config, result: &mut ValidationResult) {
    match config.stylesheet.dir.as_deref() {
        None => println!("  - No stylesheet configured"),
        Some(dir) if dir.join(STYLESHEET_FILE).is_file() => {
            println!("  ✓ Found {}", dir.join(STYLESHEET_FILE).display());
        }
        Some(dir) => {
            result.add_warning(format!(
                "{} not found in {}; sitemaps will not reference a stylesheet",
                STYLESHEET_FILE,
                dir.display()
            ));
        }
    }
}
