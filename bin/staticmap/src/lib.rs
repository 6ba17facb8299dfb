//! Staticmap CLI Library
//!
//! Command implementations for the `staticmap` binary, exposed as a library
//! so they can be driven from tests and other tools.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (build, schedule, check, stylesheet)
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use staticmap::cmd;
//!
//! // Run one build with the settings from staticmap.toml
//! cmd::build::run(Path::new("staticmap.toml"), None, None).unwrap();
//! ```

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr, bail};

pub mod cmd;

// Re-export core types for convenience
pub use staticmap_core::{Config, SnapshotStore};
pub use staticmap_generator::{BuildOutcome, BuildStats, Builder};

/// Initialize tracing with the specified verbosity level.
///
/// # Arguments
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

/// Load configuration, applying `STATICMAP__*` environment overrides.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        bail!("Configuration file not found: {}", path.display());
    }
    Config::load_with_env(path)
        .wrap_err_with(|| format!("Failed to load configuration from {}", path.display()))
}
