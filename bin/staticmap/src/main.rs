//! Staticmap CLI
//!
//! Generates static XML sitemaps from a content store, on demand or on a
//! schedule.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use clap::Parser;
use color_eyre::eyre::Result;
use staticmap_core::config::ScheduleInterval;

/// Command-line interface for staticmap.
#[derive(Parser)]
#[command(
    name = "staticmap",
    version,
    about = "A static XML sitemap generator"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "staticmap.toml")]
    config: std::path::PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Build the sitemap once
    Build {
        /// Content snapshot to read instead of the configured one
        #[arg(long)]
        store: Option<std::path::PathBuf>,
        /// Override the site home URL (e.g., https://example.com)
        #[arg(long)]
        home_url: Option<String>,
    },
    /// Rebuild the sitemap periodically
    Schedule {
        /// hourly, twicedaily, daily, or a number of minutes
        #[arg(short, long)]
        interval: Option<ScheduleInterval>,
        /// Run a single build and exit
        #[arg(long)]
        once: bool,
    },
    /// Validate configuration and content store
    Check {
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
    /// Write the default XSLT stylesheet
    Stylesheet {
        /// Output path
        #[arg(short, long, default_value = "sitemap.xsl")]
        out: std::path::PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    staticmap::init_tracing(cli.verbose);

    match cli.command {
        Commands::Build { store, home_url } => {
            staticmap::cmd::build::run(&cli.config, store.as_deref(), home_url.as_deref())?;
        }
        Commands::Schedule { interval, once } => {
            staticmap::cmd::schedule::run(&cli.config, interval, once).await?;
        }
        Commands::Check { strict } => {
            staticmap::cmd::check::run(&cli.config, strict)?;
        }
        Commands::Stylesheet { out } => {
            staticmap::cmd::stylesheet::run(&out)?;
        }
    }

    Ok(())
}
