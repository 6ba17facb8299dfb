//! Schedule command - rebuilds the sitemap on a fixed interval

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use staticmap_core::config::ScheduleInterval;
use staticmap_generator::BuildOutcome;
use tokio::time::MissedTickBehavior;

use super::build;
use crate::load_config;

/// Run the scheduler.
///
/// Builds immediately, then once per interval until interrupted. Failed
/// builds are logged and retried on the next tick. With `once`, a single
/// build runs and its failure is returned.
pub async fn run(config_path: &Path, interval: Option<ScheduleInterval>, once: bool) -> Result<()> {
    let interval = match interval {
        Some(interval) => interval,
        None => load_config(config_path)?.schedule.interval,
    };
    let period = interval.as_duration();

    tracing::info!(?config_path, ?interval, ?period, once, "Starting scheduler");

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received interrupt, stopping scheduler");
                return Ok(());
            }
        }

        tracing::info!("Starting scheduled build");
        match run_once(config_path.to_path_buf()).await {
            Ok(outcome) => {
                tracing::info!(message = %outcome.message(), "Scheduled build finished");
            }
            Err(e) if once => return Err(e),
            Err(e) => {
                tracing::error!(error = ?e, "Scheduled build failed");
            }
        }

        if once {
            return Ok(());
        }

        tracing::info!(?period, "Sleeping until next build");
    }
}

/// Run one build on the blocking pool. Configuration is reloaded each time.
pub async fn run_once(config_path: PathBuf) -> Result<BuildOutcome> {
    tokio::task::spawn_blocking(move || build::execute(&config_path, None, None))
        .await
        .wrap_err("Build task did not complete")?
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::cmd::test_support::write_site;

    #[tokio::test]
    async fn test_run_once_builds() {
        let dir = TempDir::new().unwrap();
        let config_path = write_site(
            &dir,
            r#"[{"id": 1, "type": "post", "slug": "tick", "date_gmt": "2024-01-01 00:00:00"}]"#,
        );

        run(&config_path, Some(ScheduleInterval::Minutes(1)), true)
            .await
            .unwrap();

        let xml = fs::read_to_string(dir.path().join("public/sitemaps/sitemap.xml")).unwrap();
        assert!(xml.contains("<loc>https://example.com/tick/</loc>"));
    }

    #[tokio::test]
    async fn test_once_reports_failure() {
        let dir = TempDir::new().unwrap();
        let config_path = write_site(&dir, "{ broken");

        let result = run(&config_path, Some(ScheduleInterval::Minutes(1)), true).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_interval_from_config() {
        let dir = TempDir::new().unwrap();
        let config_path = write_site(&dir, "[]");

        let outcome = run_once(config_path.clone()).await.unwrap();
        assert!(outcome.is_empty());
        run(&config_path, None, true).await.unwrap();
    }
}
