//! Build orchestration.
//!
//! Coordinates a full sitemap build: collect, compute metadata, partition,
//! render and publish.

use std::{
    num::NonZeroUsize,
    path::PathBuf,
    time::{Duration, Instant},
};

use rayon::prelude::*;
use staticmap_core::{Config, ContentStore, config::SITEMAP_FILE};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    collector::{CollectorError, PageCollector},
    metadata::compute_metadata,
    output::{OutputError, OutputWriter, RenderedFile},
    partition::partition,
    sitemap::{PageDescriptor, SitemapFileDescriptor, SitemapRenderer},
    stylesheet::resolve_stylesheet_url,
};

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The content store could not be read.
    #[error("data source error: {0}")]
    DataSource(#[from] CollectorError),

    /// The output folder could not be written.
    #[error("filesystem error: {0}")]
    Filesystem(OutputError),

    /// Another build holds the output folder.
    #[error("another build is running for {0}")]
    Locked(PathBuf),

    /// The build ran past its time budget.
    #[error("time limit of {limit:?} exceeded during {stage}")]
    TimeLimitExceeded { limit: Duration, stage: &'static str },

    /// Rendered output grew past the memory budget.
    #[error("memory limit of {limit} bytes exceeded ({used} bytes rendered)")]
    MemoryLimitExceeded { limit: u64, used: u64 },
}

impl From<OutputError> for BuildError {
    fn from(err: OutputError) -> Self {
        match err {
            OutputError::Locked(path) => Self::Locked(path),
            other => Self::Filesystem(other),
        }
    }
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Number of URLs listed.
    pub pages: usize,

    /// Number of urlset documents.
    pub shards: usize,

    /// Number of files written, index included.
    pub files: usize,

    /// Total bytes written.
    pub bytes: u64,

    /// Public URL of the entry-point sitemap.
    pub sitemap_url: String,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// Result of a build that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Sitemap files were published.
    Written { stats: BuildStats },

    /// No eligible content. `cleared` is set when prior output was removed.
    Empty { cleared: bool },
}

impl BuildOutcome {
    /// Human-readable summary.
    pub fn message(&self) -> String {
        match self {
            Self::Written { stats } if stats.shards > 1 => format!(
                "Sitemap index with {} sitemaps ({} URLs) written to {}",
                stats.shards, stats.pages, stats.sitemap_url
            ),
            Self::Written { stats } => format!(
                "Sitemap with {} URLs written to {}",
                stats.pages, stats.sitemap_url
            ),
            Self::Empty { cleared: true } => {
                "No content to include in the sitemap; previous sitemap removed".to_string()
            }
            Self::Empty { cleared: false } => "No content to include in the sitemap".to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty { .. })
    }

    pub fn stats(&self) -> Option<&BuildStats> {
        match self {
            Self::Written { stats } => Some(stats),
            Self::Empty { .. } => None,
        }
    }
}

/// Time and memory limits for one build.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Budget {
    started: Instant,
    time_limit: Option<Duration>,
    memory_limit: Option<u64>,
}

impl Budget {
    pub(crate) fn new(time_limit: Option<Duration>, memory_limit: Option<u64>) -> Self {
        Self {
            started: Instant::now(),
            time_limit,
            memory_limit,
        }
    }

    pub(crate) fn check_time(&self, stage: &'static str) -> Result<()> {
        match self.time_limit {
            Some(limit) if self.started.elapsed() >= limit => {
                Err(BuildError::TimeLimitExceeded { limit, stage })
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn check_memory(&self, used: u64) -> Result<()> {
        match self.memory_limit {
            Some(limit) if used > limit => Err(BuildError::MemoryLimitExceeded { limit, used }),
            _ => Ok(()),
        }
    }
}

/// Sitemap builder that orchestrates the build process.
#[derive(Debug)]
pub struct Builder<S> {
    config: Config,
    store: S,
}

impl<S: ContentStore> Builder<S> {
    /// Create a new builder.
    #[must_use]
    pub fn new(config: Config, store: S) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute the full build process.
    pub fn build(&self) -> Result<BuildOutcome> {
        let start = Instant::now();
        self.config
            .validate()
            .map_err(|e| BuildError::Config(e.to_string()))?;
        let budget = Budget::new(
            self.config.limits.time_limit(),
            self.config
                .limits
                .memory_limit_bytes()
                .map_err(|e| BuildError::Config(e.to_string()))?,
        );
        let capacity = NonZeroUsize::new(self.config.sitemap.items_per_sitemap)
            .ok_or_else(|| BuildError::Config("items_per_sitemap must be positive".to_string()))?;

        let writer = OutputWriter::new(&self.config.site.public_dir, &self.config.sitemap.folder);
        info!(
            home = self.config.home_url(),
            output = %writer.target_dir().display(),
            "starting sitemap build"
        );

        // 1. Hold the output folder for the whole build
        let _lock = writer.lock()?;

        // 2. Collect eligible items
        let collected = PageCollector::new(&self.config, &self.store).collect()?;
        budget.check_time("collect")?;

        // 3. Compute metadata and build descriptors, keeping store order
        let pages: Vec<PageDescriptor> = collected
            .par_iter()
            .filter_map(|c| {
                PageDescriptor::new(&c.permalink, compute_metadata(&c.item, &self.config.sitemap))
            })
            .collect();
        budget.check_time("metadata")?;

        // 4. Nothing to list
        if pages.is_empty() {
            let cleared = if self.config.sitemap.clear_on_empty {
                writer.clear()?
            } else {
                false
            };
            warn!(cleared, "no content to include in the sitemap");
            return Ok(BuildOutcome::Empty { cleared });
        }

        // 5. Partition and render
        let page_count = pages.len();
        let shards = partition(pages, capacity);
        let shard_count = shards.len();
        let files = self.render(&shards, &budget)?;

        // 6. Publish
        let bytes = writer.publish(&files)?;

        let stats = BuildStats {
            pages: page_count,
            shards: shard_count,
            files: files.len(),
            bytes,
            sitemap_url: self.config.sitemap_url(),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            pages = stats.pages,
            shards = stats.shards,
            files = stats.files,
            bytes = stats.bytes,
            duration_ms = stats.duration_ms,
            "build complete"
        );

        Ok(BuildOutcome::Written { stats })
    }

    /// Render every shard, plus an index when there is more than one.
    fn render(&self, shards: &[Vec<PageDescriptor>], budget: &Budget) -> Result<Vec<RenderedFile>> {
        let stylesheet = resolve_stylesheet_url(&self.config);
        let renderer = SitemapRenderer::new(stylesheet.as_deref());

        let documents: Vec<String> = shards
            .par_iter()
            .enumerate()
            .map(|(index, shard)| {
                budget.check_time("render")?;
                let xml = renderer.render_urlset(shard);
                budget.check_memory(xml.len() as u64)?;
                debug!(shard = index + 1, urls = shard.len(), bytes = xml.len(), "rendered shard");
                Ok(xml)
            })
            .collect::<Result<_>>()?;

        let mut used: u64 = documents.iter().map(|doc| doc.len() as u64).sum();
        budget.check_memory(used)?;

        if documents.len() == 1 {
            let files = documents
                .into_iter()
                .map(|doc| RenderedFile::new(SITEMAP_FILE, doc))
                .collect();
            return Ok(files);
        }

        let last_modified = self
            .store
            .last_modified()
            .map_err(CollectorError::from)?
            .filter(|time| time.timestamp() > 0);

        let mut files: Vec<RenderedFile> = documents
            .into_iter()
            .enumerate()
            .map(|(index, doc)| RenderedFile::new(format!("sitemap-{}.xml", index + 1), doc))
            .collect();

        let descriptors: Vec<SitemapFileDescriptor> = files
            .iter()
            .map(|file| {
                SitemapFileDescriptor::new(&self.config.sitemap_file_url(&file.name), last_modified)
            })
            .collect();

        let index = renderer.render_index(&descriptors);
        used += index.len() as u64;
        budget.check_memory(used)?;
        budget.check_time("render")?;

        info!(sitemaps = descriptors.len(), "rendered sitemap index");
        files.push(RenderedFile::new(SITEMAP_FILE, index));
        Ok(files)
    }
}
