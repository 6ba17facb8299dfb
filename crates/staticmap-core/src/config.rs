//! Build configuration management.
//!
//! Every option has a default, so a configuration file only needs the
//! `[site] home_url` key. The loaded [`Config`] is immutable for the duration
//! of a build and is passed explicitly to each stage.

use std::{
    path::{Path, PathBuf},
    str::FromStr,
    sync::LazyLock,
    time::Duration,
};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    error::{CoreError, Result},
    hints::{ChangeFreq, Priority},
};

/// Protocol maximum number of URLs in one sitemap file.
pub const MAX_ITEMS_PER_SITEMAP: usize = 50_000;

/// File name of the entry-point sitemap (single urlset or index).
pub const SITEMAP_FILE: &str = "sitemap.xml";

/// Longest scheduler period, in minutes, that still fits a `Duration` in seconds.
pub const MAX_INTERVAL_MINUTES: u64 = u64::MAX / 60;

static FOLDER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("folder pattern is valid"));

static MEMORY_SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+)\s*([kmg]?)b?$").expect("memory pattern is valid"));

/// Main configuration structure for staticmap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Site-wide settings.
    pub site: SiteConfig,

    /// Content store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Sitemap generation settings.
    #[serde(default)]
    pub sitemap: SitemapConfig,

    /// Optional XSLT stylesheet settings.
    #[serde(default)]
    pub stylesheet: StylesheetConfig,

    /// Resource limits for a single build.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Interval used by the scheduler.
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Site-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Public home URL (e.g., "https://example.com").
    pub home_url: String,

    /// Document root the sitemap folder is created in.
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,

    /// Identifier of the item served as the home page, excluded from listings.
    #[serde(default)]
    pub front_page_id: Option<u64>,
}

/// Content store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON snapshot of the content table.
    #[serde(default = "default_snapshot")]
    pub snapshot: PathBuf,
}

/// Sitemap generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitemapConfig {
    /// Maximum number of URLs per sitemap file.
    #[serde(default = "default_items_per_sitemap")]
    pub items_per_sitemap: usize,

    /// Output folder name under the public directory.
    #[serde(default = "default_folder")]
    pub folder: String,

    #[serde(default = "default_true")]
    pub include_posts: bool,

    #[serde(default = "default_true")]
    pub include_pages: bool,

    /// Emit `<lastmod>` for each URL.
    #[serde(default = "default_true")]
    pub include_lastmod: bool,

    /// Remove previously generated output when the corpus is empty.
    #[serde(default)]
    pub clear_on_empty: bool,

    #[serde(default)]
    pub priority: PriorityConfig,

    #[serde(default)]
    pub change_freq: ChangeFreqConfig,
}

/// Default priorities per content kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriorityConfig {
    #[serde(default = "default_priority_posts")]
    pub posts: Priority,

    /// Floor applied to posts only; `0.0` disables it.
    #[serde(default = "default_priority_posts_min")]
    pub posts_min: Priority,

    #[serde(default = "default_priority_pages")]
    pub pages: Priority,
}

/// Default change frequencies per content kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChangeFreqConfig {
    #[serde(default = "default_change_freq_posts")]
    pub posts: ChangeFreq,

    #[serde(default = "default_change_freq_pages")]
    pub pages: ChangeFreq,
}

/// XSLT stylesheet configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StylesheetConfig {
    /// Directory probed for `sitemap.xsl`.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Public URL of `dir`.
    #[serde(default)]
    pub url: Option<String>,
}

/// Resource limits for a single build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Wall-clock budget in seconds; `0` or absent means unlimited.
    #[serde(default)]
    pub time_limit_secs: Option<u64>,

    /// Cap on rendered output held in memory, e.g. "64M".
    #[serde(default)]
    pub memory_limit: Option<String>,
}

/// Scheduler configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub interval: ScheduleInterval,
}

/// How often the scheduler triggers a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScheduleInterval {
    /// A named cadence.
    Named(NamedInterval),
    /// A number of minutes.
    Minutes(u64),
}

/// Named scheduler cadences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamedInterval {
    Hourly,
    TwiceDaily,
    Daily,
}

impl Default for ScheduleInterval {
    fn default() -> Self {
        Self::Named(NamedInterval::Daily)
    }
}

impl ScheduleInterval {
    /// Length of one period.
    pub fn as_duration(&self) -> Duration {
        let minutes = match self {
            Self::Named(NamedInterval::Hourly) => 60,
            Self::Named(NamedInterval::TwiceDaily) => 12 * 60,
            Self::Named(NamedInterval::Daily) => 24 * 60,
            Self::Minutes(minutes) => *minutes,
        };
        Duration::from_secs(minutes.saturating_mul(60))
    }

    fn is_valid(&self) -> bool {
        match self {
            Self::Named(_) => true,
            Self::Minutes(minutes) => (1..=MAX_INTERVAL_MINUTES).contains(minutes),
        }
    }
}

impl FromStr for ScheduleInterval {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hourly" => Ok(Self::Named(NamedInterval::Hourly)),
            "twicedaily" => Ok(Self::Named(NamedInterval::TwiceDaily)),
            "daily" => Ok(Self::Named(NamedInterval::Daily)),
            other => other
                .parse::<u64>()
                .ok()
                .map(Self::Minutes)
                .filter(Self::is_valid)
                .ok_or_else(|| {
                    CoreError::config(format!(
                        "invalid schedule interval {s:?}: expected hourly, twicedaily, daily or minutes"
                    ))
                }),
        }
    }
}

// Default value functions
fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_snapshot() -> PathBuf {
    PathBuf::from("content.json")
}

fn default_items_per_sitemap() -> usize {
    1000
}

fn default_folder() -> String {
    "sitemaps".to_string()
}

fn default_true() -> bool {
    true
}

fn default_priority_posts() -> Priority {
    Priority::literal(0.6)
}

fn default_priority_posts_min() -> Priority {
    Priority::literal(0.2)
}

fn default_priority_pages() -> Priority {
    Priority::literal(0.6)
}

fn default_change_freq_posts() -> ChangeFreq {
    ChangeFreq::Monthly
}

fn default_change_freq_pages() -> ChangeFreq {
    ChangeFreq::Weekly
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            snapshot: default_snapshot(),
        }
    }
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            items_per_sitemap: default_items_per_sitemap(),
            folder: default_folder(),
            include_posts: true,
            include_pages: true,
            include_lastmod: true,
            clear_on_empty: false,
            priority: PriorityConfig::default(),
            change_freq: ChangeFreqConfig::default(),
        }
    }
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            posts: default_priority_posts(),
            posts_min: default_priority_posts_min(),
            pages: default_priority_pages(),
        }
    }
}

impl Default for ChangeFreqConfig {
    fn default() -> Self {
        Self {
            posts: default_change_freq_posts(),
            pages: default_change_freq_pages(),
        }
    }
}

impl LimitsConfig {
    /// Time budget for one build, if any.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Memory cap in bytes, if any.
    pub fn memory_limit_bytes(&self) -> Result<Option<u64>> {
        self.memory_limit
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(parse_memory_size)
            .transpose()
    }
}

/// Parse a size such as `512K`, `64M` or `1G` into bytes.
pub fn parse_memory_size(raw: &str) -> Result<u64> {
    let invalid =
        || CoreError::config(format!("invalid memory limit {raw:?}, expected e.g. \"64M\""));

    let captures = MEMORY_SIZE.captures(raw.trim()).ok_or_else(invalid)?;
    let amount: u64 = captures[1].parse().map_err(|_| invalid())?;
    let multiplier = match captures[2].to_ascii_lowercase().as_str() {
        "k" => 1 << 10,
        "m" => 1 << 20,
        "g" => 1 << 30,
        _ => 1,
    };

    amount
        .checked_mul(multiplier)
        .filter(|bytes| *bytes > 0)
        .ok_or_else(invalid)
}

/// Whether a folder name is safe to create under the public directory.
pub fn is_valid_folder_name(name: &str) -> bool {
    FOLDER_NAME.is_match(name) && name != "." && name != ".."
}

impl Config {
    /// Create a configuration with every default for the given home URL.
    pub fn new(home_url: impl Into<String>) -> Self {
        Self {
            site: SiteConfig {
                home_url: home_url.into(),
                public_dir: default_public_dir(),
                front_page_id: None,
            },
            store: StoreConfig::default(),
            sitemap: SitemapConfig::default(),
            stylesheet: StylesheetConfig::default(),
            limits: LimitsConfig::default(),
            schedule: ScheduleConfig::default(),
        }
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `STATICMAP__SECTION__KEY` environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(
                config::Environment::with_prefix("STATICMAP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let home = self.site.home_url.trim();
        if home.is_empty() {
            return Err(CoreError::config("site.home_url cannot be empty"));
        }
        let parsed = url::Url::parse(home).map_err(|e| {
            CoreError::config_with_source(format!("site.home_url is not a valid URL: {home}"), e)
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CoreError::config(format!(
                "site.home_url must use http or https, got {}",
                parsed.scheme()
            )));
        }

        if home.ends_with('/') {
            tracing::warn!("site.home_url should not have a trailing slash");
        }

        let items = self.sitemap.items_per_sitemap;
        if items == 0 || items > MAX_ITEMS_PER_SITEMAP {
            return Err(CoreError::config(format!(
                "sitemap.items_per_sitemap must be between 1 and {MAX_ITEMS_PER_SITEMAP}, got {items}"
            )));
        }

        if !is_valid_folder_name(&self.sitemap.folder) {
            return Err(CoreError::config(format!(
                "sitemap.folder {:?} may only contain letters, digits, '_', '.' and '-'",
                self.sitemap.folder
            )));
        }

        if self.stylesheet.dir.is_some() && self.stylesheet.url.is_none() {
            return Err(CoreError::config(
                "stylesheet.url is required when stylesheet.dir is set",
            ));
        }
        if let Some(url) = &self.stylesheet.url {
            url::Url::parse(url).map_err(|e| {
                CoreError::config_with_source(format!("stylesheet.url is not a valid URL: {url}"), e)
            })?;
        }

        self.limits.memory_limit_bytes()?;

        if !self.schedule.interval.is_valid() {
            return Err(CoreError::config(format!(
                "schedule.interval must be between 1 and {MAX_INTERVAL_MINUTES} minutes"
            )));
        }

        Ok(())
    }

    /// Home URL without a trailing slash.
    pub fn home_url(&self) -> &str {
        self.site.home_url.trim_end_matches('/')
    }

    /// Directory the sitemap files are published in.
    pub fn output_dir(&self) -> PathBuf {
        self.site.public_dir.join(&self.sitemap.folder)
    }

    /// Public URL of a file inside the sitemap folder.
    pub fn sitemap_file_url(&self, file_name: &str) -> String {
        format!("{}/{}/{}", self.home_url(), self.sitemap.folder, file_name)
    }

    /// Public URL of the entry-point sitemap.
    pub fn sitemap_url(&self) -> String {
        self.sitemap_file_url(SITEMAP_FILE)
    }
}
