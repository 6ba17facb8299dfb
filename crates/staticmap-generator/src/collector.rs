//! Page collection.
//!
//! Queries the content store for publishable items and keeps those whose
//! permalink is an internal, non-home URL.

use staticmap_core::{Config, ContentItem, ContentKind, ContentStore, CoreError};
use thiserror::Error;
use tracing::{debug, info};

/// Page collection errors.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// The content store query failed.
    #[error("content store query failed: {0}")]
    Store(#[from] CoreError),
}

/// Result type for collector operations.
pub type Result<T> = std::result::Result<T, CollectorError>;

/// An item that passed filtering, with its resolved public URL.
#[derive(Debug, Clone)]
pub struct CollectedItem {
    pub item: ContentItem,
    pub permalink: String,
}

impl CollectedItem {
    pub fn kind(&self) -> ContentKind {
        self.item.kind
    }
}

/// Why an item was left out of the sitemap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    NoPermalink,
    HomeUrl,
    FrontPage,
    External,
}

/// Collects sitemap candidates from a content store.
pub struct PageCollector<'a> {
    config: &'a Config,
    store: &'a dyn ContentStore,
}

impl<'a> PageCollector<'a> {
    #[must_use]
    pub fn new(config: &'a Config, store: &'a dyn ContentStore) -> Self {
        Self { config, store }
    }

    /// Kinds enabled by configuration.
    pub fn kinds(&self) -> Vec<ContentKind> {
        let mut kinds = Vec::with_capacity(2);
        if self.config.sitemap.include_posts {
            kinds.push(ContentKind::Post);
        }
        if self.config.sitemap.include_pages {
            kinds.push(ContentKind::Page);
        }
        kinds
    }

    /// Collect eligible items in store order.
    pub fn collect(&self) -> Result<Vec<CollectedItem>> {
        let kinds = self.kinds();
        if kinds.is_empty() {
            info!("posts and pages are both disabled");
            return Ok(Vec::new());
        }

        let items = self.store.published_items(&kinds)?;
        let total = items.len();

        let collected: Vec<CollectedItem> = items
            .into_iter()
            .filter_map(|item| {
                let permalink = self.store.permalink(&item).map(|p| p.trim().to_string());
                match self.exclusion(&item, permalink.as_deref()) {
                    Some(reason) => {
                        debug!(id = item.id, ?reason, "excluding item");
                        None
                    }
                    None => permalink.map(|permalink| CollectedItem { item, permalink }),
                }
            })
            .collect();

        info!(
            queried = total,
            collected = collected.len(),
            "collected sitemap candidates"
        );
        Ok(collected)
    }

    /// Reason an item must not be listed, if any.
    pub fn exclusion(&self, item: &ContentItem, permalink: Option<&str>) -> Option<Exclusion> {
        let Some(permalink) = permalink.map(str::trim).filter(|p| !p.is_empty()) else {
            return Some(Exclusion::NoPermalink);
        };

        let home = self.config.home_url();
        if permalink.trim_end_matches('/') == home {
            return Some(Exclusion::HomeUrl);
        }
        if self.config.site.front_page_id == Some(item.id) {
            return Some(Exclusion::FrontPage);
        }
        if !is_internal(permalink, home) {
            return Some(Exclusion::External);
        }
        None
    }
}

/// Whether `url` lives under `home` (not merely shares a prefix with it).
fn is_internal(url: &str, home: &str) -> bool {
    url.strip_prefix(home)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '?', '#']))
}
