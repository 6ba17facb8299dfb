//! Per-item crawler hints.

use chrono::{DateTime, Utc};
use staticmap_core::{
    ChangeFreq, ContentItem, ContentKind, Priority, config::SitemapConfig,
    content::parse_store_datetime,
};
use tracing::debug;

/// Hints attached to one sitemap entry.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PageMetadata {
    pub priority: Option<Priority>,
    pub change_freq: Option<ChangeFreq>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Compute priority, change frequency and last-modified time for an item.
pub fn compute_metadata(item: &ContentItem, config: &SitemapConfig) -> PageMetadata {
    PageMetadata {
        priority: Some(priority_for(item.kind, config)),
        change_freq: Some(change_freq_for(item.kind, config)),
        last_modified: if config.include_lastmod {
            last_modified(item)
        } else {
            None
        },
    }
}

/// Base priority for a kind. Posts are raised to the configured floor when
/// the floor is positive and above the base; pages are never raised.
pub fn priority_for(kind: ContentKind, config: &SitemapConfig) -> Priority {
    match kind {
        ContentKind::Page => config.priority.pages,
        ContentKind::Post => {
            let base = config.priority.posts;
            let floor = config.priority.posts_min;
            if floor.value() > 0.0 && base < floor {
                floor
            } else {
                base
            }
        }
    }
}

pub fn change_freq_for(kind: ContentKind, config: &SitemapConfig) -> ChangeFreq {
    match kind {
        ContentKind::Post => config.change_freq.posts,
        ContentKind::Page => config.change_freq.pages,
    }
}

/// Modification time, falling back to creation time when unset. Values that
/// do not parse or are not after the Unix epoch yield `None`.
pub fn last_modified(item: &ContentItem) -> Option<DateTime<Utc>> {
    let raw = item.effective_modified_gmt();
    match parse_store_datetime(raw) {
        Ok(parsed) => parsed.filter(|time| time.timestamp() > 0),
        Err(e) => {
            debug!(id = item.id, error = %e, "omitting lastmod");
            None
        }
    }
}
