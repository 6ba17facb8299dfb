//! Read-only content store contract.
//!
//! The generator never talks to a database directly; it asks a
//! [`ContentStore`] for the published rows, their public URLs and the
//! corpus-wide modification time.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::{
    content::{ContentItem, ContentKind, parse_store_datetime},
    error::{CoreError, Result},
};

/// Source of publishable content.
pub trait ContentStore: Send + Sync {
    /// Published, non-protected items of the given kinds, newest first by
    /// `date_gmt`.
    fn published_items(&self, kinds: &[ContentKind]) -> Result<Vec<ContentItem>>;

    /// Canonical public URL of an item, if it has one.
    fn permalink(&self, item: &ContentItem) -> Option<String>;

    /// Most recent modification time over all published content.
    fn last_modified(&self) -> Result<Option<DateTime<Utc>>>;
}

/// Compute the public URL of an item.
///
/// `lookup` resolves parent identifiers for nested pages. A parent chain that
/// loops back on itself stops at the first repeated identifier.
pub fn resolve_permalink<'a, F>(home_url: &str, item: &ContentItem, lookup: F) -> Option<String>
where
    F: Fn(u64) -> Option<&'a ContentItem>,
{
    if let Some(permalink) = item.permalink.as_deref() {
        let permalink = permalink.trim();
        return (!permalink.is_empty()).then(|| permalink.to_string());
    }

    let home = home_url.trim_end_matches('/');
    if item.slug.is_empty() {
        return Some(match item.kind {
            ContentKind::Post => format!("{home}/?p={}", item.id),
            ContentKind::Page => format!("{home}/?page_id={}", item.id),
        });
    }

    let mut segments = vec![item.slug.as_str()];
    if item.kind == ContentKind::Page {
        let mut seen = HashSet::from([item.id]);
        let mut parent = item.parent;
        while parent != 0 && seen.insert(parent) {
            let Some(ancestor) = lookup(parent) else {
                break;
            };
            if !ancestor.slug.is_empty() {
                segments.push(ancestor.slug.as_str());
            }
            parent = ancestor.parent;
        }
    }
    segments.reverse();

    Some(format!("{home}/{}/", segments.join("/")))
}

/// In-memory content store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    home_url: String,
    items: Vec<ContentItem>,
    by_id: HashMap<u64, usize>,
}

impl MemoryStore {
    pub fn new(home_url: impl Into<String>, items: Vec<ContentItem>) -> Self {
        let by_id = items
            .iter()
            .enumerate()
            .map(|(index, item)| (item.id, index))
            .collect();
        Self {
            home_url: home_url.into(),
            items,
            by_id,
        }
    }

    /// All rows, regardless of status.
    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn get(&self, id: u64) -> Option<&ContentItem> {
        self.by_id.get(&id).map(|index| &self.items[*index])
    }
}

impl ContentStore for MemoryStore {
    fn published_items(&self, kinds: &[ContentKind]) -> Result<Vec<ContentItem>> {
        let mut published: Vec<ContentItem> = self
            .items
            .iter()
            .filter(|item| item.is_public() && kinds.contains(&item.kind))
            .cloned()
            .collect();

        // Stable sort keeps store order for equal timestamps.
        published.sort_by(|a, b| b.date_gmt.cmp(&a.date_gmt));
        Ok(published)
    }

    fn permalink(&self, item: &ContentItem) -> Option<String> {
        resolve_permalink(&self.home_url, item, |id| self.get(id))
    }

    fn last_modified(&self) -> Result<Option<DateTime<Utc>>> {
        let latest = self
            .items
            .iter()
            .filter(|item| item.is_public())
            .filter_map(|item| {
                let raw = item.effective_modified_gmt();
                match parse_store_datetime(raw) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        warn!(id = item.id, error = %e, "skipping unparseable timestamp");
                        None
                    }
                }
            })
            .max();
        Ok(latest)
    }
}

/// Content store backed by a JSON export of the content table.
///
/// The file holds an array of rows. It is read once, when the store is opened.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl SnapshotStore {
    /// Read a snapshot file.
    pub fn open(path: &Path, home_url: impl Into<String>) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CoreError::data_source_with_source(
                format!("Failed to read content snapshot: {}", path.display()),
                e,
            )
        })?;
        let items: Vec<ContentItem> = serde_json::from_str(&content).map_err(|e| {
            CoreError::data_source_with_source(
                format!("Failed to parse content snapshot: {}", path.display()),
                e,
            )
        })?;

        debug!(path = %path.display(), rows = items.len(), "loaded content snapshot");

        Ok(Self {
            path: path.to_path_buf(),
            inner: MemoryStore::new(home_url, items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.inner.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items().is_empty()
    }
}

impl ContentStore for SnapshotStore {
    fn published_items(&self, kinds: &[ContentKind]) -> Result<Vec<ContentItem>> {
        self.inner.published_items(kinds)
    }

    fn permalink(&self, item: &ContentItem) -> Option<String> {
        self.inner.permalink(item)
    }

    fn last_modified(&self) -> Result<Option<DateTime<Utc>>> {
        self.inner.last_modified()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::content::PostStatus;

    const HOME: &str = "https://example.com";

    fn page(id: u64, slug: &str, parent: u64) -> ContentItem {
        let mut item = ContentItem::new(id, ContentKind::Page, slug);
        item.parent = parent;
        item
    }

    #[test]
    fn test_published_items_filters_and_orders() {
        let mut draft = ContentItem::new(3, ContentKind::Post, "draft");
        draft.status = PostStatus::Draft;
        let mut locked = ContentItem::new(4, ContentKind::Post, "locked");
        locked.password = "hunter2".to_string();

        let store = MemoryStore::new(
            HOME,
            vec![
                ContentItem::new(1, ContentKind::Post, "old").with_date("2023-01-01 00:00:00"),
                ContentItem::new(2, ContentKind::Post, "new").with_date("2024-01-01 00:00:00"),
                draft,
                locked,
                page(5, "about", 0).with_date("2023-06-01 00:00:00"),
            ],
        );

        let posts = store.published_items(&[ContentKind::Post]).unwrap();
        let ids: Vec<u64> = posts.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![2, 1]);

        let all = store
            .published_items(&[ContentKind::Post, ContentKind::Page])
            .unwrap();
        let ids: Vec<u64> = all.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![2, 5, 1]);
    }

    #[test]
    fn test_ties_keep_store_order() {
        let stamp = "2024-01-01 00:00:00";
        let store = MemoryStore::new(
            HOME,
            vec![
                ContentItem::new(10, ContentKind::Post, "a").with_date(stamp),
                ContentItem::new(11, ContentKind::Post, "b").with_date(stamp),
                ContentItem::new(12, ContentKind::Post, "c").with_date(stamp),
            ],
        );
        let ids: Vec<u64> = store
            .published_items(&[ContentKind::Post])
            .unwrap()
            .iter()
            .map(|item| item.id)
            .collect();
        assert_eq!(ids, vec![10, 11, 12]);
    }

    #[test]
    fn test_post_permalink() {
        let store = MemoryStore::new(HOME, vec![]);
        let post = ContentItem::new(1, ContentKind::Post, "hello-world");
        assert_eq!(
            store.permalink(&post).as_deref(),
            Some("https://example.com/hello-world/")
        );
    }

    #[test]
    fn test_nested_page_permalink() {
        let store = MemoryStore::new(
            HOME,
            vec![page(1, "company", 0), page(2, "team", 1), page(3, "alice", 2)],
        );
        let leaf = store.get(3).unwrap().clone();
        assert_eq!(
            store.permalink(&leaf).as_deref(),
            Some("https://example.com/company/team/alice/")
        );
    }

    #[test]
    fn test_page_parent_cycle_terminates() {
        let store = MemoryStore::new(HOME, vec![page(1, "a", 2), page(2, "b", 1)]);
        let item = store.get(1).unwrap().clone();
        assert_eq!(
            store.permalink(&item).as_deref(),
            Some("https://example.com/b/a/")
        );
    }

    #[test]
    fn test_permalink_without_slug() {
        let store = MemoryStore::new(format!("{HOME}/"), vec![]);
        assert_eq!(
            store
                .permalink(&ContentItem::new(9, ContentKind::Post, ""))
                .as_deref(),
            Some("https://example.com/?p=9")
        );
        assert_eq!(
            store
                .permalink(&ContentItem::new(8, ContentKind::Page, ""))
                .as_deref(),
            Some("https://example.com/?page_id=8")
        );
    }

    #[test]
    fn test_explicit_permalink_wins() {
        let store = MemoryStore::new(HOME, vec![]);
        let mut item = ContentItem::new(1, ContentKind::Post, "slug");
        item.permalink = Some("https://elsewhere.org/x".to_string());
        assert_eq!(
            store.permalink(&item).as_deref(),
            Some("https://elsewhere.org/x")
        );

        item.permalink = Some(String::new());
        assert_eq!(store.permalink(&item), None);
    }

    #[test]
    fn test_last_modified_uses_fallback_and_skips_unpublished() {
        let mut draft = ContentItem::new(3, ContentKind::Post, "draft")
            .with_modified("2030-01-01 00:00:00");
        draft.status = PostStatus::Draft;

        let store = MemoryStore::new(
            HOME,
            vec![
                ContentItem::new(1, ContentKind::Post, "a")
                    .with_date("2024-01-01 00:00:00")
                    .with_modified("2024-02-01 00:00:00"),
                ContentItem::new(2, ContentKind::Page, "b").with_date("2024-03-01 12:00:00"),
                draft,
            ],
        );

        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(store.last_modified().unwrap(), Some(expected));
    }

    #[test]
    fn test_last_modified_empty() {
        let store = MemoryStore::new(HOME, vec![]);
        assert_eq!(store.last_modified().unwrap(), None);
    }

    #[test]
    fn test_snapshot_store_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.json");
        std::fs::write(
            &path,
            r#"[
                {"id": 1, "type": "post", "slug": "first", "date_gmt": "2024-01-01 00:00:00"},
                {"id": 2, "type": "page", "slug": "about", "status": "draft"}
            ]"#,
        )
        .unwrap();

        let store = SnapshotStore::open(&path, HOME).unwrap();
        assert_eq!(store.len(), 2);
        let items = store
            .published_items(&[ContentKind::Post, ContentKind::Page])
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].slug, "first");
    }

    #[test]
    fn test_snapshot_store_errors_are_data_source() {
        let dir = tempfile::tempdir().unwrap();

        let missing = SnapshotStore::open(&dir.path().join("missing.json"), HOME).unwrap_err();
        assert!(matches!(missing, CoreError::DataSource { .. }));

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let broken = SnapshotStore::open(&path, HOME).unwrap_err();
        assert!(matches!(broken, CoreError::DataSource { .. }));
    }
}
