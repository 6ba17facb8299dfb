//! Content-store row model.
//!
//! A [`ContentItem`] is one row of the content table as the store hands it
//! out: identifiers, publication state, and the four datetime columns in the
//! store's own `YYYY-MM-DD HH:MM:SS` representation.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Datetime value the store uses for "never set".
pub const ZERO_DATETIME: &str = "0000-00-00 00:00:00";

/// Type of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Dated blog entry.
    Post,
    /// Static page, optionally nested under a parent page.
    Page,
}

impl ContentKind {
    /// Name used by the store for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Page => "page",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publication status of a content item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Publish,
    Draft,
    Pending,
    Private,
    Future,
    Trash,
}

/// One row of the content table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Store identifier.
    pub id: u64,

    #[serde(default)]
    pub author: u64,

    #[serde(default)]
    pub status: PostStatus,

    /// Non-empty when the item is password protected.
    #[serde(default)]
    pub password: String,

    /// URL slug, may be empty.
    #[serde(default)]
    pub slug: String,

    /// Parent item identifier, `0` for top-level items.
    #[serde(default)]
    pub parent: u64,

    #[serde(rename = "type")]
    pub kind: ContentKind,

    /// Creation time, site-local.
    #[serde(default = "zero_datetime")]
    pub date: String,

    /// Creation time, UTC.
    #[serde(default = "zero_datetime")]
    pub date_gmt: String,

    /// Last modification time, site-local.
    #[serde(default = "zero_datetime")]
    pub modified: String,

    /// Last modification time, UTC.
    #[serde(default = "zero_datetime")]
    pub modified_gmt: String,

    #[serde(default)]
    pub comment_count: u64,

    /// Explicit public URL overriding the computed permalink.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,
}

fn zero_datetime() -> String {
    ZERO_DATETIME.to_string()
}

impl ContentItem {
    /// Create a published item with zeroed timestamps.
    pub fn new(id: u64, kind: ContentKind, slug: impl Into<String>) -> Self {
        Self {
            id,
            author: 0,
            status: PostStatus::Publish,
            password: String::new(),
            slug: slug.into(),
            parent: 0,
            kind,
            date: zero_datetime(),
            date_gmt: zero_datetime(),
            modified: zero_datetime(),
            modified_gmt: zero_datetime(),
            comment_count: 0,
            permalink: None,
        }
    }

    /// Set both creation columns to the same UTC value.
    #[must_use]
    pub fn with_date(mut self, datetime: &str) -> Self {
        self.date = datetime.to_string();
        self.date_gmt = datetime.to_string();
        self
    }

    /// Set both modification columns to the same UTC value.
    #[must_use]
    pub fn with_modified(mut self, datetime: &str) -> Self {
        self.modified = datetime.to_string();
        self.modified_gmt = datetime.to_string();
        self
    }

    /// Whether the item may appear in a public listing.
    pub fn is_public(&self) -> bool {
        self.status == PostStatus::Publish && self.password.is_empty()
    }

    /// Most recent UTC timestamp the item carries: modification time unless it
    /// is unset, creation time otherwise.
    pub fn effective_modified_gmt(&self) -> &str {
        if is_unset_datetime(&self.modified_gmt) {
            &self.date_gmt
        } else {
            &self.modified_gmt
        }
    }
}

/// Whether a store datetime is empty or the all-zero sentinel.
pub fn is_unset_datetime(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == ZERO_DATETIME
}

/// Parse a store datetime into a UTC instant.
///
/// The value is decomposed field by field (year, month, day, hour, minute,
/// second) rather than handed to a format parser. Unset values yield `None`.
pub fn parse_store_datetime(value: &str) -> Result<Option<DateTime<Utc>>> {
    if is_unset_datetime(value) {
        return Ok(None);
    }

    let invalid = || CoreError::Timestamp(value.to_string());

    let (date, time) = value.trim().split_once(' ').ok_or_else(invalid)?;
    let date_parts = split_fields(date, '-').ok_or_else(invalid)?;
    let time_parts = split_fields(time, ':').ok_or_else(invalid)?;

    let [year, month, day] = date_parts;
    let [hour, minute, second] = time_parts;

    let year = i32::try_from(year).map_err(|_| invalid())?;
    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .ok_or_else(invalid)?;

    Ok(Some(naive.and_utc()))
}

fn split_fields(value: &str, separator: char) -> Option<[u32; 3]> {
    let mut fields = value.split(separator).map(|part| part.parse::<u32>().ok());
    let parsed = [fields.next()??, fields.next()??, fields.next()??];
    if fields.next().is_some() {
        return None;
    }
    Some(parsed)
}
