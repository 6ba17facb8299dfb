//! Staticmap Generator Library
//!
//! Sitemap build pipeline for staticmap.
//!
//! # Modules
//!
//! - [`collector`] - Eligible page collection from a content store
//! - [`metadata`] - Priority, change frequency and last-modified policy
//! - [`partition`] - Fixed-capacity sharding
//! - [`sitemap`] - `urlset` and `sitemapindex` XML rendering
//! - [`stylesheet`] - XSLT stylesheet discovery
//! - [`output`] - Staged publishing and the build lock
//! - [`build`] - Build orchestration

pub mod build;
pub mod collector;
pub mod metadata;
pub mod output;
pub mod partition;
pub mod sitemap;
pub mod stylesheet;

pub use build::{BuildError, BuildOutcome, BuildStats, Builder};
pub use collector::{CollectedItem, CollectorError, PageCollector};
pub use metadata::{PageMetadata, compute_metadata};
pub use output::{BuildLock, OutputError, OutputWriter, RenderedFile};
pub use partition::partition;
pub use sitemap::{PageDescriptor, SitemapFileDescriptor, SitemapRenderer, default_stylesheet};
pub use stylesheet::resolve_stylesheet_url;
