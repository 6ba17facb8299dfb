//! Staticmap Core Library
//!
//! Configuration, error handling, the content-store contract and the crawler
//! hint types shared by the staticmap generator and CLI.

pub mod config;
pub mod content;
pub mod error;
pub mod hints;
pub mod store;

pub use config::Config;
pub use content::{ContentItem, ContentKind, PostStatus};
pub use error::{CoreError, Result};
pub use hints::{ChangeFreq, Priority};
pub use store::{ContentStore, MemoryStore, SnapshotStore};
