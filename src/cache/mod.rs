//! Cache module
//!
//! Page content cache with TTL and the derived metadata cache that feeds search.

pub mod memory;
pub mod metadata;

pub use memory::ContentCache;
pub use metadata::MetadataCache;

use serde::{Deserialize, Serialize};

/// Default content TTL: one hour
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// A normalized page as held by the content cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedDocument {
    /// Page identifier (cache key)
    pub identifier: String,
    /// Page title, never empty
    pub title: String,
    /// Normalized markdown body, never empty
    pub body: String,
    /// When the page was fetched, ms since the Unix epoch
    pub fetched_at_ms: i64,
}

/// Lightweight summary of a cached page, used as the search corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMetadata {
    /// Page identifier
    pub identifier: String,
    /// Page title
    pub title: String,
    /// Markup-free excerpt of the body
    pub excerpt: String,
    /// Absolute URL of the page
    pub source_url: String,
}
