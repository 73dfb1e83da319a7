//! In-memory page content cache

use super::CachedDocument;
use crate::error::{Error, Result};
use crate::utils::time::{duration_ms, Clock};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Page content cache.
///
/// Entries are never evicted; an expired entry reads as absent until the next
/// `put` for the same identifier overwrites it.
pub struct ContentCache {
    entries: RwLock<HashMap<String, CachedDocument>>,
    ttl_ms: i64,
    clock: Arc<dyn Clock>,
}

impl ContentCache {
    /// Create an empty content cache
    #[must_use]
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl_ms: duration_ms(ttl),
            clock,
        }
    }

    fn is_fresh(&self, entry: &CachedDocument) -> bool {
        self.clock.now_ms() - entry.fetched_at_ms < self.ttl_ms
    }

    /// Fresh entry for `identifier`, if any
    pub fn get(&self, identifier: &str) -> Option<CachedDocument> {
        let entries = self.entries.read();
        entries
            .get(identifier)
            .filter(|entry| self.is_fresh(entry))
            .cloned()
    }

    /// Insert or overwrite the entry for `identifier`, stamped with the current time
    pub fn put(&self, identifier: &str, title: &str, body: &str) -> Result<CachedDocument> {
        if title.trim().is_empty() {
            return Err(Error::Content(format!("{identifier}: empty title")));
        }
        if body.trim().is_empty() {
            return Err(Error::Content(format!("{identifier}: empty body")));
        }

        let document = CachedDocument {
            identifier: identifier.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            fetched_at_ms: self.clock.now_ms(),
        };

        self.entries
            .write()
            .insert(identifier.to_string(), document.clone());

        Ok(document)
    }

    /// Number of entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds no entries at all
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Number of entries still within the TTL
    pub fn fresh_count(&self) -> usize {
        let entries = self.entries.read();
        entries.values().filter(|entry| self.is_fresh(entry)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::time::ManualClock;

    fn cache_with_clock() -> (ContentCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        let cache = ContentCache::new(Duration::from_secs(3600), clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_put_and_get() {
        let (cache, _clock) = cache_with_clock();
        assert!(cache.get("docs/overview").is_none());

        let stored = cache.put("docs/overview", "Overview", "# Overview").unwrap();
        assert_eq!(stored.fetched_at_ms, 1_000);

        let cached = cache.get("docs/overview").unwrap();
        assert_eq!(cached, stored);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_entry_expires_at_ttl_boundary() {
        let (cache, clock) = cache_with_clock();
        cache.put("docs/overview", "Overview", "body").unwrap();

        clock.advance(Duration::from_millis(3_599_999));
        assert!(cache.get("docs/overview").is_some());

        clock.advance(Duration::from_millis(1));
        assert!(cache.get("docs/overview").is_none());
        assert_eq!(cache.fresh_count(), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_put_overwrites_entry() {
        let (cache, clock) = cache_with_clock();

        cache.put("docs/overview", "Old", "old body").unwrap();
        clock.advance(Duration::from_secs(7200));
        cache.put("docs/overview", "New", "new body").unwrap();

        let cached = cache.get("docs/overview").unwrap();
        assert_eq!(cached.title, "New");
        assert_eq!(cached.body, "new body");
        assert_eq!(cached.fetched_at_ms, 1_000 + 7_200_000);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_put_rejects_empty_content() {
        let (cache, _clock) = cache_with_clock();
        assert!(matches!(
            cache.put("docs/empty", "Title", "   "),
            Err(Error::Content(_))
        ));
        assert!(matches!(
            cache.put("docs/empty", "", "body"),
            Err(Error::Content(_))
        ));
        assert!(cache.is_empty());
    }
}
