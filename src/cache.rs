//! Shared result cache collaborator.
//!
//! The frontier queue consults the cache (read-only) when deciding an
//! item's insertion tier: an item whose result is already cached needs
//! negligible work, so it drains from the front of the queue. The cache
//! itself is owned by the crawl session, not the queue, and is also where
//! workers publish finished results so later duplicates resolve instantly.

use std::sync::Arc;

use dashmap::DashMap;

use crate::item::CheckResult;

/// Read-side membership query the queue uses for priority-tier decisions.
///
/// Implementations must be cheap and non-blocking: the queue calls
/// [`contains`](ResultCache::contains) while holding its internal lock.
pub trait ResultCache: Send + Sync {
    fn contains(&self, key: &str) -> bool;
}

/// In-memory result cache shared by all workers of a crawl session.
#[derive(Debug, Default)]
pub struct MemoryResultCache {
    results: DashMap<String, CheckResult>,
}

impl MemoryResultCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, key: impl Into<String>, result: CheckResult) {
        self.results.insert(key.into(), result);
    }

    pub fn get(&self, key: &str) -> Option<CheckResult> {
        self.results.get(key).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl ResultCache for MemoryResultCache {
    fn contains(&self, key: &str) -> bool {
        self.results.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::CheckStatus;

    #[test]
    fn membership_follows_inserts() {
        let cache = MemoryResultCache::new();
        assert!(!cache.contains("https://example.com/"));

        cache.insert("https://example.com/", CheckResult::valid());
        assert!(cache.contains("https://example.com/"));
        assert_eq!(
            cache.get("https://example.com/").unwrap().status,
            CheckStatus::Valid
        );
    }

    #[test]
    fn insert_overwrites_previous_result() {
        let cache = MemoryResultCache::new();
        cache.insert("k", CheckResult::valid());
        cache.insert("k", CheckResult::broken("410 Gone"));
        assert_eq!(cache.len(), 1);
        assert!(matches!(
            cache.get("k").unwrap().status,
            CheckStatus::Broken(_)
        ));
    }
}
