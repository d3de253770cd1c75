use moka::policy::EvictionPolicy;
use moka::sync::Cache;

use super::CacheEntry;

/// Tier 1: process-local moka cache with a capacity bound.
///
/// Least-recently-used entries go first, so a fresh write is always admitted.
/// Expiry is not delegated to moka; callers check `CacheEntry::timestamp`
/// against their own clock.
pub struct MemoryTier<T> {
    cache: Cache<String, CacheEntry<T>>,
}

impl<T> MemoryTier<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(capacity: usize) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity.max(1) as u64)
            .eviction_policy(EvictionPolicy::lru())
            .build();
        Self { cache }
    }

    pub fn get(&self, key: &str) -> Option<CacheEntry<T>> {
        self.cache.get(key)
    }

    pub fn insert(&self, key: String, entry: CacheEntry<T>) {
        self.cache.insert(key, entry);
    }

    pub fn remove(&self, key: &str) {
        self.cache.invalidate(key);
    }

    /// Entry count after pending evictions have been applied.
    pub fn len(&self) -> usize {
        self.cache.run_pending_tasks();
        self.cache.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}
