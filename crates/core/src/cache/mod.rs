//! Read-through / write-through cache over three tiers: an in-process map,
//! a session-scoped string store, and a durable string store.

mod memory;
mod session;
mod tiered;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;

pub use memory::MemoryTier;
pub use session::SessionStore;
pub use tiered::{TieredCache, TieredCacheConfig};

/// 30 minutes.
pub const RECOMMENDATION_TTL_SECS: i64 = 30 * 60;
/// 1 hour.
pub const TRENDING_TTL_SECS: i64 = 60 * 60;
/// Entries larger than this stay out of the durable tier.
pub const DEFAULT_DURABLE_MAX_BYTES: usize = 64 * 1024;
pub const DEFAULT_MEMORY_CAPACITY: usize = 256;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub payload: T,
    pub timestamp: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(payload: T, timestamp: DateTime<Utc>) -> Self {
        Self { payload, timestamp }
    }

    /// Stale once strictly older than `ttl`.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.timestamp > ttl
    }
}

/// String key-value store backing the session and durable tiers.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Short tier name used in log events.
    fn name(&self) -> &'static str;
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
    /// Keys starting with `prefix`.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::CacheEntry;

    #[test]
    fn entry_expires_strictly_after_ttl() {
        let written = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).single().expect("valid time");
        let entry = CacheEntry::new("payload", written);
        let ttl = Duration::minutes(30);

        assert!(!entry.is_expired(written + ttl - Duration::seconds(1), ttl));
        assert!(!entry.is_expired(written + ttl, ttl));
        assert!(entry.is_expired(written + ttl + Duration::seconds(1), ttl));
    }
}
