use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::Clock;

use super::{
    CacheEntry, KeyValueStore, MemoryTier, DEFAULT_DURABLE_MAX_BYTES, DEFAULT_MEMORY_CAPACITY,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TieredCacheConfig {
    /// Prefix for keys in the string tiers, e.g. `recs`.
    pub namespace: String,
    pub ttl: Duration,
    pub memory_capacity: usize,
    pub durable_max_bytes: usize,
}

impl TieredCacheConfig {
    pub fn new(namespace: impl Into<String>, ttl: Duration) -> Self {
        Self {
            namespace: namespace.into(),
            ttl,
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
            durable_max_bytes: DEFAULT_DURABLE_MAX_BYTES,
        }
    }

    pub fn with_memory_capacity(mut self, memory_capacity: usize) -> Self {
        self.memory_capacity = memory_capacity.max(1);
        self
    }

    pub fn with_durable_max_bytes(mut self, durable_max_bytes: usize) -> Self {
        self.durable_max_bytes = durable_max_bytes;
        self
    }
}

enum StoreRead<T> {
    Hit(CacheEntry<T>),
    Miss,
}

/// Promote-on-read, write-through cache over memory, session and durable tiers.
///
/// Tier 1 is authoritative for the life of the process; the string tiers are
/// advisory and may lag behind it after a failed write.
pub struct TieredCache<T> {
    config: TieredCacheConfig,
    memory: MemoryTier<T>,
    session: Option<Arc<dyn KeyValueStore>>,
    durable: Option<Arc<dyn KeyValueStore>>,
    clock: Arc<dyn Clock>,
}

impl<T> TieredCache<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(config: TieredCacheConfig, clock: Arc<dyn Clock>) -> Self {
        let memory = MemoryTier::new(config.memory_capacity);
        Self { config, memory, session: None, durable: None, clock }
    }

    pub fn with_session_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.session = Some(store);
        self
    }

    pub fn with_durable_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.durable = Some(store);
        self
    }

    pub fn config(&self) -> &TieredCacheConfig {
        &self.config
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}:{}", self.config.namespace, key)
    }

    fn key_prefix(&self) -> String {
        format!("{}:", self.config.namespace)
    }

    pub async fn get(&self, key: &str) -> Option<T> {
        let now = self.clock.now();

        match self.memory.get(key) {
            Some(entry) if !entry.is_expired(now, self.config.ttl) => return Some(entry.payload),
            Some(_) => self.memory.remove(key),
            None => {}
        }

        let storage_key = self.storage_key(key);

        if let Some(session) = &self.session {
            let read = self.read_store(session.as_ref(), &storage_key, now).await;
            if let StoreRead::Hit(entry) = read {
                debug!(
                    event_name = "cache.promote",
                    tier = session.name(),
                    key,
                    "session hit promoted"
                );
                let payload = entry.payload.clone();
                self.memory.insert(key.to_owned(), entry);
                return Some(payload);
            }
        }

        if let Some(durable) = &self.durable {
            let read = self.read_store(durable.as_ref(), &storage_key, now).await;
            if let StoreRead::Hit(entry) = read {
                debug!(
                    event_name = "cache.promote",
                    tier = durable.name(),
                    key,
                    "durable hit promoted"
                );
                if let Some(session) = &self.session {
                    if let Ok(raw) = serde_json::to_string(&entry) {
                        if let Err(error) = session.set(&storage_key, &raw).await {
                            warn!(
                                event_name = "cache.promote_failed",
                                tier = session.name(),
                                key,
                                error = %error,
                                "could not promote durable entry into session tier"
                            );
                        }
                    }
                }
                let payload = entry.payload.clone();
                self.memory.insert(key.to_owned(), entry);
                return Some(payload);
            }
        }

        None
    }

    async fn read_store(
        &self,
        store: &dyn KeyValueStore,
        storage_key: &str,
        now: DateTime<Utc>,
    ) -> StoreRead<T> {
        let raw = match store.get(storage_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return StoreRead::Miss,
            Err(error) => {
                warn!(
                    event_name = "cache.read_failed",
                    tier = store.name(),
                    key = storage_key,
                    error = %error,
                    "cache tier read failed"
                );
                return StoreRead::Miss;
            }
        };

        match serde_json::from_str::<CacheEntry<T>>(&raw) {
            Ok(entry) if !entry.is_expired(now, self.config.ttl) => StoreRead::Hit(entry),
            Ok(_) => {
                debug!(
                    event_name = "cache.expired",
                    tier = store.name(),
                    key = storage_key,
                    "stale entry removed"
                );
                self.remove_quietly(store, storage_key).await;
                StoreRead::Miss
            }
            Err(error) => {
                warn!(
                    event_name = "cache.malformed",
                    tier = store.name(),
                    key = storage_key,
                    error = %error,
                    "malformed cache entry evicted"
                );
                self.remove_quietly(store, storage_key).await;
                StoreRead::Miss
            }
        }
    }

    async fn remove_quietly(&self, store: &dyn KeyValueStore, storage_key: &str) {
        if let Err(error) = store.remove(storage_key).await {
            warn!(
                event_name = "cache.remove_failed",
                tier = store.name(),
                key = storage_key,
                error = %error,
                "cache entry removal failed"
            );
        }
    }

    /// Write to every tier. Tier 1 always succeeds; a failure in either string
    /// tier skips that tier and triggers a durable cleanup pass.
    pub async fn set(&self, key: &str, payload: T) {
        let entry = CacheEntry::new(payload, self.clock.now());
        let raw = serde_json::to_string(&entry);
        self.memory.insert(key.to_owned(), entry);

        let raw = match raw {
            Ok(raw) => raw,
            Err(error) => {
                warn!(
                    event_name = "cache.serialize_failed",
                    key,
                    error = %error,
                    "entry kept in memory only"
                );
                return;
            }
        };

        let storage_key = self.storage_key(key);
        let mut write_failed = false;

        if let Some(session) = &self.session {
            if let Err(error) = session.set(&storage_key, &raw).await {
                warn!(
                    event_name = "cache.write_failed",
                    tier = session.name(),
                    key,
                    error = %error,
                    "cache tier write skipped"
                );
                write_failed = true;
            }
        }

        if let Some(durable) = &self.durable {
            if raw.len() > self.config.durable_max_bytes {
                debug!(
                    event_name = "cache.durable_skipped",
                    key,
                    bytes = raw.len(),
                    limit = self.config.durable_max_bytes,
                    "entry too large for durable tier"
                );
            } else if let Err(error) = durable.set(&storage_key, &raw).await {
                warn!(
                    event_name = "cache.write_failed",
                    tier = durable.name(),
                    key,
                    error = %error,
                    "cache tier write skipped"
                );
                write_failed = true;
            }
        }

        if write_failed {
            self.cleanup_expired().await;
        }
    }

    pub async fn invalidate(&self, key: &str) {
        self.memory.remove(key);
        let storage_key = self.storage_key(key);
        for store in [&self.session, &self.durable].into_iter().flatten() {
            self.remove_quietly(store.as_ref(), &storage_key).await;
        }
    }

    /// Evict expired and malformed durable entries under this namespace.
    /// Returns how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        let Some(durable) = &self.durable else {
            return 0;
        };

        let keys = match durable.keys(&self.key_prefix()).await {
            Ok(keys) => keys,
            Err(error) => {
                warn!(
                    event_name = "cache.cleanup_failed",
                    tier = durable.name(),
                    error = %error,
                    "could not list durable keys"
                );
                return 0;
            }
        };

        let now = self.clock.now();
        let mut evicted = 0;
        for key in keys {
            let stale = match durable.get(&key).await {
                Ok(Some(raw)) => match serde_json::from_str::<CacheEntry<serde_json::Value>>(&raw) {
                    Ok(entry) => entry.is_expired(now, self.config.ttl),
                    Err(_) => true,
                },
                Ok(None) => false,
                Err(_) => false,
            };
            if stale {
                self.remove_quietly(durable.as_ref(), &key).await;
                evicted += 1;
            }
        }

        info!(
            event_name = "cache.cleanup",
            namespace = %self.config.namespace,
            evicted,
            "durable cache cleanup pass finished"
        );
        evicted
    }

    pub async fn memory_len(&self) -> usize {
        self.memory.len()
    }

    /// Drop tier 1 only, as a restarted process would see it.
    pub async fn clear_memory(&self) {
        self.memory.clear();
    }
}
