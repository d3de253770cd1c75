use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::StoreError;

use super::KeyValueStore;

/// Tier 2: session-scoped string store with a byte quota over keys + values.
#[derive(Debug)]
pub struct SessionStore {
    entries: RwLock<BTreeMap<String, String>>,
    quota_bytes: usize,
}

impl SessionStore {
    pub fn new(quota_bytes: usize) -> Self {
        Self { entries: RwLock::new(BTreeMap::new()), quota_bytes }
    }

    pub async fn used_bytes(&self) -> usize {
        let entries = self.entries.read().await;
        entries.iter().map(|(key, value)| key.len() + value.len()).sum()
    }
}

#[async_trait]
impl KeyValueStore for SessionStore {
    fn name(&self) -> &'static str {
        "session"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        let used: usize = entries
            .iter()
            .filter(|(existing, _)| existing.as_str() != key)
            .map(|(existing, stored)| existing.len() + stored.len())
            .sum();
        let needed = key.len() + value.len();
        let available = self.quota_bytes.saturating_sub(used);
        if needed > available {
            return Err(StoreError::QuotaExceeded { needed, available });
        }
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.keys().filter(|key| key.starts_with(prefix)).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn quota_rejects_oversized_writes() {
        let store = SessionStore::new(16);

        store.set("k1", "12345678").await.expect("fits");
        let error = store.set("k2", "123456789").await.expect_err("over quota");
        assert_eq!(error, StoreError::QuotaExceeded { needed: 11, available: 6 });

        // Replacing an existing key only counts the new value.
        store.set("k1", "abcdefghijklmn").await.expect("replacement fits");
        assert_eq!(store.used_bytes().await, 16);
    }

    #[tokio::test]
    async fn keys_filter_by_prefix() {
        let store = SessionStore::new(1024);
        store.set("recs:a", "1").await.expect("set");
        store.set("recs:b", "2").await.expect("set");
        store.set("other:c", "3").await.expect("set");

        assert_eq!(store.keys("recs:").await.expect("keys"), vec!["recs:a", "recs:b"]);
        store.remove("recs:a").await.expect("remove");
        assert_eq!(store.get("recs:a").await.expect("get"), None);
    }
}
