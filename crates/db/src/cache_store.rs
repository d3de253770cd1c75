//! SQLite-backed durable tier for [`TieredCache`](atelier_core::cache::TieredCache).

use async_trait::async_trait;
use atelier_core::cache::KeyValueStore;
use atelier_core::errors::StoreError;
use chrono::Utc;
use sqlx::Row;
use tracing::debug;

use crate::DbPool;

pub struct SqliteCacheStore {
    pool: DbPool,
    quota_bytes: Option<usize>,
}

impl SqliteCacheStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool, quota_bytes: None }
    }

    /// Caps the summed size of stored keys and values.
    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    pub async fn used_bytes(&self) -> Result<usize, StoreError> {
        let row = sqlx::query("SELECT COALESCE(SUM(size_bytes), 0) AS used FROM cache_entries")
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.get::<i64, _>("used").max(0) as usize)
    }

    /// Drops every entry regardless of namespace. Returns the number removed.
    pub async fn purge(&self) -> Result<u64, StoreError> {
        let result =
            sqlx::query("DELETE FROM cache_entries").execute(&self.pool).await.map_err(backend)?;
        debug!(
            event_name = "cache.durable.purged",
            removed = result.rows_affected(),
            "durable cache purged"
        );
        Ok(result.rows_affected())
    }

    async fn check_quota(&self, key: &str, needed: usize) -> Result<(), StoreError> {
        let Some(quota) = self.quota_bytes else {
            return Ok(());
        };

        let row = sqlx::query(
            "SELECT COALESCE(SUM(size_bytes), 0) AS used FROM cache_entries WHERE key != ?",
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;
        let used = row.get::<i64, _>("used").max(0) as usize;
        let available = quota.saturating_sub(used);

        if needed > available {
            return Err(StoreError::QuotaExceeded { needed, available });
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for SqliteCacheStore {
    fn name(&self) -> &'static str {
        "durable"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row = sqlx::query("SELECT value FROM cache_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.map(|row| row.get::<String, _>("value")))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let size = key.len() + value.len();
        self.check_quota(key, size).await?;

        sqlx::query(
            r#"
            INSERT INTO cache_entries (key, value, size_bytes, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                size_bytes = excluded.size_bytes,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(size as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM cache_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let sql = "SELECT key FROM cache_entries WHERE key LIKE ? ESCAPE '\\' ORDER BY key";
        let rows = sqlx::query(sql)
            .bind(format!("{}%", escape_like(prefix)))
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        Ok(rows.iter().map(|row| row.get::<String, _>("key")).collect())
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn backend(error: sqlx::Error) -> StoreError {
    StoreError::Backend(error.to_string())
}
