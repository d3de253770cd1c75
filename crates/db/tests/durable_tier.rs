use std::sync::Arc;

use atelier_core::cache::{KeyValueStore, TieredCache, TieredCacheConfig};
use atelier_core::clock::ManualClock;
use atelier_db::{connect_with_settings, migrations, SqliteCacheStore};
use chrono::{Duration, TimeZone, Utc};
use tempfile::TempDir;

fn start() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 4, 10, 0, 0).single().expect("valid start")
}

#[tokio::test]
async fn entries_survive_a_fresh_cache_over_the_same_file() {
    let dir = TempDir::new().expect("tempdir");
    let url = format!("sqlite://{}", dir.path().join("cache.db").display());
    let pool = connect_with_settings(&url, 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrations");

    let clock = Arc::new(ManualClock::new(start()));
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteCacheStore::new(pool.clone()));
    let config = TieredCacheConfig::new("recs", Duration::minutes(30));

    let writer: TieredCache<Vec<String>> =
        TieredCache::new(config.clone(), clock.clone()).with_durable_store(store.clone());
    writer.set("navy-suit", vec!["white-shirt".to_string()]).await;

    let reader: TieredCache<Vec<String>> =
        TieredCache::new(config, clock.clone()).with_durable_store(store.clone());
    assert_eq!(reader.get("navy-suit").await, Some(vec!["white-shirt".to_string()]));
    assert_eq!(reader.memory_len().await, 1, "durable hit is promoted to memory");

    pool.close().await;
}

#[tokio::test]
async fn cleanup_prunes_only_expired_entries_in_namespace() {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrations");

    let clock = Arc::new(ManualClock::new(start()));
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteCacheStore::new(pool.clone()));
    let cache: TieredCache<u32> =
        TieredCache::new(TieredCacheConfig::new("recs", Duration::minutes(30)), clock.clone())
            .with_durable_store(store.clone());

    cache.set("old", 1).await;
    clock.advance(Duration::minutes(20));
    cache.set("fresh", 2).await;
    store
        .set("trending:snapshot", "{\"payload\":{},\"timestamp\":\"2020-01-01T00:00:00Z\"}")
        .await
        .expect("foreign key");
    clock.advance(Duration::minutes(15));

    assert_eq!(cache.cleanup_expired().await, 1);
    assert_eq!(store.keys("recs:").await.expect("keys"), vec!["recs:fresh"]);
    let foreign = store.get("trending:snapshot").await.expect("get");
    assert!(foreign.is_some(), "other namespaces untouched");

    pool.close().await;
}
