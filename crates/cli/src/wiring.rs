//! Builds services and cache tiers from an [`AppConfig`].

use std::sync::Arc;

use anyhow::{Context, Result};
use atelier_core::cache::{KeyValueStore, SessionStore, TieredCache, TieredCacheConfig};
use atelier_core::clock::{Clock, SystemClock};
use atelier_core::config::{AppConfig, MAX_CACHE_TTL_SECS};
use atelier_core::recommend::{
    Recommendation, RecommendationService, RECOMMENDATION_NAMESPACE, TRENDING_NAMESPACE,
};
use atelier_core::source::{CatalogSource, TrendingSnapshot};
use atelier_db::{connect, migrations, DbPool, SqliteCacheStore};
use chrono::Duration;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

/// Connects to the cache database and brings its schema up to date.
pub async fn open_cache_database(config: &AppConfig) -> Result<DbPool> {
    let pool = connect(&config.database)
        .await
        .with_context(|| format!("could not open cache database `{}`", config.database.url))?;
    migrations::run_pending(&pool).await.context("could not migrate cache database")?;
    Ok(pool)
}

pub fn durable_store(config: &AppConfig, pool: DbPool) -> Arc<dyn KeyValueStore> {
    Arc::new(SqliteCacheStore::new(pool).with_quota(config.cache.durable_quota_bytes))
}

fn cache_for<T>(
    config: &AppConfig,
    namespace: &str,
    ttl_secs: u64,
    clock: Arc<dyn Clock>,
    session: Arc<dyn KeyValueStore>,
    durable: Option<Arc<dyn KeyValueStore>>,
) -> TieredCache<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    let ttl = Duration::seconds(ttl_secs.min(MAX_CACHE_TTL_SECS) as i64);
    let full_namespace = format!("{}-{namespace}", config.cache.namespace);
    let cache_config = TieredCacheConfig::new(full_namespace, ttl)
        .with_memory_capacity(config.cache.memory_capacity)
        .with_durable_max_bytes(config.cache.durable_max_bytes);

    let cache = TieredCache::new(cache_config, clock).with_session_store(session);
    match durable {
        Some(store) => cache.with_durable_store(store),
        None => cache,
    }
}

pub fn recommendation_cache(
    config: &AppConfig,
    session: Arc<dyn KeyValueStore>,
    durable: Option<Arc<dyn KeyValueStore>>,
) -> TieredCache<Vec<Recommendation>> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    cache_for(
        config,
        RECOMMENDATION_NAMESPACE,
        config.cache.recommendation_ttl_secs,
        clock,
        session,
        durable,
    )
}

pub fn trending_cache(
    config: &AppConfig,
    session: Arc<dyn KeyValueStore>,
    durable: Option<Arc<dyn KeyValueStore>>,
) -> TieredCache<TrendingSnapshot> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    cache_for(config, TRENDING_NAMESPACE, config.cache.trending_ttl_secs, clock, session, durable)
}

/// Service over `source` with all three cache tiers, keyed under `scope` so a
/// shared cache database never answers for a different catalog. A cache
/// database that cannot be opened leaves the durable tier out rather than
/// failing.
pub async fn recommendation_service(
    config: &AppConfig,
    source: Arc<dyn CatalogSource>,
    scope: &str,
) -> RecommendationService {
    let durable = match open_cache_database(config).await {
        Ok(pool) => Some(durable_store(config, pool)),
        Err(error) => {
            warn!(
                event_name = "cache.durable_unavailable",
                error = %format!("{error:#}"),
                "continuing without durable cache tier"
            );
            None
        }
    };
    let session: Arc<dyn KeyValueStore> =
        Arc::new(SessionStore::new(config.cache.session_quota_bytes));

    RecommendationService::new(source, Arc::new(SystemClock))
        .with_recommendation_cache(recommendation_cache(config, session.clone(), durable.clone()))
        .with_trending_cache(trending_cache(config, session, durable))
        .with_cache_scope(scope)
}
