use std::path::Path;
use std::sync::Arc;

use atelier_core::cache::{KeyValueStore, SessionStore};
use atelier_db::{connect, migrations, SqliteCacheStore};
use serde::Serialize;

use crate::commands::{
    build_runtime, load_config, CommandResult, EXIT_CACHE_STORE, EXIT_DB_CONNECTIVITY,
    EXIT_MIGRATION,
};
use crate::wiring;

const COMMAND: &str = "cache-prune";

#[derive(Debug, Serialize)]
struct PruneReport {
    expired_recommendations: usize,
    expired_trending: usize,
    purged: u64,
}

pub fn run(config_path: Option<&Path>, all: bool) -> CommandResult {
    let config = match load_config(COMMAND, config_path) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let runtime = match build_runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), EXIT_DB_CONNECTIVITY))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), EXIT_MIGRATION))?;

        let durable = wiring::durable_store(&config, pool.clone());
        let session: Arc<dyn KeyValueStore> =
            Arc::new(SessionStore::new(config.cache.session_quota_bytes));
        let recommendations =
            wiring::recommendation_cache(&config, session.clone(), Some(durable.clone()));
        let trending = wiring::trending_cache(&config, session, Some(durable));

        let mut report = PruneReport {
            expired_recommendations: recommendations.cleanup_expired().await,
            expired_trending: trending.cleanup_expired().await,
            purged: 0,
        };
        if all {
            report.purged = SqliteCacheStore::new(pool.clone())
                .purge()
                .await
                .map_err(|error| ("cache_store", error.to_string(), EXIT_CACHE_STORE))?;
        }
        pool.close().await;
        Ok::<PruneReport, (&'static str, String, u8)>(report)
    });

    match result {
        Ok(report) => {
            let message = format!(
                "evicted {} expired entries, purged {}",
                report.expired_recommendations + report.expired_trending,
                report.purged
            );
            CommandResult::success_with_data(COMMAND, message, &report)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure(COMMAND, error_class, message, exit_code)
        }
    }
}
