//! Recommendation service: strategy dispatch, result caching, and the
//! "always a list" contract.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info, warn};

use super::types::*;
use crate::cache::{TieredCache, TieredCacheConfig, RECOMMENDATION_TTL_SECS, TRENDING_TTL_SECS};
use crate::clock::Clock;
use crate::domain::product::ProductId;
use crate::scoring::clamp_unit;
use crate::source::{CatalogSource, TrendingSnapshot};

pub const RECOMMENDATION_NAMESPACE: &str = "recs";
pub const TRENDING_NAMESPACE: &str = "trending";

pub struct RecommendationService {
    pub(super) source: Arc<dyn CatalogSource>,
    recommendations: TieredCache<Vec<Recommendation>>,
    pub(super) trending: TieredCache<TrendingSnapshot>,
    /// Identity of the catalog behind `source`; mixed into every cache key.
    pub(super) cache_scope: Option<String>,
}

impl RecommendationService {
    /// Service with memory-only caches at the default TTLs.
    pub fn new(source: Arc<dyn CatalogSource>, clock: Arc<dyn Clock>) -> Self {
        let recommendations = TieredCache::new(
            TieredCacheConfig::new(
                RECOMMENDATION_NAMESPACE,
                Duration::seconds(RECOMMENDATION_TTL_SECS),
            ),
            clock.clone(),
        );
        let trending = TieredCache::new(
            TieredCacheConfig::new(TRENDING_NAMESPACE, Duration::seconds(TRENDING_TTL_SECS)),
            clock,
        );
        Self { source, recommendations, trending, cache_scope: None }
    }

    pub fn with_recommendation_cache(mut self, cache: TieredCache<Vec<Recommendation>>) -> Self {
        self.recommendations = cache;
        self
    }

    pub fn with_trending_cache(mut self, cache: TieredCache<TrendingSnapshot>) -> Self {
        self.trending = cache;
        self
    }

    /// Keeps results from different catalogs apart in caches that outlive
    /// this service, such as a shared durable tier.
    pub fn with_cache_scope(mut self, scope: impl Into<String>) -> Self {
        self.cache_scope = Some(scope.into());
        self
    }

    /// Best-effort recommendations. Never fails: invalid requests and
    /// upstream outages come back as an empty or fallback list.
    pub async fn get_recommendations(
        &self,
        request: &RecommendationRequest,
    ) -> Vec<Recommendation> {
        let kind = request.kind();
        if let Err(reason) = request.validate() {
            debug!(
                event_name = "recommend.invalid_request",
                kind = kind.as_str(),
                %reason,
                "request rejected"
            );
            return Vec::new();
        }

        let key = cache_key(request, self.cache_scope.as_deref());
        if let Some(key) = &key {
            if let Some(cached) = self.recommendations.get(key).await {
                debug!(
                    event_name = "recommend.cache_hit",
                    kind = kind.as_str(),
                    count = cached.len(),
                    "cache hit"
                );
                return cached;
            }
        }

        let outcome = self.run_strategy(request).await;
        let degraded = outcome.is_degraded();
        if let StrategyOutcome::Degraded { reason, .. } = &outcome {
            warn!(
                event_name = "recommend.degraded",
                kind = kind.as_str(),
                %reason,
                "serving fallback recommendations"
            );
        }

        let recommendations =
            finalize(outcome.into_recommendations(), &request.seed_ids(), request.limit());
        info!(
            event_name = "recommend.generated",
            kind = kind.as_str(),
            count = recommendations.len(),
            degraded,
            "recommendations generated"
        );

        if let Some(key) = &key {
            self.recommendations.set(key, recommendations.clone()).await;
        }
        recommendations
    }

    /// Strategy result before seed exclusion, clamping and truncation.
    pub async fn run_strategy(&self, request: &RecommendationRequest) -> StrategyOutcome {
        match request {
            RecommendationRequest::CustomersAlsoBought { product_id, limit } => {
                self.customers_also_bought(product_id, *limit).await
            }
            RecommendationRequest::CompleteTheLook { product_id, limit } => {
                self.complete_the_look(product_id, *limit).await
            }
            RecommendationRequest::BasedOnStyle { preferences, customer_id, limit } => {
                self.based_on_style(preferences.as_ref(), customer_id.as_deref(), *limit).await
            }
            RecommendationRequest::TrendingInSize { size, limit } => {
                self.trending_in_size(size, *limit).await
            }
            RecommendationRequest::SimilarProducts { product_id, limit } => {
                self.similar_products(product_id, *limit).await
            }
            RecommendationRequest::Personalized {
                customer_id, purchase_history, occasion, limit, ..
            } => {
                let size = request.trending_size().unwrap_or(super::DEFAULT_TRENDING_SIZE);
                self.personalized(customer_id, purchase_history, size, occasion.as_deref(), *limit)
                    .await
            }
        }
    }

    /// Drop the cached list for `request` from every tier so the next call
    /// recomputes it.
    pub async fn invalidate(&self, request: &RecommendationRequest) {
        if let Some(key) = cache_key(request, self.cache_scope.as_deref()) {
            self.recommendations.invalidate(&key).await;
            debug!(
                event_name = "recommend.cache_invalidated",
                kind = request.kind().as_str(),
                "cached recommendations dropped"
            );
        }
    }

    /// Evict expired and malformed entries from both durable caches.
    pub async fn cleanup_expired(&self) -> usize {
        self.recommendations.cleanup_expired().await + self.trending.cleanup_expired().await
    }
}

/// `<type>:<blake3 of scope and serialized request>`
pub fn cache_key(request: &RecommendationRequest, scope: Option<&str>) -> Option<String> {
    match serde_json::to_vec(request) {
        Ok(bytes) => {
            let mut hasher = blake3::Hasher::new();
            if let Some(scope) = scope {
                hasher.update(scope.as_bytes());
                hasher.update(&[0]);
            }
            hasher.update(&bytes);
            Some(format!("{}:{}", request.kind().as_str(), hasher.finalize().to_hex()))
        }
        Err(error) => {
            warn!(
                event_name = "recommend.cache_key_failed",
                error = %error,
                "request not cacheable"
            );
            None
        }
    }
}

/// Drop seeds and duplicates, clamp scores, truncate.
fn finalize(
    recommendations: Vec<Recommendation>,
    seeds: &[ProductId],
    limit: usize,
) -> Vec<Recommendation> {
    let mut seen = HashSet::new();
    recommendations
        .into_iter()
        .filter(|item| !seeds.contains(&item.product.id))
        .filter(|item| seen.insert(item.product.id.clone()))
        .map(|mut item| {
            item.score = clamp_unit(item.score);
            item
        })
        .take(limit)
        .collect()
}
