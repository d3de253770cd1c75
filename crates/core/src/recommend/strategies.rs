//! The six recommendation strategies.
//!
//! Each returns a [`StrategyOutcome`]; a failed fetch degrades to fallback
//! data or an empty list and is logged, never returned.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::warn;

use super::fallback::{fallback_products, fallback_recommendations};
use super::service::RecommendationService;
use super::types::*;
use super::{
    DEFAULT_TREND_SCORE, OCCASION_BOOST, PER_CATEGORY_LOOK_LIMIT, SIZE_BOOST, STYLE_MIN_SCORE,
};
use crate::domain::preferences::UserPreferences;
use crate::domain::product::{Product, ProductId};
use crate::errors::SourceError;
use crate::heuristics::{color_harmony, detect_category, extract_colors};
use crate::scoring::{
    calculate_similarity, clamp_unit, complementarity, complementary_categories, occasions_overlap,
    style_rule_score,
};
use crate::source::TrendingSnapshot;

const TRENDING_KEY: &str = "snapshot";

fn log_fetch_failure(strategy: RecommendationType, what: &str, error: &SourceError) {
    warn!(
        event_name = "recommend.fetch_failed",
        kind = strategy.as_str(),
        fetch = what,
        error = %error,
        "catalog fetch failed"
    );
}

/// Score desc, cheaper first, id last.
fn by_score(left: &Recommendation, right: &Recommendation) -> Ordering {
    right
        .score
        .total_cmp(&left.score)
        .then_with(|| left.product.price.cmp(&right.product.price))
        .then_with(|| left.product.id.cmp(&right.product.id))
}

impl RecommendationService {
    pub(super) async fn customers_also_bought(
        &self,
        seed: &ProductId,
        limit: usize,
    ) -> StrategyOutcome {
        let kind = RecommendationType::CustomersAlsoBought;
        let record = match self.source.fetch_affinity(seed).await {
            Ok(record) => record,
            Err(error) => {
                log_fetch_failure(kind, "affinity", &error);
                return StrategyOutcome::degraded(
                    fallback_recommendations(kind, std::slice::from_ref(seed), limit),
                    format!("affinity unavailable: {error}"),
                );
            }
        };

        let mut links: Vec<_> =
            record.related_products.iter().filter(|link| &link.product_id != seed).collect();
        links.sort_by(|a, b| {
            b.score.total_cmp(&a.score).then_with(|| a.product_id.cmp(&b.product_id))
        });

        let mut recommendations = Vec::new();
        for link in links {
            if recommendations.len() >= limit {
                break;
            }
            match self.source.fetch_product(&link.product_id).await {
                Ok(Some(product)) => {
                    let reason = format!("Bought together by {} customers", link.cooccurrence);
                    let metadata = RecommendationMetadata {
                        cooccurrence: Some(link.cooccurrence),
                        ..Default::default()
                    };
                    let recommendation = Recommendation::new(product, link.score, reason, kind);
                    recommendations.push(recommendation.with_metadata(metadata));
                }
                Ok(None) => {}
                Err(error) => log_fetch_failure(kind, "product", &error),
            }
        }

        StrategyOutcome::from_list(recommendations)
    }

    pub(super) async fn complete_the_look(
        &self,
        seed_id: &ProductId,
        limit: usize,
    ) -> StrategyOutcome {
        let kind = RecommendationType::CompleteTheLook;
        let seed = match self.source.fetch_product(seed_id).await {
            Ok(Some(seed)) => seed,
            Ok(None) => return StrategyOutcome::Empty,
            Err(error) => {
                log_fetch_failure(kind, "seed", &error);
                let reason = format!("seed product unavailable: {error}");
                return StrategyOutcome::degraded(Vec::new(), reason);
            }
        };

        let seed_category = detect_category(&seed);
        let seed_colors = extract_colors(&seed);
        let mut recommendations = Vec::new();
        let mut failures = Vec::new();

        for &category in complementary_categories(seed_category) {
            if recommendations.len() >= limit {
                break;
            }
            let candidates = match self.source.fetch_products(Some(category.as_str())).await {
                Ok(candidates) => candidates,
                Err(error) => {
                    log_fetch_failure(kind, category.as_str(), &error);
                    failures.push(category.as_str());
                    continue;
                }
            };

            let mut ranked: Vec<(f64, Product)> = candidates
                .into_iter()
                .filter(|candidate| {
                    candidate.id != seed.id && detect_category(candidate) == category
                })
                .map(|candidate| {
                    (color_harmony(&seed_colors, &extract_colors(&candidate)), candidate)
                })
                .collect();
            ranked.sort_by(|a, b| {
                b.0.total_cmp(&a.0)
                    .then_with(|| a.1.price.cmp(&b.1.price))
                    .then_with(|| a.1.id.cmp(&b.1.id))
            });

            let score = complementarity(seed_category, category);
            let reason = format!("Completes the look with {}", seed.name);
            recommendations.extend(
                ranked
                    .into_iter()
                    .take(PER_CATEGORY_LOOK_LIMIT)
                    .map(|(_, product)| Recommendation::new(product, score, reason.clone(), kind)),
            );
        }

        if failures.is_empty() {
            StrategyOutcome::from_list(recommendations)
        } else {
            let reason = format!("categories unavailable: {}", failures.join(", "));
            StrategyOutcome::degraded(recommendations, reason)
        }
    }

    pub(super) async fn based_on_style(
        &self,
        preferences: Option<&UserPreferences>,
        customer_id: Option<&str>,
        limit: usize,
    ) -> StrategyOutcome {
        let kind = RecommendationType::BasedOnStyle;
        let preferences = match (preferences, customer_id) {
            (Some(preferences), _) => preferences.clone(),
            (None, Some(customer_id)) => match self.source.fetch_style_profile(customer_id).await {
                Ok(profile) => profile,
                Err(error) => {
                    log_fetch_failure(kind, "style_profile", &error);
                    let reason = format!("style profile unavailable: {error}");
                    return StrategyOutcome::degraded(Vec::new(), reason);
                }
            },
            (None, None) => return StrategyOutcome::Empty,
        };

        let (products, degraded) = match self.source.fetch_products(None).await {
            Ok(products) => (products, None),
            Err(error) => {
                log_fetch_failure(kind, "products", &error);
                (fallback_products(), Some(format!("catalog unavailable: {error}")))
            }
        };

        let mut recommendations: Vec<Recommendation> = products
            .into_iter()
            .filter_map(|product| {
                let (score, matched) = style_rule_score(&product, &preferences);
                (score > STYLE_MIN_SCORE).then(|| {
                    let reason = format!("Matches your {} preferences", matched.join(", "));
                    Recommendation::new(product, score, reason, kind)
                })
            })
            .collect();
        recommendations.sort_by(by_score);
        recommendations.truncate(limit);

        match degraded {
            Some(reason) => StrategyOutcome::degraded(recommendations, reason),
            None => StrategyOutcome::from_list(recommendations),
        }
    }

    /// Trending snapshot, served from its own cache for up to an hour.
    async fn trending_snapshot(&self) -> Result<TrendingSnapshot, SourceError> {
        let key = match &self.cache_scope {
            Some(scope) => format!("{TRENDING_KEY}:{scope}"),
            None => TRENDING_KEY.to_owned(),
        };
        if let Some(snapshot) = self.trending.get(&key).await {
            return Ok(snapshot);
        }
        let snapshot = self.source.fetch_trending().await?;
        self.trending.set(&key, snapshot.clone()).await;
        Ok(snapshot)
    }

    pub(super) async fn trending_in_size(&self, size: &str, limit: usize) -> StrategyOutcome {
        let kind = RecommendationType::TrendingInSize;
        let snapshot = match self.trending_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(error) => {
                log_fetch_failure(kind, "trending", &error);
                let fallback = fallback_recommendations(kind, &[], limit)
                    .into_iter()
                    .filter(|item| item.product.has_size(size))
                    .collect();
                let reason = format!("trending unavailable: {error}");
                return StrategyOutcome::degraded(fallback, reason);
            }
        };

        let mut recommendations = Vec::new();
        for product_id in snapshot.ids_for_size(size) {
            if recommendations.len() >= limit {
                break;
            }
            match self.source.fetch_product(product_id).await {
                Ok(Some(product)) => {
                    let trend_score =
                        snapshot.trend_score(product_id).unwrap_or(DEFAULT_TREND_SCORE);
                    let reason = format!("Trending in size {}", size.trim().to_uppercase());
                    let metadata = RecommendationMetadata {
                        trend_score: Some(trend_score),
                        ..Default::default()
                    };
                    let recommendation = Recommendation::new(product, trend_score, reason, kind);
                    recommendations.push(recommendation.with_metadata(metadata));
                }
                Ok(None) => {}
                Err(error) => log_fetch_failure(kind, "product", &error),
            }
        }

        StrategyOutcome::from_list(recommendations)
    }

    pub(super) async fn similar_products(
        &self,
        seed_id: &ProductId,
        limit: usize,
    ) -> StrategyOutcome {
        let kind = RecommendationType::SimilarProducts;
        let seed = match self.source.fetch_product(seed_id).await {
            Ok(Some(seed)) => seed,
            Ok(None) => return StrategyOutcome::Empty,
            Err(error) => {
                log_fetch_failure(kind, "seed", &error);
                let reason = format!("seed product unavailable: {error}");
                return StrategyOutcome::degraded(Vec::new(), reason);
            }
        };

        let candidates = match self.source.fetch_products(Some(&seed.category)).await {
            Ok(candidates) => candidates,
            Err(error) => {
                log_fetch_failure(kind, "category", &error);
                let reason = format!("category unavailable: {error}");
                return StrategyOutcome::degraded(Vec::new(), reason);
            }
        };

        let mut recommendations: Vec<Recommendation> = candidates
            .into_iter()
            .filter(|candidate| candidate.id != seed.id)
            .map(|candidate| {
                let similarity = calculate_similarity(&seed, &candidate);
                let reason = format!("Similar to {}", seed.name);
                let metadata = RecommendationMetadata {
                    similarity_score: Some(similarity),
                    ..Default::default()
                };
                Recommendation::new(candidate, similarity, reason, kind).with_metadata(metadata)
            })
            .collect();
        recommendations.sort_by(by_score);
        recommendations.truncate(limit);

        StrategyOutcome::from_list(recommendations)
    }

    /// Style, also-bought and trending legs run concurrently, then merge.
    pub(super) async fn personalized(
        &self,
        customer_id: &str,
        purchase_history: &[ProductId],
        size: &str,
        occasion: Option<&str>,
        limit: usize,
    ) -> StrategyOutcome {
        let (style, also_bought, trending) = tokio::join!(
            self.based_on_style(None, Some(customer_id), limit),
            async {
                match purchase_history.first() {
                    Some(seed) => self.customers_also_bought(seed, limit).await,
                    None => StrategyOutcome::Empty,
                }
            },
            self.trending_in_size(size, limit),
        );

        let degraded: Vec<String> = [&style, &also_bought, &trending]
            .into_iter()
            .filter_map(|outcome| match outcome {
                StrategyOutcome::Degraded { reason, .. } => Some(reason.clone()),
                _ => None,
            })
            .collect();

        let occasions: Vec<String> =
            occasion.map(|occasion| vec![occasion.to_owned()]).unwrap_or_default();
        let mut seen: HashSet<ProductId> = purchase_history.iter().cloned().collect();
        let mut merged: Vec<Recommendation> = Vec::new();
        let legs = [style, also_bought, trending];
        for item in legs.into_iter().flat_map(StrategyOutcome::into_recommendations) {
            if !seen.insert(item.product.id.clone()) {
                continue;
            }
            let mut multiplier = 1.0;
            if occasions_overlap(&item.product, &occasions) {
                multiplier *= OCCASION_BOOST;
            }
            if item.product.has_size(size) {
                multiplier *= SIZE_BOOST;
            }
            merged.push(Recommendation {
                score: clamp_unit(item.score * multiplier),
                kind: RecommendationType::Personalized,
                ..item
            });
        }
        merged.sort_by(by_score);
        merged.truncate(limit);

        if degraded.is_empty() {
            StrategyOutcome::from_list(merged)
        } else {
            StrategyOutcome::degraded(merged, degraded.join("; "))
        }
    }
}
