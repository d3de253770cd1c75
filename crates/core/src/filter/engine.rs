//! Smart Filter Engine implementation

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Datelike;
use tracing::debug;

use super::types::*;
use super::{
    ALTERNATIVES_THRESHOLD, MAX_COLOR_SUGGESTIONS, MAX_OUTFIT_PIECES, MAX_OUTFIT_SUITS,
    PRICE_WIDEN_RATIO, TOP_FACETS,
};
use crate::clock::{Clock, SystemClock};
use crate::domain::preferences::PriceRange;
use crate::domain::product::{Product, Season};
use crate::heuristics::palette::normalize_color;
use crate::heuristics::{
    colors_compatible, derive_occasions, detect_category, extract_colors, ProductCategory,
};
use crate::scoring::{occasions_overlap, ScoreCalculator, ScoringContext};
use crate::source::matches_category;

/// Filters, scores and ranks a product collection.
///
/// The engine holds no per-call state; one instance can serve any number of
/// callers.
pub struct SmartFilterEngine {
    calculator: ScoreCalculator,
    clock: Arc<dyn Clock>,
}

impl SmartFilterEngine {
    pub fn new() -> Self {
        Self { calculator: ScoreCalculator::new(), clock: Arc::new(SystemClock) }
    }

    pub fn with_calculator(mut self, calculator: ScoreCalculator) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn calculator(&self) -> &ScoreCalculator {
        &self.calculator
    }

    /// Run the full pipeline. The input collection is only read.
    pub fn apply(&self, products: &[Product], config: &FilterConfig) -> FilterResult {
        let started = Instant::now();
        let colors: Vec<Vec<String>> = products.iter().map(extract_colors).collect();

        let matched: Vec<usize> = (0..products.len())
            .filter(|&index| matches_config(&products[index], &colors[index], config))
            .collect();

        let season = self.scoring_season(config);
        let query = config.query.as_deref().filter(|query| !query.trim().is_empty());
        let context =
            ScoringContext { query, preferences: config.preferences.as_ref(), season };

        let mut ranked: Vec<ScoredProduct> = matched
            .iter()
            .map(|&index| {
                let product = &products[index];
                let components = self.calculator.components(product, &colors[index], &context);
                ScoredProduct {
                    product: product.clone(),
                    score: self.calculator.composite(product.base_score, &components),
                    reasons: self.calculator.generate_reasons(&components),
                    colors: colors[index].clone(),
                }
            })
            .collect();
        ranked.sort_by(compare_ranked);

        let suggestions = build_suggestions(&ranked, config);
        let alternatives = if config.include_alternatives && ranked.len() < ALTERNATIVES_THRESHOLD {
            self.build_alternatives(products, config)
        } else {
            Vec::new()
        };
        let outfits = if config.include_outfits {
            build_outfits(&ranked, products, &colors)
        } else {
            Vec::new()
        };

        let total_matches = ranked.len();
        let score_range = score_range(&ranked);
        let price_range = price_range(&ranked);
        let top_categories =
            top_facets(ranked.iter().map(|item| item.product.category.trim().to_owned()));
        let top_colors = top_facets(ranked.iter().flat_map(|item| item.colors.iter().cloned()));

        if let Some(max_results) = config.max_results {
            ranked.truncate(max_results);
        }

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(
            event_name = "filter.applied",
            catalog_size = products.len(),
            total_matches,
            returned = ranked.len(),
            suggestions = suggestions.len(),
            alternatives = alternatives.len(),
            outfits = outfits.len(),
            elapsed_ms,
            "smart filters applied"
        );

        FilterResult {
            products: ranked,
            suggestions,
            alternatives,
            outfits,
            metadata: FilterMetadata {
                total_matches,
                score_range,
                price_range,
                top_categories,
                top_colors,
                elapsed_ms,
            },
        }
    }

    /// How many products `config` would match, without scoring.
    pub fn count_matches(&self, products: &[Product], config: &FilterConfig) -> usize {
        products
            .iter()
            .filter(|product| matches_config(product, &extract_colors(product), config))
            .count()
    }

    fn scoring_season(&self, config: &FilterConfig) -> Option<Season> {
        if !config.seasonal_relevance {
            return None;
        }
        Some(config.season.unwrap_or_else(|| Season::from_month(self.clock.now().month())))
    }
}

impl Default for SmartFilterEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_config(product: &Product, colors: &[String], config: &FilterConfig) -> bool {
    if !config.categories.is_empty()
        && !config.categories.iter().any(|category| matches_category(product, category))
    {
        return false;
    }

    if !config.colors.is_empty() {
        let wanted = config.colors.iter().map(|color| normalize_color(color));
        let hit =
            wanted.into_iter().any(|color| colors.iter().any(|candidate| *candidate == color));
        if !hit {
            return false;
        }
    }

    if !config.sizes.is_empty() && !config.sizes.iter().any(|size| product.has_size(size)) {
        return false;
    }

    if config.price_range.is_some_and(|range| !range.contains(product.price)) {
        return false;
    }

    if !config.occasions.is_empty() && !occasions_overlap(product, &config.occasions) {
        return false;
    }

    !(config.trending_only && !product.trending)
}

/// Score desc, trending first, cheaper first, then id for a stable order.
fn compare_ranked(left: &ScoredProduct, right: &ScoredProduct) -> Ordering {
    right
        .score
        .total_cmp(&left.score)
        .then_with(|| right.product.trending.cmp(&left.product.trending))
        .then_with(|| left.product.price.cmp(&right.product.price))
        .then_with(|| left.product.id.cmp(&right.product.id))
}

fn count_values<I>(values: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = String>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in values {
        if !value.is_empty() {
            *counts.entry(value).or_default() += 1;
        }
    }
    let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

fn build_suggestions(ranked: &[ScoredProduct], config: &FilterConfig) -> Vec<FilterSuggestion> {
    if ranked.is_empty() {
        return Vec::new();
    }
    let total = ranked.len() as f64;
    let mut suggestions = Vec::new();

    if config.colors.is_empty() {
        let colors = count_values(ranked.iter().flat_map(|item| item.colors.iter().cloned()));
        suggestions.extend(colors.into_iter().take(MAX_COLOR_SUGGESTIONS).map(|(value, count)| {
            FilterSuggestion {
                kind: SuggestionKind::Color,
                value,
                confidence: count as f64 / total,
                count,
            }
        }));
    }

    if config.occasions.is_empty() {
        let occasions =
            count_values(ranked.iter().flat_map(|item| derive_occasions(&item.product)));
        if let Some((value, count)) = occasions.into_iter().next() {
            suggestions.push(FilterSuggestion {
                kind: SuggestionKind::Occasion,
                value,
                confidence: count as f64 / total,
                count,
            });
        }
    }

    suggestions
}

impl SmartFilterEngine {
    /// Relaxed variants of `config`, each with the count it would yield over
    /// the full catalog.
    fn build_alternatives(
        &self,
        products: &[Product],
        config: &FilterConfig,
    ) -> Vec<AlternativeFilter> {
        let mut alternatives = Vec::new();

        if !config.colors.is_empty() {
            let relaxed = FilterConfig { colors: Vec::new(), ..config.clone() };
            alternatives.push(AlternativeFilter {
                label: "Remove color filter".to_owned(),
                description: format!("Show every color instead of {}", config.colors.join(", ")),
                expected_count: self.count_matches(products, &relaxed),
                config: relaxed,
                relevance: 0.8,
            });
        }

        if let Some(range) = config.price_range {
            let widened: PriceRange = range.widened(PRICE_WIDEN_RATIO);
            let relaxed = FilterConfig { price_range: Some(widened), ..config.clone() };
            alternatives.push(AlternativeFilter {
                label: "Expand price range".to_owned(),
                description: format!(
                    "Widen the price range by {:.0}% each way",
                    PRICE_WIDEN_RATIO * 100.0
                ),
                expected_count: self.count_matches(products, &relaxed),
                config: relaxed,
                relevance: 0.7,
            });
        }

        alternatives
    }
}

fn build_outfits(
    ranked: &[ScoredProduct],
    catalog: &[Product],
    colors: &[Vec<String>],
) -> Vec<OutfitSuggestion> {
    let categorized: Vec<ProductCategory> = catalog.iter().map(detect_category).collect();
    let pieces_for = |suit_colors: &[String], wanted: ProductCategory| {
        catalog
            .iter()
            .zip(colors)
            .zip(&categorized)
            .filter(|((_, piece_colors), category)| {
                **category == wanted && colors_compatible(suit_colors, piece_colors)
            })
            .take(MAX_OUTFIT_PIECES)
            .map(|((product, _), _)| product.id.clone())
            .collect::<Vec<_>>()
    };

    ranked
        .iter()
        .filter(|item| detect_category(&item.product) == ProductCategory::Suit)
        .take(MAX_OUTFIT_SUITS)
        .map(|suit| OutfitSuggestion {
            suit_id: suit.product.id.clone(),
            shirts: pieces_for(&suit.colors, ProductCategory::Shirt),
            ties: pieces_for(&suit.colors, ProductCategory::Tie),
        })
        .filter(|outfit| !outfit.shirts.is_empty() || !outfit.ties.is_empty())
        .collect()
}

fn score_range(ranked: &[ScoredProduct]) -> Option<ScoreRange> {
    let first = ranked.first()?.score;
    let (min, max) = ranked
        .iter()
        .fold((first, first), |(min, max), item| (min.min(item.score), max.max(item.score)));
    Some(ScoreRange { min, max })
}

fn price_range(ranked: &[ScoredProduct]) -> Option<PriceRange> {
    let min = ranked.iter().map(|item| item.product.price).min()?;
    let max = ranked.iter().map(|item| item.product.price).max()?;
    Some(PriceRange::new(min, max))
}

fn top_facets<I>(values: I) -> Vec<FacetCount>
where
    I: IntoIterator<Item = String>,
{
    count_values(values)
        .into_iter()
        .take(TOP_FACETS)
        .map(|(value, count)| FacetCount { value, count })
        .collect()
}
