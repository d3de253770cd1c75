//! Scoring functions shared by the filter engine and the recommendation service.
//!
//! Every function returns a contribution in `[0, 1]`; the filter engine scales
//! them by [`FilterWeights`] into a 0-100 composite.

use serde::{Deserialize, Serialize};

use crate::domain::preferences::UserPreferences;
use crate::domain::product::{Product, Season};
use crate::heuristics::palette::normalize_color;
use crate::heuristics::style::{derive_occasions, detect_category, detect_seasons, style_label};
use crate::heuristics::{contains_any, contains_term, normalize_text, ProductCategory};

/// Weights for the filter engine's composite score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterWeights {
    /// Starting score when a product carries none (default: 50)
    pub base_score: f64,
    /// Multiplier for query relevance (default: 20)
    pub text_relevance: f64,
    /// Multiplier for shopper preference match (default: 15)
    pub preference_match: f64,
    /// Multiplier for in-season match (default: 10)
    pub seasonal_match: f64,
    /// Flat boost for trending products (default: 10)
    pub trending_boost: f64,
    /// Multiplier for discount value (default: 5)
    pub value: f64,
}

pub const DEFAULT_FILTER_WEIGHTS: FilterWeights = FilterWeights {
    base_score: 50.0,
    text_relevance: 20.0,
    preference_match: 15.0,
    seasonal_match: 10.0,
    trending_boost: 10.0,
    value: 5.0,
};

impl Default for FilterWeights {
    fn default() -> Self {
        DEFAULT_FILTER_WEIGHTS
    }
}

/// Individual scoring components, each in [0, 1].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub text_relevance: f64,
    pub preference_match: f64,
    pub seasonal_match: f64,
    pub value: f64,
    pub trending: bool,
}

/// Inputs shared by every product scored in one filter call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringContext<'a> {
    pub query: Option<&'a str>,
    pub preferences: Option<&'a UserPreferences>,
    /// `None` disables seasonal scoring.
    pub season: Option<Season>,
}

/// Composite score calculator for the filter engine
#[derive(Debug, Clone)]
pub struct ScoreCalculator {
    weights: FilterWeights,
}

impl ScoreCalculator {
    pub fn new() -> Self {
        Self { weights: FilterWeights::default() }
    }

    pub fn with_weights(weights: FilterWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &FilterWeights {
        &self.weights
    }

    pub fn components(
        &self,
        product: &Product,
        colors: &[String],
        context: &ScoringContext<'_>,
    ) -> ComponentScores {
        ComponentScores {
            text_relevance: context
                .query
                .map(|query| text_relevance(product, query))
                .unwrap_or(0.0),
            preference_match: context
                .preferences
                .map(|preferences| preference_match(product, colors, preferences))
                .unwrap_or(0.0),
            seasonal_match: context
                .season
                .map(|season| seasonal_match(product, season))
                .unwrap_or(0.0),
            value: value_score(product),
            trending: product.trending,
        }
    }

    /// Base score plus weighted components, clamped to [0, 100].
    pub fn composite(&self, base_score: Option<f64>, components: &ComponentScores) -> f64 {
        let trending = if components.trending { self.weights.trending_boost } else { 0.0 };
        let total = base_score.unwrap_or(self.weights.base_score)
            + components.text_relevance * self.weights.text_relevance
            + components.preference_match * self.weights.preference_match
            + components.seasonal_match * self.weights.seasonal_match
            + trending
            + components.value * self.weights.value;

        clamp_percent(total)
    }

    /// Human-readable reasons for the contributions that fired.
    pub fn generate_reasons(&self, components: &ComponentScores) -> Vec<String> {
        let mut reasons = Vec::new();

        if components.text_relevance > 0.0 {
            let percent = components.text_relevance * 100.0;
            reasons.push(format!("Matches your search ({percent:.0}%)"));
        }
        if components.preference_match >= 0.3 {
            reasons.push("Fits your style preferences".to_string());
        }
        if components.seasonal_match >= 1.0 {
            reasons.push("In season now".to_string());
        }
        if components.trending {
            reasons.push("Trending this week".to_string());
        }
        if components.value > 0.0 {
            reasons.push(format!("{:.0}% off", components.value * 100.0));
        }

        reasons
    }
}

impl Default for ScoreCalculator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Average per-term relevance: name hit 1.0, category/tag hit 0.7, description hit 0.4.
pub fn text_relevance(product: &Product, query: &str) -> f64 {
    let normalized_query = normalize_text(query);
    let terms: Vec<&str> = normalized_query.split_whitespace().collect();
    if terms.is_empty() {
        return 0.0;
    }

    let name = normalize_text(&product.name);
    let labels = normalize_text(&format!("{} {}", product.category, product.tags.join(" ")));
    let description = normalize_text(&product.description);

    let total: f64 = terms
        .iter()
        .map(|term| {
            if contains_term(&name, term) {
                1.0
            } else if contains_term(&labels, term) {
                0.7
            } else if contains_term(&description, term) {
                0.4
            } else {
                0.0
            }
        })
        .sum();

    clamp_unit(total / terms.len() as f64)
}

/// How well a product lines up with shopper preferences.
///
/// Favorite color 0.3, persona 0.25, price band 0.2, occasion 0.15, fit 0.1;
/// an avoided color takes 0.3 back.
pub fn preference_match(
    product: &Product,
    colors: &[String],
    preferences: &UserPreferences,
) -> f64 {
    let has_color = |wanted: &[String]| {
        wanted.iter().any(|color| {
            let color = normalize_color(color);
            colors.iter().any(|candidate| normalize_color(candidate) == color)
        })
    };

    let mut score = 0.0;
    if has_color(&preferences.favorite_colors) {
        score += 0.3;
    }
    if preferences.style_persona.is_some_and(|persona| style_label(product) == persona) {
        score += 0.25;
    }
    if preferences.effective_price_range().is_some_and(|range| range.contains(product.price)) {
        score += 0.2;
    }
    if occasions_overlap(product, &preferences.occasions) {
        score += 0.15;
    }
    if let Some(fit) = preferences.fit {
        if contains_any(&normalize_text(&product.search_text()), fit.keywords()) {
            score += 0.1;
        }
    }
    if has_color(&preferences.avoid_colors) {
        score -= 0.3;
    }

    clamp_unit(score)
}

/// 1.0 in season, 0.5 for all-season products, 0.0 out of season.
pub fn seasonal_match(product: &Product, season: Season) -> f64 {
    let seasons = detect_seasons(product);
    if seasons.is_empty() {
        0.5
    } else if seasons.contains(&season) {
        1.0
    } else {
        0.0
    }
}

/// Discount ratio against the compare-at price.
pub fn value_score(product: &Product) -> f64 {
    match product.compare_at_price {
        Some(compare_at) if compare_at > 0 && compare_at > product.price => {
            clamp_unit((compare_at - product.price) as f64 / compare_at as f64)
        }
        _ => 0.0,
    }
}

pub fn occasions_overlap(product: &Product, wanted: &[String]) -> bool {
    if wanted.is_empty() {
        return false;
    }
    let occasions = derive_occasions(product);
    wanted.iter().any(|occasion| {
        let occasion = occasion.trim().to_ascii_lowercase();
        occasions.iter().any(|known| *known == occasion)
    })
}

/// Categories that pair naturally with `category`, in presentation order.
pub fn complementary_categories(category: ProductCategory) -> &'static [ProductCategory] {
    use ProductCategory::*;

    match category {
        Suit | Tuxedo => &[Shirt, Tie, Shoes, Accessory],
        Shirt => &[Tie, Suit, Accessory],
        Tie => &[Shirt, Suit],
        Shoes => &[Suit, Accessory],
        Blazer => &[Shirt, Trousers, Tie],
        Trousers => &[Blazer, Shirt, Shoes],
        Vest => &[Shirt, Tie],
        Accessory => &[Suit, Shirt],
        Outerwear => &[Suit, Accessory],
        Other => &[],
    }
}

const COMPLEMENTARITY: &[(ProductCategory, ProductCategory, f64)] = &[
    (ProductCategory::Suit, ProductCategory::Shirt, 0.95),
    (ProductCategory::Suit, ProductCategory::Tie, 0.90),
    (ProductCategory::Suit, ProductCategory::Shoes, 0.85),
    (ProductCategory::Suit, ProductCategory::Accessory, 0.75),
    (ProductCategory::Suit, ProductCategory::Vest, 0.70),
    (ProductCategory::Tuxedo, ProductCategory::Shirt, 0.95),
    (ProductCategory::Tuxedo, ProductCategory::Tie, 0.90),
    (ProductCategory::Tuxedo, ProductCategory::Shoes, 0.90),
    (ProductCategory::Tuxedo, ProductCategory::Accessory, 0.80),
    (ProductCategory::Shirt, ProductCategory::Tie, 0.90),
    (ProductCategory::Shirt, ProductCategory::Blazer, 0.85),
    (ProductCategory::Shirt, ProductCategory::Trousers, 0.80),
    (ProductCategory::Shirt, ProductCategory::Vest, 0.80),
    (ProductCategory::Shirt, ProductCategory::Accessory, 0.60),
    (ProductCategory::Blazer, ProductCategory::Trousers, 0.85),
    (ProductCategory::Blazer, ProductCategory::Tie, 0.70),
    (ProductCategory::Shoes, ProductCategory::Trousers, 0.75),
    (ProductCategory::Shoes, ProductCategory::Accessory, 0.60),
    (ProductCategory::Vest, ProductCategory::Tie, 0.75),
    (ProductCategory::Outerwear, ProductCategory::Suit, 0.70),
    (ProductCategory::Outerwear, ProductCategory::Accessory, 0.60),
];

/// Static category-pair compatibility. Symmetric; unlisted pairs score 0.5,
/// same-category pairs 0.2.
pub fn complementarity(left: ProductCategory, right: ProductCategory) -> f64 {
    if left == right {
        return 0.2;
    }
    COMPLEMENTARITY
        .iter()
        .find(|(a, b, _)| (*a == left && *b == right) || (*a == right && *b == left))
        .map(|(_, _, score)| *score)
        .unwrap_or(0.5)
}

fn same_category(left: &Product, right: &Product) -> bool {
    if left.category.trim().eq_ignore_ascii_case(right.category.trim()) {
        return true;
    }
    let category = detect_category(left);
    category != ProductCategory::Other && category == detect_category(right)
}

/// Similarity between two products in [0, 1].
///
/// Same category 0.5, prices within 20% of the higher price 0.3, plus 0.2
/// scaled by the Jaccard overlap of in-stock sizes.
pub fn calculate_similarity(left: &Product, right: &Product) -> f64 {
    let mut score = 0.0;

    if same_category(left, right) {
        score += 0.5;
    }

    let higher = left.price.max(right.price);
    if higher > 0 {
        let difference = (left.price - right.price).abs() as f64 / higher as f64;
        if difference <= 0.2 {
            score += 0.3;
        }
    }

    let left_sizes = left.available_sizes();
    let right_sizes = right.available_sizes();
    let union = left_sizes.union(&right_sizes).count();
    if union > 0 {
        let shared = left_sizes.intersection(&right_sizes).count();
        score += 0.2 * shared as f64 / union as f64;
    }

    clamp_unit(score)
}

/// Rule-based match against style preferences: occasion 0.4, price 0.3, category 0.3.
/// Returns the score and the names of the rules that fired.
pub fn style_rule_score(
    product: &Product,
    preferences: &UserPreferences,
) -> (f64, Vec<&'static str>) {
    let mut score = 0.0;
    let mut matched = Vec::new();

    if occasions_overlap(product, &preferences.occasions) {
        score += 0.4;
        matched.push("occasion");
    }
    if preferences.effective_price_range().is_some_and(|range| range.contains(product.price)) {
        score += 0.3;
        matched.push("budget");
    }

    let category = detect_category(product);
    let label = product.category.to_lowercase();
    let category_hit = preferences.preferred_categories.iter().any(|preferred| {
        let preferred_lower = preferred.trim().to_lowercase();
        (!preferred_lower.is_empty() && label.contains(&preferred_lower))
            || (category != ProductCategory::Other && ProductCategory::parse(preferred) == category)
    });
    if category_hit {
        score += 0.3;
        matched.push("category");
    }

    (clamp_unit(score), matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::preferences::{FitPreference, PriceRange, StylePersona};

    #[test]
    fn composite_applies_weights_and_clamps() {
        let calculator = ScoreCalculator::new();
        let components = ComponentScores {
            text_relevance: 1.0,
            preference_match: 0.5,
            seasonal_match: 1.0,
            value: 0.2,
            trending: true,
        };

        // 50 + 20 + 7.5 + 10 + 10 + 1 = 98.5
        let total = calculator.composite(None, &components);
        assert!((total - 98.5).abs() < 1e-9);

        assert_eq!(calculator.composite(Some(95.0), &components), 100.0);
        assert_eq!(calculator.composite(Some(-40.0), &ComponentScores::default()), 0.0);
    }

    #[test]
    fn text_relevance_weights_fields() {
        let product = Product::new("1", "Navy Wool Suit", 49_900, "Suits")
            .with_tags(&["wedding"])
            .with_description("Half-canvas construction");

        assert_eq!(text_relevance(&product, "navy"), 1.0);
        assert!((text_relevance(&product, "wedding") - 0.7).abs() < 1e-9);
        assert!((text_relevance(&product, "canvas") - 0.4).abs() < 1e-9);
        assert!((text_relevance(&product, "navy tuxedo") - 0.5).abs() < 1e-9);
        assert_eq!(text_relevance(&product, "   "), 0.0);
    }

    #[test]
    fn preference_match_rewards_and_penalizes() {
        let product =
            Product::new("1", "Slim Navy Suit", 45_000, "Suits").with_occasions(&["wedding"]);
        let colors = vec!["navy".to_owned()];
        let preferences = UserPreferences {
            favorite_colors: vec!["Navy".to_owned()],
            style_persona: Some(StylePersona::Modern),
            price_range: Some(PriceRange::new(40_000, 50_000)),
            occasions: vec!["wedding".to_owned()],
            fit: Some(FitPreference::Slim),
            ..UserPreferences::default()
        };

        assert!((preference_match(&product, &colors, &preferences) - 1.0).abs() < 1e-9);

        let avoid =
            UserPreferences { avoid_colors: vec!["navy".to_owned()], ..UserPreferences::default() };
        assert_eq!(preference_match(&product, &colors, &avoid), 0.0);
    }

    #[test]
    fn seasonal_and_value_scores() {
        let linen = Product::new("1", "Linen Suit", 30_000, "Suits").with_compare_at_price(40_000);
        let plain = Product::new("2", "Navy Suit", 30_000, "Suits").with_compare_at_price(20_000);

        assert_eq!(seasonal_match(&linen, Season::Summer), 1.0);
        assert_eq!(seasonal_match(&linen, Season::Winter), 0.0);
        assert_eq!(seasonal_match(&plain, Season::Winter), 0.5);
        assert!((value_score(&linen) - 0.25).abs() < 1e-9);
        assert_eq!(value_score(&plain), 0.0);
    }

    #[test]
    fn similarity_of_close_products_is_full() {
        let left =
            Product::new("a", "Navy Suit", 100, "Suits").with_sizes(&[("40R", 2), ("42R", 1)]);
        let right =
            Product::new("b", "Gray Suit", 110, "Suits").with_sizes(&[("40R", 5), ("42R", 3)]);

        assert!((calculate_similarity(&left, &right) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn similarity_drops_with_price_gap_and_sizes() {
        let left =
            Product::new("a", "Navy Suit", 100, "Suits").with_sizes(&[("40R", 2), ("42R", 1)]);
        let right =
            Product::new("b", "Gray Suit", 200, "Suits").with_sizes(&[("40R", 5), ("44R", 3)]);

        // 0.5 category + 0.0 price + 0.2 * 1/3
        let expected = 0.5 + 0.2 / 3.0;
        assert!((calculate_similarity(&left, &right) - expected).abs() < 1e-9);
    }

    #[test]
    fn complementarity_is_symmetric_with_defaults() {
        use ProductCategory::*;
        assert_eq!(complementarity(Suit, Shirt), 0.95);
        assert_eq!(complementarity(Shirt, Suit), 0.95);
        assert_eq!(complementarity(Suit, Suit), 0.2);
        assert_eq!(complementarity(Trousers, Tuxedo), 0.5);
        assert_eq!(complementary_categories(Suit), &[Shirt, Tie, Shoes, Accessory]);
    }

    #[test]
    fn style_rules_report_matches() {
        let product = Product::new("1", "Navy Suit", 45_000, "Suits").with_occasions(&["business"]);
        let preferences = UserPreferences {
            occasions: vec!["business".to_owned()],
            price_range: Some(PriceRange::new(0, 50_000)),
            preferred_categories: vec!["suits".to_owned()],
            ..UserPreferences::default()
        };

        let (score, matched) = style_rule_score(&product, &preferences);
        assert!((score - 1.0).abs() < 1e-9);
        assert_eq!(matched, vec!["occasion", "budget", "category"]);
    }
}
