//! Types for the filter engine

use serde::{Deserialize, Serialize};

use crate::domain::preferences::{PriceRange, UserPreferences};
use crate::domain::product::{Product, ProductId, Season};

/// Filter request. Empty dimensions mean "no restriction".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub categories: Vec<String>,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub occasions: Vec<String>,
    pub price_range: Option<PriceRange>,
    pub query: Option<String>,
    pub preferences: Option<UserPreferences>,
    /// Score against the current (or explicit) season
    pub seasonal_relevance: bool,
    pub trending_only: bool,
    pub include_outfits: bool,
    pub include_alternatives: bool,
    pub max_results: Option<usize>,
    /// Overrides the season derived from the engine clock
    pub season: Option<Season>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            colors: Vec::new(),
            sizes: Vec::new(),
            occasions: Vec::new(),
            price_range: None,
            query: None,
            preferences: None,
            seasonal_relevance: false,
            trending_only: false,
            include_outfits: false,
            include_alternatives: true,
            max_results: None,
            season: None,
        }
    }
}

impl FilterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_categories(mut self, categories: &[&str]) -> Self {
        self.categories = categories.iter().map(|value| (*value).to_owned()).collect();
        self
    }

    pub fn with_colors(mut self, colors: &[&str]) -> Self {
        self.colors = colors.iter().map(|value| (*value).to_owned()).collect();
        self
    }

    pub fn with_sizes(mut self, sizes: &[&str]) -> Self {
        self.sizes = sizes.iter().map(|value| (*value).to_owned()).collect();
        self
    }

    pub fn with_occasions(mut self, occasions: &[&str]) -> Self {
        self.occasions = occasions.iter().map(|value| (*value).to_owned()).collect();
        self
    }

    pub fn with_price_range(mut self, min: i64, max: i64) -> Self {
        self.price_range = Some(PriceRange::new(min, max));
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_preferences(mut self, preferences: UserPreferences) -> Self {
        self.preferences = Some(preferences);
        self
    }

    pub fn with_season(mut self, season: Season) -> Self {
        self.seasonal_relevance = true;
        self.season = Some(season);
        self
    }

    pub fn trending_only(mut self) -> Self {
        self.trending_only = true;
        self
    }

    pub fn with_outfits(mut self) -> Self {
        self.include_outfits = true;
        self
    }

    pub fn without_alternatives(mut self) -> Self {
        self.include_alternatives = false;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }
}

/// A product annotated with its composite score (0-100)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredProduct {
    pub product: Product,
    pub score: f64,
    pub reasons: Vec<String>,
    /// Derived palette colors
    pub colors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Color,
    Occasion,
}

/// A filter the shopper might add next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSuggestion {
    pub kind: SuggestionKind,
    pub value: String,
    /// Share of the filtered set carrying this value
    pub confidence: f64,
    pub count: usize,
}

/// A looser configuration offered when too few products matched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeFilter {
    pub label: String,
    pub description: String,
    pub config: FilterConfig,
    pub expected_count: usize,
    pub relevance: f64,
}

/// Shirts and ties that pair with a suit from the filtered set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutfitSuggestion {
    pub suit_id: ProductId,
    pub shirts: Vec<ProductId>,
    pub ties: Vec<ProductId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterMetadata {
    /// Matches before truncation
    pub total_matches: usize,
    pub score_range: Option<ScoreRange>,
    pub price_range: Option<PriceRange>,
    pub top_categories: Vec<FacetCount>,
    pub top_colors: Vec<FacetCount>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterResult {
    pub products: Vec<ScoredProduct>,
    pub suggestions: Vec<FilterSuggestion>,
    pub alternatives: Vec<AlternativeFilter>,
    pub outfits: Vec<OutfitSuggestion>,
    pub metadata: FilterMetadata,
}
