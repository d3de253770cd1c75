use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StylePersona {
    Classic,
    Modern,
    Trendy,
    Casual,
    Formal,
}

impl StylePersona {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Modern => "modern",
            Self::Trendy => "trendy",
            Self::Casual => "casual",
            Self::Formal => "formal",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitPreference {
    Slim,
    Regular,
    Relaxed,
}

impl FitPreference {
    /// Keywords in product copy that signal this fit.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Slim => &["slim", "tailored", "skinny"],
            Self::Regular => &["classic fit", "regular", "modern fit"],
            Self::Relaxed => &["relaxed", "comfort", "loose"],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTier {
    Budget,
    Mid,
    Premium,
    Luxury,
}

impl PriceTier {
    /// Inclusive band in minor currency units. Bands overlap at the edges.
    pub fn range(&self) -> PriceRange {
        match self {
            Self::Budget => PriceRange::new(0, 25_000),
            Self::Mid => PriceRange::new(20_000, 60_000),
            Self::Premium => PriceRange::new(50_000, 120_000),
            Self::Luxury => PriceRange::new(100_000, i64::MAX),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: i64,
    pub max: i64,
}

impl PriceRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, price: i64) -> bool {
        price >= self.min && price <= self.max
    }

    /// Widen both bounds by `ratio` (0.2 widens by ±20%), never below zero.
    pub fn widened(&self, ratio: f64) -> Self {
        let min = (self.min as f64 * (1.0 - ratio)).floor().max(0.0) as i64;
        let max = if self.max == i64::MAX {
            i64::MAX
        } else {
            (self.max as f64 * (1.0 + ratio)).ceil() as i64
        };
        Self { min, max }
    }
}

/// Shopper preferences supplied by the caller or fetched as a style profile.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    pub favorite_colors: Vec<String>,
    pub avoid_colors: Vec<String>,
    pub fit: Option<FitPreference>,
    pub price_tier: Option<PriceTier>,
    pub price_range: Option<PriceRange>,
    pub style_persona: Option<StylePersona>,
    pub occasions: Vec<String>,
    pub preferred_categories: Vec<String>,
    /// Category label → preferred size, e.g. `suits → 40R`.
    pub sizes: BTreeMap<String, String>,
}

impl UserPreferences {
    /// Explicit range wins over the tier band.
    pub fn effective_price_range(&self) -> Option<PriceRange> {
        self.price_range.or_else(|| self.price_tier.map(|tier| tier.range()))
    }

    pub fn size_for(&self, category: &str) -> Option<&str> {
        self.sizes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(category))
            .map(|(_, size)| size.as_str())
    }
}
