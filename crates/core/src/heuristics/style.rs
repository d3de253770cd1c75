//! Category, formality, persona, season and occasion heuristics.

use serde::{Deserialize, Serialize};

use crate::domain::preferences::StylePersona;
use crate::domain::product::{Product, Season};

use super::{contains_any, normalize_text};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Suit,
    Tuxedo,
    Blazer,
    Shirt,
    Tie,
    Shoes,
    Vest,
    Trousers,
    Outerwear,
    Accessory,
    Other,
}

/// Checked top to bottom; the first row with a matching keyword wins.
const CATEGORY_KEYWORDS: &[(ProductCategory, &[&str])] = &[
    (ProductCategory::Tuxedo, &["tuxedo", "tuxedos", "tux", "dinner jacket"]),
    (ProductCategory::Blazer, &["blazer", "blazers", "sport coat", "sportcoat"]),
    (ProductCategory::Suit, &["suit", "suits"]),
    (ProductCategory::Shirt, &["shirt", "shirts", "dress shirt"]),
    (ProductCategory::Tie, &["tie", "ties", "necktie", "bowtie", "bow tie", "bowties"]),
    (
        ProductCategory::Shoes,
        &["shoe", "shoes", "oxford", "oxfords", "loafer", "loafers", "derby", "boot", "boots"],
    ),
    (ProductCategory::Vest, &["vest", "vests", "waistcoat"]),
    (ProductCategory::Trousers, &["pants", "trousers", "chinos", "slacks"]),
    (ProductCategory::Outerwear, &["coat", "overcoat", "topcoat", "jacket", "outerwear"]),
    (
        ProductCategory::Accessory,
        &[
            "accessory",
            "accessories",
            "pocket square",
            "cufflinks",
            "belt",
            "suspenders",
            "tie bar",
            "socks",
        ],
    ),
];

impl ProductCategory {
    /// Catalog slug used when asking the catalog source for a category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Suit => "suits",
            Self::Tuxedo => "tuxedos",
            Self::Blazer => "blazers",
            Self::Shirt => "shirts",
            Self::Tie => "ties",
            Self::Shoes => "shoes",
            Self::Vest => "vests",
            Self::Trousers => "trousers",
            Self::Outerwear => "outerwear",
            Self::Accessory => "accessories",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Self {
        classify(&normalize_text(value))
    }

    fn base_formality(&self) -> f64 {
        match self {
            Self::Tuxedo => 9.0,
            Self::Suit => 7.0,
            Self::Vest | Self::Tie => 6.0,
            Self::Blazer | Self::Shirt | Self::Shoes | Self::Outerwear => 5.0,
            Self::Trousers | Self::Accessory => 4.0,
            Self::Other => 3.0,
        }
    }
}

fn classify(normalized: &str) -> ProductCategory {
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| contains_any(normalized, keywords))
        .map(|(category, _)| *category)
        .unwrap_or(ProductCategory::Other)
}

/// Category from the catalog label, falling back to the product name.
pub fn detect_category(product: &Product) -> ProductCategory {
    match classify(&normalize_text(&product.category)) {
        ProductCategory::Other => classify(&normalize_text(&product.name)),
        category => category,
    }
}

const FORMAL_KEYWORDS: &[(&str, f64)] = &[
    ("formal", 1.0),
    ("black tie", 1.0),
    ("patent", 1.0),
    ("tuxedo", 1.0),
    ("wedding", 0.5),
    ("silk", 0.5),
    ("peak lapel", 0.5),
    ("three piece", 0.5),
    ("french cuff", 0.5),
    ("wool", 0.25),
];

const CASUAL_KEYWORDS: &[(&str, f64)] = &[
    ("denim", 2.0),
    ("sneaker", 2.0),
    ("casual", 1.5),
    ("linen", 1.0),
    ("chino", 1.0),
    ("knit", 1.0),
    ("cotton", 0.5),
    ("loafer", 0.5),
];

/// Formality on a 0-10 scale: category baseline adjusted by keyword hits.
pub fn formality_score(product: &Product) -> f64 {
    let text = normalize_text(&product.search_text());
    let mut score = detect_category(product).base_formality();

    for (keyword, weight) in FORMAL_KEYWORDS {
        if super::contains_term(&text, keyword) {
            score += weight;
        }
    }
    for (keyword, weight) in CASUAL_KEYWORDS {
        if super::contains_term(&text, keyword) {
            score -= weight;
        }
    }

    score.clamp(0.0, 10.0)
}

const TRENDY_KEYWORDS: &[&str] =
    &["velvet", "floral", "paisley", "bold", "pattern", "patterned", "statement", "metallic"];
const MODERN_KEYWORDS: &[&str] = &["slim", "modern", "skinny", "stretch", "performance"];
const CASUAL_STYLE_KEYWORDS: &[&str] = &["linen", "casual", "chino", "chinos", "knit", "denim"];

/// Style persona a product reads as.
pub fn style_label(product: &Product) -> StylePersona {
    let text = normalize_text(&product.search_text());
    let formality = formality_score(product);

    if detect_category(product) == ProductCategory::Tuxedo || formality >= 8.5 {
        StylePersona::Formal
    } else if contains_any(&text, TRENDY_KEYWORDS) {
        StylePersona::Trendy
    } else if contains_any(&text, MODERN_KEYWORDS) {
        StylePersona::Modern
    } else if contains_any(&text, CASUAL_STYLE_KEYWORDS) || formality <= 3.5 {
        StylePersona::Casual
    } else {
        StylePersona::Classic
    }
}

const WARM_WEATHER: &[&str] =
    &["linen", "seersucker", "lightweight", "summer", "spring", "cotton poplin", "breathable"];
const COLD_WEATHER: &[&str] =
    &["wool", "flannel", "tweed", "cashmere", "velvet", "corduroy", "fall", "autumn", "winter"];

/// Seasons a product suits. Empty means all-season.
pub fn detect_seasons(product: &Product) -> Vec<Season> {
    if !product.seasons.is_empty() {
        return product.seasons.clone();
    }

    let text = normalize_text(&product.search_text());
    let mut seasons = Vec::new();
    if contains_any(&text, WARM_WEATHER) {
        seasons.extend([Season::Spring, Season::Summer]);
    }
    if contains_any(&text, COLD_WEATHER) {
        seasons.extend([Season::Fall, Season::Winter]);
    }
    seasons
}

const OCCASION_KEYWORDS: &[(&str, &[&str])] = &[
    ("wedding", &["wedding", "groom", "groomsmen", "bridal"]),
    ("prom", &["prom", "homecoming"]),
    ("business", &["business", "office", "work", "professional"]),
    ("formal", &["formal", "black tie", "gala", "tuxedo"]),
    ("casual", &["casual", "weekend", "linen", "chino", "chinos"]),
];

/// Explicit occasions (lowercased) followed by keyword-derived ones.
pub fn derive_occasions(product: &Product) -> Vec<String> {
    let mut occasions: Vec<String> = Vec::new();
    for occasion in &product.occasions {
        let occasion = occasion.trim().to_ascii_lowercase();
        if !occasion.is_empty() && !occasions.contains(&occasion) {
            occasions.push(occasion);
        }
    }

    let text = normalize_text(&product.search_text());
    for (occasion, keywords) in OCCASION_KEYWORDS {
        if contains_any(&text, keywords) && !occasions.iter().any(|known| known == occasion) {
            occasions.push((*occasion).to_owned());
        }
    }
    occasions
}
