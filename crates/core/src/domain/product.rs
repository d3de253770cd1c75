use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    /// Northern-hemisphere meteorological season for a calendar month (1-12).
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Self::Spring,
            6..=8 => Self::Summer,
            9..=11 => Self::Fall,
            _ => Self::Winter,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spring => "spring",
            Self::Summer => "summer",
            Self::Fall => "fall",
            Self::Winter => "winter",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "spring" => Some(Self::Spring),
            "summer" => Some(Self::Summer),
            "fall" | "autumn" => Some(Self::Fall),
            "winter" => Some(Self::Winter),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub size: String,
    #[serde(default)]
    pub stock: u32,
}

/// Component colors of a bundled outfit (suit + shirt + tie sold together).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleComponents {
    #[serde(default)]
    pub suit_color: Option<String>,
    #[serde(default)]
    pub shirt_color: Option<String>,
    #[serde(default)]
    pub tie_color: Option<String>,
}

/// Read-only catalog snapshot owned by the commerce platform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Price in minor currency units (cents).
    pub price: i64,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub seasons: Vec<Season>,
    #[serde(default)]
    pub occasions: Vec<String>,
    #[serde(default)]
    pub trending: bool,
    #[serde(default)]
    pub bundle: Option<BundleComponents>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub compare_at_price: Option<i64>,
    #[serde(default)]
    pub base_score: Option<f64>,
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: i64,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: ProductId::new(id),
            name: name.into(),
            price,
            category: category.into(),
            description: String::new(),
            tags: Vec::new(),
            color: None,
            seasons: Vec::new(),
            occasions: Vec::new(),
            trending: false,
            bundle: None,
            variants: Vec::new(),
            compare_at_price: None,
            base_score: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|tag| (*tag).to_owned()).collect();
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_seasons(mut self, seasons: &[Season]) -> Self {
        self.seasons = seasons.to_vec();
        self
    }

    pub fn with_occasions(mut self, occasions: &[&str]) -> Self {
        self.occasions = occasions.iter().map(|occasion| (*occasion).to_owned()).collect();
        self
    }

    pub fn with_sizes(mut self, sizes: &[(&str, u32)]) -> Self {
        self.variants = sizes
            .iter()
            .map(|(size, stock)| Variant { size: (*size).to_owned(), stock: *stock })
            .collect();
        self
    }

    pub fn with_bundle(mut self, bundle: BundleComponents) -> Self {
        self.bundle = Some(bundle);
        self
    }

    pub fn with_compare_at_price(mut self, compare_at_price: i64) -> Self {
        self.compare_at_price = Some(compare_at_price);
        self
    }

    pub fn with_base_score(mut self, base_score: f64) -> Self {
        self.base_score = Some(base_score);
        self
    }

    pub fn trending(mut self) -> Self {
        self.trending = true;
        self
    }

    pub fn is_bundle(&self) -> bool {
        self.bundle.is_some()
    }

    /// Sizes with stock on hand, lowercased.
    pub fn available_sizes(&self) -> BTreeSet<String> {
        self.variants
            .iter()
            .filter(|variant| variant.stock > 0)
            .map(|variant| variant.size.trim().to_ascii_lowercase())
            .collect()
    }

    pub fn has_size(&self, size: &str) -> bool {
        let wanted = size.trim().to_ascii_lowercase();
        self.variants
            .iter()
            .any(|variant| variant.stock > 0 && variant.size.trim().eq_ignore_ascii_case(&wanted))
    }

    /// Lowercased name, category, description and tags joined for keyword scans.
    pub fn search_text(&self) -> String {
        let mut text = String::with_capacity(
            self.name.len() + self.category.len() + self.description.len() + 32,
        );
        text.push_str(&self.name);
        text.push(' ');
        text.push_str(&self.category);
        text.push(' ');
        text.push_str(&self.description);
        for tag in &self.tags {
            text.push(' ');
            text.push_str(tag);
        }
        text.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn season_from_month_covers_calendar() {
        assert_eq!(Season::from_month(1), Season::Winter);
        assert_eq!(Season::from_month(4), Season::Spring);
        assert_eq!(Season::from_month(7), Season::Summer);
        assert_eq!(Season::from_month(10), Season::Fall);
        assert_eq!(Season::from_month(12), Season::Winter);
        assert_eq!(Season::parse("Autumn"), Some(Season::Fall));
    }

    #[test]
    fn available_sizes_skip_out_of_stock_variants() {
        let product = Product::new("p1", "Navy Suit", 49_900, "Suits")
            .with_sizes(&[("40R", 3), ("42R", 0), ("44L", 1)]);

        let sizes = product.available_sizes();
        assert_eq!(sizes.len(), 2);
        assert!(product.has_size("40r"));
        assert!(!product.has_size("42R"));
    }

    #[test]
    fn product_deserializes_with_sparse_fields() {
        let product: Product = serde_json::from_str(
            r#"{"id":"sku-1","name":"White Dress Shirt","price":7900,"category":"Shirts"}"#,
        )
        .expect("sparse product json");

        assert_eq!(product.id, ProductId::new("sku-1"));
        assert!(product.variants.is_empty());
        assert!(!product.trending);
        assert!(product.base_score.is_none());
    }
}
