//! Catalog collaborator seam: product, affinity, trending and style-profile fetches.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::preferences::UserPreferences;
use crate::domain::product::{Product, ProductId};
use crate::errors::SourceError;
use crate::heuristics::style::detect_category;
use crate::heuristics::ProductCategory;

/// One co-purchase edge from a seed product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffinityLink {
    pub product_id: ProductId,
    pub score: f64,
    #[serde(default)]
    pub cooccurrence: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffinityRecord {
    #[serde(default)]
    pub related_products: Vec<AffinityLink>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingProduct {
    pub product_id: ProductId,
    pub score: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingSnapshot {
    #[serde(default)]
    pub products: Vec<TrendingProduct>,
    #[serde(default)]
    pub by_size: BTreeMap<String, Vec<ProductId>>,
    #[serde(default)]
    pub by_category: BTreeMap<String, Vec<ProductId>>,
}

impl TrendingSnapshot {
    pub fn trend_score(&self, product_id: &ProductId) -> Option<f64> {
        self.products.iter().find(|entry| &entry.product_id == product_id).map(|entry| entry.score)
    }

    pub fn ids_for_size(&self, size: &str) -> &[ProductId] {
        let size = size.trim();
        self.by_size
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(size))
            .map(|(_, ids)| ids.as_slice())
            .unwrap_or(&[])
    }
}

/// The commerce platform as seen by the recommendation service.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// All products, or those in `category` when given.
    async fn fetch_products(&self, category: Option<&str>) -> Result<Vec<Product>, SourceError>;
    async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, SourceError>;
    async fn fetch_affinity(&self, id: &ProductId) -> Result<AffinityRecord, SourceError>;
    async fn fetch_trending(&self) -> Result<TrendingSnapshot, SourceError>;
    async fn fetch_style_profile(&self, customer_id: &str) -> Result<UserPreferences, SourceError>;
}

/// Category label substring match, or the same detected category as the slug.
pub fn matches_category(product: &Product, category: &str) -> bool {
    let wanted = category.trim().to_lowercase();
    if wanted.is_empty() {
        return true;
    }
    if product.category.to_lowercase().contains(&wanted) {
        return true;
    }
    let parsed = ProductCategory::parse(&wanted);
    parsed != ProductCategory::Other && parsed == detect_category(product)
}

/// Fixture-backed catalog, also the shape of the CLI's catalog JSON file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InMemoryCatalog {
    pub products: Vec<Product>,
    pub affinities: BTreeMap<ProductId, AffinityRecord>,
    pub trending: Option<TrendingSnapshot>,
    pub profiles: BTreeMap<String, UserPreferences>,
}

impl InMemoryCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products, ..Self::default() }
    }

    pub fn from_json(raw: &str) -> Result<Self, SourceError> {
        serde_json::from_str(raw).map_err(|error| SourceError::Decode(error.to_string()))
    }

    pub fn with_affinity(
        mut self,
        product_id: impl Into<String>,
        links: Vec<AffinityLink>,
    ) -> Self {
        let record = AffinityRecord { related_products: links };
        self.affinities.insert(ProductId::new(product_id), record);
        self
    }

    pub fn with_trending(mut self, snapshot: TrendingSnapshot) -> Self {
        self.trending = Some(snapshot);
        self
    }

    pub fn with_profile(
        mut self,
        customer_id: impl Into<String>,
        preferences: UserPreferences,
    ) -> Self {
        self.profiles.insert(customer_id.into(), preferences);
        self
    }

    pub fn find(&self, product_id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|product| &product.id == product_id)
    }
}

#[async_trait]
impl CatalogSource for InMemoryCatalog {
    async fn fetch_products(&self, category: Option<&str>) -> Result<Vec<Product>, SourceError> {
        Ok(match category {
            Some(category) => self
                .products
                .iter()
                .filter(|product| matches_category(product, category))
                .cloned()
                .collect(),
            None => self.products.clone(),
        })
    }

    async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, SourceError> {
        Ok(self.find(id).cloned())
    }

    async fn fetch_affinity(&self, id: &ProductId) -> Result<AffinityRecord, SourceError> {
        self.affinities
            .get(id)
            .cloned()
            .ok_or_else(|| SourceError::Unavailable(format!("no affinity data for `{id}`")))
    }

    async fn fetch_trending(&self) -> Result<TrendingSnapshot, SourceError> {
        self.trending
            .clone()
            .ok_or_else(|| SourceError::Unavailable("no trending snapshot published".to_owned()))
    }

    async fn fetch_style_profile(&self, customer_id: &str) -> Result<UserPreferences, SourceError> {
        self.profiles
            .get(customer_id)
            .cloned()
            .ok_or_else(|| {
                SourceError::Unavailable(format!("no style profile for `{customer_id}`"))
            })
    }
}
