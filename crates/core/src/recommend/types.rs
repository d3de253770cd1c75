//! Types for the recommendation service

use serde::{Deserialize, Serialize};

use crate::domain::preferences::UserPreferences;
use crate::domain::product::{Product, ProductId};

use super::{DEFAULT_LIMIT, DEFAULT_TRENDING_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    CustomersAlsoBought,
    CompleteTheLook,
    BasedOnStyle,
    TrendingInSize,
    SimilarProducts,
    Personalized,
}

impl RecommendationType {
    pub const ALL: [RecommendationType; 6] = [
        Self::CustomersAlsoBought,
        Self::CompleteTheLook,
        Self::BasedOnStyle,
        Self::TrendingInSize,
        Self::SimilarProducts,
        Self::Personalized,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomersAlsoBought => "customers_also_bought",
            Self::CompleteTheLook => "complete_the_look",
            Self::BasedOnStyle => "based_on_style",
            Self::TrendingInSize => "trending_in_size",
            Self::SimilarProducts => "similar_products",
            Self::Personalized => "personalized",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().replace('-', "_").to_ascii_lowercase();
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

/// One request per strategy, each carrying only the context it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecommendationRequest {
    CustomersAlsoBought {
        product_id: ProductId,
        #[serde(default = "default_limit")]
        limit: usize,
    },
    CompleteTheLook {
        product_id: ProductId,
        #[serde(default = "default_limit")]
        limit: usize,
    },
    BasedOnStyle {
        #[serde(default)]
        preferences: Option<UserPreferences>,
        #[serde(default)]
        customer_id: Option<String>,
        #[serde(default = "default_limit")]
        limit: usize,
    },
    TrendingInSize {
        size: String,
        #[serde(default = "default_limit")]
        limit: usize,
    },
    SimilarProducts {
        product_id: ProductId,
        #[serde(default = "default_limit")]
        limit: usize,
    },
    Personalized {
        customer_id: String,
        #[serde(default)]
        size: Option<String>,
        #[serde(default)]
        purchase_history: Vec<ProductId>,
        #[serde(default)]
        occasion: Option<String>,
        #[serde(default = "default_limit")]
        limit: usize,
    },
}

impl RecommendationRequest {
    pub fn kind(&self) -> RecommendationType {
        match self {
            Self::CustomersAlsoBought { .. } => RecommendationType::CustomersAlsoBought,
            Self::CompleteTheLook { .. } => RecommendationType::CompleteTheLook,
            Self::BasedOnStyle { .. } => RecommendationType::BasedOnStyle,
            Self::TrendingInSize { .. } => RecommendationType::TrendingInSize,
            Self::SimilarProducts { .. } => RecommendationType::SimilarProducts,
            Self::Personalized { .. } => RecommendationType::Personalized,
        }
    }

    pub fn limit(&self) -> usize {
        match self {
            Self::CustomersAlsoBought { limit, .. }
            | Self::CompleteTheLook { limit, .. }
            | Self::BasedOnStyle { limit, .. }
            | Self::TrendingInSize { limit, .. }
            | Self::SimilarProducts { limit, .. }
            | Self::Personalized { limit, .. } => *limit,
        }
    }

    /// Products that must never come back in the response.
    pub fn seed_ids(&self) -> Vec<ProductId> {
        match self {
            Self::CustomersAlsoBought { product_id, .. }
            | Self::CompleteTheLook { product_id, .. }
            | Self::SimilarProducts { product_id, .. } => vec![product_id.clone()],
            Self::Personalized { purchase_history, .. } => purchase_history.clone(),
            Self::BasedOnStyle { .. } | Self::TrendingInSize { .. } => Vec::new(),
        }
    }

    /// Size the trending leg of a personalized request uses.
    pub fn trending_size(&self) -> Option<&str> {
        match self {
            Self::TrendingInSize { size, .. } => Some(size.as_str()),
            Self::Personalized { size, .. } => Some(
                size.as_deref()
                    .filter(|size| !size.trim().is_empty())
                    .unwrap_or(DEFAULT_TRENDING_SIZE),
            ),
            _ => None,
        }
    }

    /// Boundary check; a failing request yields an empty list, never an error.
    pub fn validate(&self) -> Result<(), String> {
        if self.limit() == 0 {
            return Err("limit must be greater than zero".to_owned());
        }
        match self {
            Self::CustomersAlsoBought { product_id, .. }
            | Self::CompleteTheLook { product_id, .. }
            | Self::SimilarProducts { product_id, .. }
                if product_id.as_str().trim().is_empty() =>
            {
                Err(format!("{} requires a product id", self.kind().as_str()))
            }
            Self::BasedOnStyle { preferences: None, customer_id, .. }
                if customer_id.as_deref().map_or(true, |id| id.trim().is_empty()) =>
            {
                Err("based_on_style requires preferences or a customer id".to_owned())
            }
            Self::TrendingInSize { size, .. } if size.trim().is_empty() => {
                Err("trending_in_size requires a size".to_owned())
            }
            Self::Personalized { customer_id, .. } if customer_id.trim().is_empty() => {
                Err("personalized requires a customer id".to_owned())
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooccurrence: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub product: Product,
    /// Always within [0, 1]
    pub score: f64,
    pub reason: String,
    pub kind: RecommendationType,
    #[serde(default)]
    pub metadata: RecommendationMetadata,
}

impl Recommendation {
    pub fn new(
        product: Product,
        score: f64,
        reason: impl Into<String>,
        kind: RecommendationType,
    ) -> Self {
        Self {
            product,
            score,
            reason: reason.into(),
            kind,
            metadata: RecommendationMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: RecommendationMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// What a strategy produced. Callers only ever see the flattened list.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyOutcome {
    Fresh(Vec<Recommendation>),
    /// An upstream fetch failed; the list is fallback data, possibly empty.
    Degraded { recommendations: Vec<Recommendation>, reason: String },
    Empty,
}

impl StrategyOutcome {
    pub fn from_list(recommendations: Vec<Recommendation>) -> Self {
        if recommendations.is_empty() {
            Self::Empty
        } else {
            Self::Fresh(recommendations)
        }
    }

    pub fn degraded(recommendations: Vec<Recommendation>, reason: impl Into<String>) -> Self {
        Self::Degraded { recommendations, reason: reason.into() }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    pub fn recommendations(&self) -> &[Recommendation] {
        match self {
            Self::Fresh(recommendations) | Self::Degraded { recommendations, .. } => {
                recommendations
            }
            Self::Empty => &[],
        }
    }

    pub fn into_recommendations(self) -> Vec<Recommendation> {
        match self {
            Self::Fresh(recommendations) | Self::Degraded { recommendations, .. } => {
                recommendations
            }
            Self::Empty => Vec::new(),
        }
    }
}
