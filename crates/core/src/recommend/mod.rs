//! Recommendation Service
//!
//! Six strategies over a [`CatalogSource`](crate::source::CatalogSource),
//! with per-request result caching and fallback data when the catalog is
//! unreachable.

mod fallback;
mod service;
mod strategies;
mod types;

pub use fallback::{fallback_products, fallback_recommendations};
pub use service::{cache_key, RecommendationService, RECOMMENDATION_NAMESPACE, TRENDING_NAMESPACE};
pub use types::*;

pub const DEFAULT_LIMIT: usize = 6;

/// Used by the personalized strategy when the request names no size
pub const DEFAULT_TRENDING_SIZE: &str = "40R";

/// Style matches at or below this score are dropped
pub const STYLE_MIN_SCORE: f64 = 0.5;

/// Complementary items kept per category
pub const PER_CATEGORY_LOOK_LIMIT: usize = 2;

/// Trend score for ids the snapshot lists by size but not by score
pub const DEFAULT_TREND_SCORE: f64 = 0.5;

pub const OCCASION_BOOST: f64 = 1.2;

pub const SIZE_BOOST: f64 = 1.1;
