pub mod cache;
pub mod clock;
pub mod config;
pub mod domain;
pub mod errors;
pub mod filter;
pub mod heuristics;
pub mod lookbook;
pub mod recommend;
pub mod scoring;
pub mod source;

pub use cache::{CacheEntry, KeyValueStore, SessionStore, TieredCache, TieredCacheConfig};
pub use clock::{Clock, ManualClock, SystemClock};
pub use domain::preferences::{PriceRange, StylePersona, UserPreferences};
pub use domain::product::{Product, ProductId, Season};
pub use errors::{ApplicationError, SourceError, StoreError};
pub use filter::{FilterConfig, FilterResult, ScoredProduct, SmartFilterEngine};
pub use heuristics::ProductCategory;
pub use lookbook::{CompleteLook, LookBuilder, LookWeights};
pub use recommend::{
    Recommendation, RecommendationRequest, RecommendationService, RecommendationType,
};
pub use scoring::{FilterWeights, ScoreCalculator};
pub use source::{CatalogSource, InMemoryCatalog, TrendingSnapshot};
