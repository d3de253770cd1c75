//! Smart filter engine
//!
//! Attribute filtering, composite scoring, ranking, and the auxiliary
//! suggestions (filters to add, looser alternatives, outfit pairings).

mod engine;
mod types;

pub use engine::SmartFilterEngine;
pub use types::*;

/// Alternatives are offered below this many matches
pub const ALTERNATIVES_THRESHOLD: usize = 5;

/// Widen the price range by this ratio on each side
pub const PRICE_WIDEN_RATIO: f64 = 0.2;

pub const MAX_COLOR_SUGGESTIONS: usize = 3;

pub const MAX_OUTFIT_SUITS: usize = 3;

pub const MAX_OUTFIT_PIECES: usize = 3;

pub const TOP_FACETS: usize = 5;
