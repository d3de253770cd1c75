//! Fixed product list served when the catalog source is unreachable.

use crate::domain::product::{Product, ProductId};

use super::types::{Recommendation, RecommendationType};

#[derive(Debug, Clone, Copy)]
struct ProductSeed {
    id: &'static str,
    name: &'static str,
    category: &'static str,
    color: &'static str,
    price: i64,
    occasions: &'static [&'static str],
}

const PRODUCT_SEEDS: &[ProductSeed] = &[
    ProductSeed {
        id: "fallback-navy-suit",
        name: "Classic Navy Suit",
        category: "Suits",
        color: "navy",
        price: 39_900,
        occasions: &["business", "wedding"],
    },
    ProductSeed {
        id: "fallback-charcoal-suit",
        name: "Charcoal Wool Suit",
        category: "Suits",
        color: "charcoal",
        price: 42_900,
        occasions: &["business"],
    },
    ProductSeed {
        id: "fallback-white-shirt",
        name: "White Dress Shirt",
        category: "Shirts",
        color: "white",
        price: 6_900,
        occasions: &["business", "formal"],
    },
    ProductSeed {
        id: "fallback-burgundy-tie",
        name: "Burgundy Silk Tie",
        category: "Ties",
        color: "burgundy",
        price: 3_900,
        occasions: &["wedding", "formal"],
    },
    ProductSeed {
        id: "fallback-black-oxfords",
        name: "Black Leather Oxfords",
        category: "Shoes",
        color: "black",
        price: 14_900,
        occasions: &["formal"],
    },
    ProductSeed {
        id: "fallback-pocket-square",
        name: "White Pocket Square",
        category: "Accessories",
        color: "white",
        price: 1_900,
        occasions: &["wedding"],
    },
];

const SEED_SIZES: &[(&str, u32)] = &[("38R", 3), ("40R", 3), ("42R", 3), ("44R", 2)];

const TOP_SCORE: f64 = 0.8;
const SCORE_STEP: f64 = 0.05;

fn to_product(seed: &ProductSeed) -> Product {
    Product::new(seed.id, seed.name, seed.price, seed.category)
        .with_color(seed.color)
        .with_occasions(seed.occasions)
        .with_sizes(SEED_SIZES)
}

pub fn fallback_products() -> Vec<Product> {
    PRODUCT_SEEDS.iter().map(to_product).collect()
}

/// Mock recommendations with descending scores, skipping `exclude`.
pub fn fallback_recommendations(
    kind: RecommendationType,
    exclude: &[ProductId],
    limit: usize,
) -> Vec<Recommendation> {
    PRODUCT_SEEDS
        .iter()
        .filter(|seed| !exclude.iter().any(|id| id.as_str() == seed.id))
        .take(limit)
        .enumerate()
        .map(|(rank, seed)| {
            let score = TOP_SCORE - SCORE_STEP * rank as f64;
            Recommendation::new(to_product(seed), score, "Popular with our customers", kind)
        })
        .collect()
}
