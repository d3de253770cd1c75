//! Complete-the-look builder: one best piece per complementary category.

use serde::{Deserialize, Serialize};

use crate::domain::preferences::StylePersona;
use crate::domain::product::Product;
use crate::heuristics::{
    color_harmony, detect_category, extract_colors, formality_score, style_label, ProductCategory,
};
use crate::scoring::{clamp_unit, complementarity, complementary_categories};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LookWeights {
    pub color_harmony: f64,
    pub formality: f64,
    pub complementarity: f64,
}

pub const DEFAULT_LOOK_WEIGHTS: LookWeights =
    LookWeights { color_harmony: 0.5, formality: 0.3, complementarity: 0.2 };

impl Default for LookWeights {
    fn default() -> Self {
        DEFAULT_LOOK_WEIGHTS
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookPiece {
    pub product: Product,
    pub category: ProductCategory,
    pub score: f64,
    pub color_harmony: f64,
    /// 1.0 when formality matches the anchor exactly
    pub formality_proximity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteLook {
    pub anchor: Product,
    pub pieces: Vec<LookPiece>,
    /// Mean piece score, 0 when nothing paired
    pub look_score: f64,
    pub average_formality: f64,
    pub persona: StylePersona,
}

#[derive(Debug, Clone, Default)]
pub struct LookBuilder {
    weights: LookWeights,
}

impl LookBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: LookWeights) -> Self {
        Self { weights }
    }

    pub fn complete_the_look(&self, anchor: &Product, catalog: &[Product]) -> CompleteLook {
        let anchor_category = detect_category(anchor);
        let anchor_colors = extract_colors(anchor);
        let anchor_formality = formality_score(anchor);

        let pieces: Vec<LookPiece> = complementary_categories(anchor_category)
            .iter()
            .filter_map(|&category| {
                catalog
                    .iter()
                    .filter(|candidate| {
                        candidate.id != anchor.id && detect_category(candidate) == category
                    })
                    .map(|candidate| {
                        let harmony = color_harmony(&anchor_colors, &extract_colors(candidate));
                        let gap = (anchor_formality - formality_score(candidate)).abs();
                        let proximity = 1.0 - gap / 10.0;
                        let fit = complementarity(anchor_category, category);
                        let score = clamp_unit(
                            self.weights.color_harmony * harmony
                                + self.weights.formality * proximity
                                + self.weights.complementarity * fit,
                        );
                        LookPiece {
                            product: candidate.clone(),
                            category,
                            score,
                            color_harmony: harmony,
                            formality_proximity: proximity,
                        }
                    })
                    .min_by(|a, b| {
                        b.score
                            .total_cmp(&a.score)
                            .then_with(|| a.product.price.cmp(&b.product.price))
                            .then_with(|| a.product.id.cmp(&b.product.id))
                    })
            })
            .collect();

        let look_score = if pieces.is_empty() {
            0.0
        } else {
            pieces.iter().map(|piece| piece.score).sum::<f64>() / pieces.len() as f64
        };
        let piece_formality: f64 = pieces.iter().map(|piece| formality_score(&piece.product)).sum();
        let formality_total = anchor_formality + piece_formality;
        let average_formality = formality_total / (pieces.len() + 1) as f64;

        CompleteLook {
            anchor: anchor.clone(),
            pieces,
            look_score,
            average_formality,
            persona: style_label(anchor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Product> {
        vec![
            Product::new("suit", "Navy Suit", 49_900, "Suits"),
            Product::new("shirt-white", "White Dress Shirt", 7_900, "Shirts"),
            Product::new("shirt-denim", "Olive Denim Shirt", 6_900, "Shirts"),
            Product::new("tie-burg", "Burgundy Silk Tie", 3_900, "Ties"),
            Product::new("tie-orange", "Orange Knit Tie", 2_900, "Ties"),
            Product::new("shoes", "Black Oxford Shoes", 14_900, "Shoes"),
        ]
    }

    #[test]
    fn picks_the_best_piece_per_category() {
        let products = catalog();
        let look = LookBuilder::new().complete_the_look(&products[0], &products);

        let ids: Vec<&str> = look.pieces.iter().map(|piece| piece.product.id.as_str()).collect();
        assert_eq!(ids, vec!["shirt-white", "tie-burg", "shoes"]);
        assert!(look.pieces.iter().all(|piece| (0.0..=1.0).contains(&piece.score)));
        assert!(look.look_score > 0.0 && look.look_score <= 1.0);
        assert_eq!(look.persona, StylePersona::Classic);
    }

    #[test]
    fn lone_anchor_has_empty_look() {
        let anchor = Product::new("gift", "Gift Card", 5_000, "Gifts");
        let look = LookBuilder::new().complete_the_look(&anchor, &catalog());

        assert!(look.pieces.is_empty());
        assert_eq!(look.look_score, 0.0);
        assert_eq!(look.average_formality, formality_score(&anchor));
    }
}
