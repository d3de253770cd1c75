//! Fixed menswear color palette and pairing rules.

use crate::domain::product::Product;

use super::{contains_term, normalize_text};

/// Scan order matters: multi-word shades come before the base hue they contain.
pub const PALETTE: &[&str] = &[
    "light blue",
    "sky blue",
    "powder blue",
    "navy",
    "charcoal",
    "burgundy",
    "maroon",
    "lavender",
    "black",
    "white",
    "gray",
    "grey",
    "silver",
    "ivory",
    "cream",
    "beige",
    "khaki",
    "tan",
    "brown",
    "olive",
    "green",
    "teal",
    "blue",
    "pink",
    "purple",
    "red",
    "orange",
    "yellow",
    "gold",
];

pub const NEUTRALS: &[&str] =
    &["white", "black", "gray", "charcoal", "silver", "ivory", "cream", "beige"];

const COMPLEMENTARY_PAIRS: &[(&str, &str)] = &[
    ("navy", "burgundy"),
    ("navy", "pink"),
    ("navy", "light blue"),
    ("navy", "tan"),
    ("navy", "gold"),
    ("charcoal", "lavender"),
    ("charcoal", "burgundy"),
    ("charcoal", "pink"),
    ("gray", "navy"),
    ("gray", "burgundy"),
    ("brown", "light blue"),
    ("brown", "green"),
    ("tan", "light blue"),
    ("olive", "burgundy"),
    ("blue", "orange"),
    ("blue", "brown"),
    ("green", "burgundy"),
    ("khaki", "navy"),
];

/// Canonical spelling for palette synonyms.
pub fn normalize_color(color: &str) -> String {
    match color.trim().to_ascii_lowercase().as_str() {
        "grey" => "gray".to_owned(),
        "sky blue" | "powder blue" => "light blue".to_owned(),
        "maroon" => "burgundy".to_owned(),
        other => other.to_owned(),
    }
}

fn first_palette_match(field: &str) -> Option<String> {
    let normalized = normalize_text(field);
    PALETTE
        .iter()
        .find(|color| contains_term(&normalized, color))
        .map(|color| normalize_color(color))
}

/// Derived color set: first palette match per field, duplicates suppressed.
///
/// Fields are scanned in order: explicit color, name, description, each tag,
/// then bundle component colors (suit, shirt, tie).
pub fn extract_colors(product: &Product) -> Vec<String> {
    let mut fields: Vec<&str> = Vec::with_capacity(product.tags.len() + 6);
    if let Some(color) = &product.color {
        fields.push(color);
    }
    fields.push(&product.name);
    fields.push(&product.description);
    fields.extend(product.tags.iter().map(String::as_str));
    if let Some(bundle) = &product.bundle {
        let components = [&bundle.suit_color, &bundle.shirt_color, &bundle.tie_color];
        for component in components.into_iter().flatten() {
            fields.push(component);
        }
    }

    let mut colors: Vec<String> = Vec::new();
    for field in fields {
        if let Some(color) = first_palette_match(field) {
            if !colors.contains(&color) {
                colors.push(color);
            }
        }
    }
    colors
}

pub fn is_neutral(color: &str) -> bool {
    let color = normalize_color(color);
    NEUTRALS.contains(&color.as_str())
}

pub fn are_complementary(left: &str, right: &str) -> bool {
    let left = normalize_color(left);
    let right = normalize_color(right);
    COMPLEMENTARY_PAIRS.iter().any(|(a, b)| {
        (*a == left.as_str() && *b == right.as_str())
            || (*a == right.as_str() && *b == left.as_str())
    })
}

/// Two color sets pair if any combination is neutral or a complementary pair.
pub fn colors_compatible(left: &[String], right: &[String]) -> bool {
    left.iter().any(|a| {
        right.iter().any(|b| is_neutral(a) || is_neutral(b) || are_complementary(a, b))
    })
}

/// Best pairing quality across both sets, in [0,1].
///
/// Complementary 1.0, neutral 0.8, monochrome 0.6, clash 0.3; unknown colors
/// on either side score a neutral 0.5.
pub fn color_harmony(left: &[String], right: &[String]) -> f64 {
    if left.is_empty() || right.is_empty() {
        return 0.5;
    }

    let mut best: f64 = 0.0;
    for a in left {
        for b in right {
            let score = if are_complementary(a, b) {
                1.0
            } else if is_neutral(a) || is_neutral(b) {
                0.8
            } else if normalize_color(a) == normalize_color(b) {
                0.6
            } else {
                0.3
            };
            best = best.max(score);
        }
    }
    best
}
