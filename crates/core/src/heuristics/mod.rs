//! Keyword heuristics that map free-text product copy to categorical signals.

pub mod palette;
pub mod style;

pub use palette::{color_harmony, colors_compatible, extract_colors, is_neutral};
pub use style::{
    derive_occasions, detect_category, detect_seasons, formality_score, style_label,
    ProductCategory,
};

/// Lowercase, replace punctuation with spaces, and pad with a space on each
/// side so whole-word lookups can be done with `contains(" term ")`.
pub(crate) fn normalize_text(value: &str) -> String {
    let mut normalized = String::with_capacity(value.len() + 2);
    normalized.push(' ');
    let mut last_was_space = true;
    for ch in value.chars() {
        if ch.is_alphanumeric() {
            normalized.extend(ch.to_lowercase());
            last_was_space = false;
        } else if !last_was_space {
            normalized.push(' ');
            last_was_space = true;
        }
    }
    if !last_was_space {
        normalized.push(' ');
    }
    normalized
}

/// Whole-word (or whole-phrase) match against text produced by `normalize_text`.
pub(crate) fn contains_term(normalized: &str, term: &str) -> bool {
    let needle = normalize_text(term);
    if needle.trim().is_empty() {
        return false;
    }
    normalized.contains(&needle)
}

pub(crate) fn contains_any(normalized: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| contains_term(normalized, term))
}

#[cfg(test)]
mod tests {
    use super::{contains_term, normalize_text};

    #[test]
    fn term_matching_respects_word_boundaries() {
        let text = normalize_text("Standard tailored fit, Light-Blue shirt");
        assert!(contains_term(&text, "light blue"));
        assert!(contains_term(&text, "shirt"));
        assert!(!contains_term(&text, "tan"));
        assert!(!contains_term(&text, "red"));
        assert!(!contains_term(&text, ""));
    }
}
