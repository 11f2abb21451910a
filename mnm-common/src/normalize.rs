//! Category tag normalization
//!
//! Cuisine and restaurant-type tags arrive as display strings from clients
//! ("Middle Eastern", "Quick Bites") and from catalog assets. Both sides are
//! folded to the same canonical form before any comparison:
//! lowercase, trimmed, internal whitespace runs joined by a single `_`.
//! The placeholder "none" and blank input fold to the empty string, which
//! carries no preference signal.

/// Normalize a single category tag
///
/// # Examples
///
/// ```
/// use mnm_common::normalize::normalize_tag;
///
/// assert_eq!(normalize_tag("Middle Eastern"), "middle_eastern");
/// assert_eq!(normalize_tag("  none "), "");
/// ```
pub fn normalize_tag(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    if lowered == "none" {
        return String::new();
    }

    lowered.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Normalize every tag in a list, preserving order and length
pub fn normalize_tags(raw: &[String]) -> Vec<String> {
    raw.iter().map(|tag| normalize_tag(tag)).collect()
}

/// Normalize a location name for gazetteer lookup (lowercase, trimmed)
pub fn normalize_location(raw: &str) -> String {
    raw.trim().to_lowercase()
}
