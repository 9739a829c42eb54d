use std::sync::LazyLock;

use regex::Regex;

static STRENGTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b\d+(?:[.,]\d+)?\s?(?:mcg|mg|g|ml|units?|iu|meq)(?:\s?/\s?(?:ml|kg|m2|day|dose|hour|h))?(?:\b|$)",
    )
    .unwrap()
});

/// Numeric strengths such as `25 mg`, `0.5 mL`, `100 units/mL`, in text order.
pub fn extract(text: &str) -> Vec<String> {
    STRENGTH_RE
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .collect()
}
