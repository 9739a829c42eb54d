use std::sync::LazyLock;

use regex::Regex;

static FREQUENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:",
        r"(?:once|twice|three times|four times)\s+(?:a\s+)?(?:daily|day|weekly|week|monthly|month)",
        r"|every\s+(?:other\s+)?(?:\d+\s+)?(?:hours?|days?|weeks?|months?)",
        r"|\d+\s+times\s+(?:daily|per\s+day|a\s+day|weekly|per\s+week|a\s+week)",
        r"|as\s+needed|at\s+bedtime",
        r")\b"
    ))
    .unwrap()
});

/// Dosing-frequency expressions, in text order.
pub fn extract(text: &str) -> Vec<String> {
    FREQUENCY_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}
