use std::sync::LazyLock;

use regex::Regex;

static ROUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:subcutaneous(?:ly)?|oral(?:ly)?|intravenous(?:ly)?|intramuscular(?:ly)?|topical(?:ly)?|sublingual(?:ly)?|transdermal(?:ly)?|intranasal(?:ly)?|rectal(?:ly)?|inhaled|injection|injected)\b",
    )
    .unwrap()
});

/// Administration-route words, in text order.
pub fn extract(text: &str) -> Vec<String> {
    ROUTE_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}
