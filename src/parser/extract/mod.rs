pub mod frequency;
pub mod keywords;
pub mod routes;
pub mod strength;

use std::collections::HashSet;

use crate::config::normalize_title;
use crate::document::{Category, FindingKind, Findings};

/// Which scans run for a section of the given category.
pub fn kinds_for(category: Category) -> &'static [FindingKind] {
    use FindingKind::*;
    match category {
        Category::Safety => &[SafetyKeyword, SideEffect, Contraindication],
        Category::Dosing => &[Strength, Route, Frequency, SafetyKeyword],
        Category::Efficacy => &[Strength, Route, Frequency],
        Category::Description => &[Strength, Route],
        Category::Administrative => &[Strength],
    }
}

/// Scan finalized section text. Kinds with no hits are left out of the map.
pub fn extract_all(text: &str, category: Category, cap: usize) -> Findings {
    let mut findings = Findings::new();
    for &kind in kinds_for(category) {
        let hits = match kind {
            FindingKind::Strength => strength::extract(text),
            FindingKind::Route => routes::extract(text),
            FindingKind::Frequency => frequency::extract(text),
            FindingKind::SafetyKeyword => keywords::safety_keywords(text),
            FindingKind::SideEffect => keywords::side_effects(text),
            FindingKind::Contraindication => keywords::contraindications(text),
        };
        let hits = dedup_capped(hits, cap);
        if !hits.is_empty() {
            findings.insert(kind, hits);
        }
    }
    findings
}

/// First occurrence wins; comparison ignores case and inner whitespace.
fn dedup_capped(hits: Vec<String>, cap: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    hits.into_iter()
        .filter(|h| seen.insert(normalize_title(h)))
        .take(cap)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dosing_sections_get_dosing_scans() {
        let findings = extract_all(
            "Inject 0.25 mg subcutaneously once weekly. Discontinue if pancreatitis is suspected.",
            Category::Dosing,
            5,
        );
        assert_eq!(findings[&FindingKind::Strength], vec!["0.25 mg"]);
        assert_eq!(findings[&FindingKind::Route], vec!["subcutaneously"]);
        assert_eq!(findings[&FindingKind::Frequency], vec!["once weekly"]);
        assert_eq!(findings[&FindingKind::SafetyKeyword], vec!["Discontinue"]);
        assert!(!findings.contains_key(&FindingKind::SideEffect));
    }

    #[test]
    fn efficacy_sections_skip_safety_keywords() {
        let findings = extract_all("Serious risk; 10 mg orally.", Category::Efficacy, 5);
        assert!(!findings.contains_key(&FindingKind::SafetyKeyword));
        assert_eq!(findings[&FindingKind::Route], vec!["orally"]);
    }

    #[test]
    fn dedup_keeps_first_case_and_caps() {
        let findings = extract_all(
            "Warning. warning. WARNING. Risk, risk, serious, fatal, death, avoid, monitor.",
            Category::Safety,
            3,
        );
        assert_eq!(
            findings[&FindingKind::SafetyKeyword],
            vec!["Warning", "Risk", "serious"]
        );
    }

    #[test]
    fn no_matches_is_empty_not_error() {
        assert!(extract_all("Store in a cool place.", Category::Administrative, 5).is_empty());
    }
}
