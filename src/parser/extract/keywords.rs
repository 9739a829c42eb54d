use std::sync::LazyLock;

use regex::Regex;

static SAFETY_RE: LazyLock<Regex> = LazyLock::new(|| {
    term_regex(&[
        r"warnings?",
        r"cautions?",
        "contraindicated",
        "avoid",
        r"risks?",
        "serious",
        "fatal",
        r"deaths?",
        "adverse",
        "emergency",
        "discontinue",
        "monitor",
        "alert",
        "danger",
    ])
});

static SIDE_EFFECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    term_regex(&[
        "nausea",
        "vomiting",
        "diarrhea",
        r"headaches?",
        "dizziness",
        "fatigue",
        "constipation",
        r"abdominal\s+pain",
        r"injection\s+site\s+reactions?",
        "hypoglycemia",
        "pancreatitis",
        r"thyroid\s+(?:c-cell\s+)?tumors?",
        r"gallbladder\s+disease",
        r"kidney\s+problems?",
        r"allergic\s+reactions?",
        "rash",
        "itching",
    ])
});

static CONTRAINDICATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    term_regex(&[
        "pregnancy",
        "breastfeeding",
        r"renal\s+impairment",
        r"hepatic\s+impairment",
        r"heart\s+failure",
        "hypersensitivity",
        "allergy",
        "diabetes",
        r"thyroid\s+cancer",
        r"medullary\s+thyroid\s+carcinoma",
        r"MEN\s?2",
    ])
});

/// Case-insensitive whole-word alternation over regex fragments.
fn term_regex(terms: &[&str]) -> Regex {
    Regex::new(&format!(r"(?i)\b(?:{})\b", terms.join("|"))).unwrap()
}

fn find_all(re: &Regex, text: &str) -> Vec<String> {
    re.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

pub fn safety_keywords(text: &str) -> Vec<String> {
    find_all(&SAFETY_RE, text)
}

pub fn side_effects(text: &str) -> Vec<String> {
    find_all(&SIDE_EFFECT_RE, text)
}

pub fn contraindications(text: &str) -> Vec<String> {
    find_all(&CONTRAINDICATION_RE, text)
}
