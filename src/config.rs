use std::path::Path;

use anyhow::{bail, Context, Result};
use config::Config;
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "SPL";

/// Leading words of the fallback title `Section <path>`.
const PLACEHOLDER_LEAD: &str = "section ";

/// Policy toggles for the section pipeline.
///
/// Loaded from an optional TOML file, then `SPL_*` environment variables
/// (`SPL_MIN_CONTENT_CHARS=20`, `SPL_SENTINEL_FRAGMENTS=unclassified,placeholder`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserPolicy {
    /// Sections whose collapsed text is shorter than this are dropped.
    pub min_content_chars: usize,
    /// Prefix each section's HTML with an importance badge.
    pub importance_badges: bool,
    /// Cap per finding kind per section.
    pub max_findings_per_kind: usize,
    /// Keep a too-short section when it still has retained subsections,
    /// instead of promoting the subsections to its parent.
    pub retain_structural_parents: bool,
    /// Titles that lose to the vocabulary title but may still be used as a last resort.
    pub generic_titles: Vec<String>,
    /// Fragments that disqualify a title outright (matched case-insensitively).
    /// A fragment that could occur inside a `Section <path>` fallback is rejected.
    pub sentinel_fragments: Vec<String>,
}

impl Default for ParserPolicy {
    fn default() -> Self {
        ParserPolicy {
            min_content_chars: 10,
            importance_badges: false,
            max_findings_per_kind: 5,
            retain_structural_parents: false,
            generic_titles: vec![
                "section".into(),
                "subsection".into(),
                "unknown section".into(),
                "generic section".into(),
            ],
            sentinel_fragments: vec!["unclassified".into()],
        }
    }
}

impl ParserPolicy {
    /// Load from `path` (if given) layered under the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("generic_titles")
                    .with_list_parse_key("sentinel_fragments"),
            )
            .build()
            .context("Failed to read parser policy")?;
        let policy: ParserPolicy = settings
            .try_deserialize()
            .context("Invalid parser policy")?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(f) = self
            .sentinel_fragments
            .iter()
            .find(|f| matches_placeholder(f))
        {
            bail!(
                "Invalid parser policy: sentinel fragment {:?} would match fallback titles like \"Section 1.2\"",
                f
            );
        }
        Ok(())
    }

    /// A title that can never be final: blank, or containing a sentinel fragment.
    /// Fragments that would match a `Section <path>` fallback are ignored.
    pub fn is_sentinel(&self, title: &str) -> bool {
        let normalized = normalize_title(title);
        normalized.is_empty()
            || self.sentinel_fragments.iter().any(|f| {
                !f.trim().is_empty()
                    && !matches_placeholder(f)
                    && normalized.contains(&normalize_title(f))
            })
    }

    pub fn is_generic(&self, title: &str) -> bool {
        let normalized = normalize_title(title);
        self.generic_titles
            .iter()
            .any(|g| normalize_title(g) == normalized)
    }
}

/// Whether `fragment` occurs inside some `Section <path>` title.
fn matches_placeholder(fragment: &str) -> bool {
    let f = normalize_title(fragment);
    let numeric = |s: &str| s.chars().all(|c| c.is_ascii_digit() || c == '.');
    !f.is_empty()
        && (numeric(&f)
            || PLACEHOLDER_LEAD.contains(f.as_str())
            || (0..PLACEHOLDER_LEAD.len())
                .any(|k| f.strip_prefix(&PLACEHOLDER_LEAD[k..]).is_some_and(numeric)))
}

/// Lowercase with whitespace runs collapsed to one space; the merge key for titles.
pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
