use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Safety,
    Dosing,
    Efficacy,
    Description,
    Administrative,
}

/// Kinds of literal extracted from section text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    Strength,
    Route,
    Frequency,
    SafetyKeyword,
    SideEffect,
    Contraindication,
}

impl Importance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::Critical => "critical",
            Importance::High => "high",
            Importance::Medium => "medium",
            Importance::Low => "low",
        }
    }
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Safety => "safety",
            Category::Dosing => "dosing",
            Category::Efficacy => "efficacy",
            Category::Description => "description",
            Category::Administrative => "administrative",
        }
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

pub type Findings = BTreeMap<FindingKind, Vec<String>>;

/// Attributes read from the document header, outside the section body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeaderAttributes {
    pub set_id: Option<String>,
    pub document_type_code: Option<String>,
    pub document_type: Option<String>,
    pub product_name: Option<String>,
    pub generic_name: Option<String>,
    pub dosage_forms: Vec<String>,
    pub strengths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentMetadata {
    pub document_id: String,
    pub revision_number: u32,
    pub effective_date: Option<NaiveDate>,
    pub title: String,
    pub issuer: String,
    pub attributes: HeaderAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionNode {
    pub path: String,
    pub level: usize,
    pub code: Option<String>,
    pub title: String,
    pub content_html: String,
    pub content_text: String,
    pub importance: Importance,
    pub category: Category,
    pub word_count: usize,
    pub has_table: bool,
    pub has_list: bool,
    pub structured_findings: Findings,
    pub content_hash: String,
}

impl SectionNode {
    /// Path of the enclosing section, or "" for a root section.
    pub fn parent_path(&self) -> &str {
        parent_path(&self.path)
    }

    /// Final dotted segment of the path (this section's position among its siblings).
    pub fn ordinal(&self) -> usize {
        self.path
            .rsplit('.')
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }
}

pub fn parent_path(path: &str) -> &str {
    path.rfind('.').map(|i| &path[..i]).unwrap_or("")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub metadata: DocumentMetadata,
    pub sections: Vec<SectionNode>,
}

impl Document {
    pub fn section(&self, path: &str) -> Option<&SectionNode> {
        self.sections.iter().find(|s| s.path == path)
    }

    pub fn roots(&self) -> impl Iterator<Item = &SectionNode> {
        self.sections.iter().filter(|s| s.level == 1)
    }

    /// Direct children of `path` ("" for roots), in document order.
    pub fn children<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a SectionNode> + 'a {
        self.sections.iter().filter(move |s| s.parent_path() == path)
    }

    /// Paths whose sections changed between two parses of the same label, by content hash.
    /// Paths present in only one document are included.
    pub fn changed_paths(&self, other: &Document) -> Vec<String> {
        let theirs: HashMap<&str, &str> = other
            .sections
            .iter()
            .map(|s| (s.path.as_str(), s.content_hash.as_str()))
            .collect();
        let mut changed: Vec<String> = self
            .sections
            .iter()
            .filter(|s| theirs.get(s.path.as_str()) != Some(&s.content_hash.as_str()))
            .map(|s| s.path.clone())
            .collect();
        for s in &other.sections {
            if self.section(&s.path).is_none() {
                changed.push(s.path.clone());
            }
        }
        changed
    }
}
