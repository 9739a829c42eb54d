use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::render::{collapse_whitespace, render_text};
use super::vocabulary;
use super::xml::Element;
use crate::config::ParserPolicy;
use crate::document::{Category, Importance};

static NUMBERED_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^section\s+\d+(\.\d+)*\s*:\s*").unwrap());

/// Classification for a root section whose code is unknown.
const ROOT_CLASS: (Importance, Category) = (Importance::Medium, Category::Description);

/// Which step of the title chain produced a section's title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleSource {
    Explicit,
    Registry,
    Alias,
    /// `"Section <path>"`; never merged, rewritten when the path changes.
    Placeholder,
}

/// A section as found in the document, before merging and renumbering.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Provisional dotted path.
    pub path: String,
    pub code: Option<String>,
    pub title: String,
    pub title_source: TitleSource,
    pub html: String,
    /// Whitespace-collapsed plain text.
    pub text: String,
    pub has_table: bool,
    pub has_list: bool,
    pub importance: Importance,
    pub category: Category,
    /// Document-order index of the `section` element this came from (1-based).
    pub source: usize,
    /// `source` of the enclosing `section` element, 0 at the body. Differs from the
    /// parent candidate's `source` when a dropped section sat in between.
    pub source_parent: usize,
}

pub fn placeholder_title(path: &str) -> String {
    format!("Section {}", path)
}

/// Walk every section under `body` in document order.
///
/// Returns candidates in pre-order. A candidate whose own text is too short is dropped
/// and its subsections take its place under its parent.
pub fn extract_sections(body: &Element, policy: &ParserPolicy) -> Vec<Candidate> {
    let mut walker = Walker {
        policy,
        counters: HashMap::new(),
        sources: 0,
        out: Vec::new(),
    };
    for section in subsections(body) {
        walker.visit(section, "", 0, ROOT_CLASS);
    }
    walker.out
}

/// Direct subsections: `component/section`, tolerating a bare `section` child.
fn subsections(el: &Element) -> impl Iterator<Item = &Element> {
    el.elements().filter_map(|child| match child.name.as_str() {
        "component" => child.child("section"),
        "section" => Some(child),
        _ => None,
    })
}

struct Walker<'p> {
    policy: &'p ParserPolicy,
    /// Next ordinal per parent path.
    counters: HashMap<String, usize>,
    /// Section elements seen so far, kept or not.
    sources: usize,
    out: Vec<Candidate>,
}

impl Walker<'_> {
    fn visit(
        &mut self,
        section: &Element,
        parent_path: &str,
        source_parent: usize,
        inherited: (Importance, Category),
    ) {
        self.sources += 1;
        let source = self.sources;
        let code_el = section.child("code");
        let code = code_el
            .and_then(|c| c.attr("code"))
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        let (importance, category) = code
            .as_deref()
            .and_then(vocabulary::classify)
            .unwrap_or(inherited);

        let rendered = section.child("text").map(render_text).unwrap_or_default();
        let text = collapse_whitespace(&rendered.text);

        let sufficient = self.is_sufficient(&text);
        let keep = sufficient
            || (self.policy.retain_structural_parents && self.has_retained_descendant(section));

        if !keep {
            debug!(
                parent = parent_path,
                code = code.as_deref().unwrap_or(""),
                chars = text.chars().count(),
                "dropping short section, promoting subsections"
            );
            for child in subsections(section) {
                self.visit(child, parent_path, source, (importance, category));
            }
            return;
        }

        let path = self.next_path(parent_path);
        let explicit = section
            .child("title")
            .map(|t| clean_title(&t.text_content()))
            .unwrap_or_default();
        let alias = code_el
            .and_then(|c| c.attr("displayName"))
            .map(clean_title)
            .unwrap_or_default();
        let (title, title_source) =
            resolve_title(&explicit, code.as_deref(), &alias, &path, self.policy);

        self.out.push(Candidate {
            path: path.clone(),
            code,
            title,
            title_source,
            html: rendered.html,
            text,
            has_table: rendered.has_table,
            has_list: rendered.has_list,
            importance,
            category,
            source,
            source_parent,
        });

        for child in subsections(section) {
            self.visit(child, &path, source, (importance, category));
        }
    }

    fn is_sufficient(&self, text: &str) -> bool {
        text.chars().count() >= self.policy.min_content_chars
    }

    fn has_retained_descendant(&self, section: &Element) -> bool {
        subsections(section).any(|child| {
            let text = child
                .child("text")
                .map(|t| collapse_whitespace(&render_text(t).text))
                .unwrap_or_default();
            self.is_sufficient(&text) || self.has_retained_descendant(child)
        })
    }

    fn next_path(&mut self, parent_path: &str) -> String {
        let counter = self.counters.entry(parent_path.to_string()).or_insert(0);
        *counter += 1;
        if parent_path.is_empty() {
            counter.to_string()
        } else {
            format!("{}.{}", parent_path, counter)
        }
    }
}

/// Title fallback chain. Always yields a non-blank, non-sentinel title.
pub fn resolve_title(
    explicit: &str,
    code: Option<&str>,
    alias: &str,
    path: &str,
    policy: &ParserPolicy,
) -> (String, TitleSource) {
    let explicit_usable = !policy.is_sentinel(explicit);

    if explicit_usable && !policy.is_generic(explicit) {
        return (explicit.to_string(), TitleSource::Explicit);
    }
    if let Some(title) = code.and_then(vocabulary::canonical_title) {
        if !policy.is_sentinel(title) {
            return (title.to_string(), TitleSource::Registry);
        }
    }
    if explicit_usable {
        return (explicit.to_string(), TitleSource::Explicit);
    }
    if !policy.is_sentinel(alias) && !policy.is_generic(alias) {
        return (alias.to_string(), TitleSource::Alias);
    }
    (placeholder_title(path), TitleSource::Placeholder)
}

/// Collapse whitespace and drop a leading `SECTION n:` label.
pub fn clean_title(raw: &str) -> String {
    let collapsed = collapse_whitespace(raw);
    NUMBERED_PREFIX_RE.replace(&collapsed, "").trim().to_string()
}

// ── Tests ──
