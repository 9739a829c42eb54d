pub mod extract;
pub mod merge;
pub mod metadata;
pub mod render;
pub mod renumber;
pub mod sections;
pub mod vocabulary;
pub mod xml;

use sha2::{Digest, Sha256};
use tracing::debug;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::config::ParserPolicy;
use crate::document::{Document, SectionNode};
use crate::error::ParseFailure;
use sections::Candidate;

/// Parse one raw label with the default policy.
pub fn parse(raw: &str) -> Result<Document, ParseFailure> {
    parse_with(raw, &ParserPolicy::default())
}

/// Pipeline: xml tree → header → section candidates → merge → renumber → findings.
pub fn parse_with(raw: &str, policy: &ParserPolicy) -> Result<Document, ParseFailure> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let root = xml::parse_tree(raw)?;
    let body = root
        .find("structuredBody")
        .ok_or_else(|| ParseFailure::malformed("no structuredBody element"))?;

    let metadata = metadata::extract(&root);
    let candidates = sections::extract_sections(body, policy);
    let found = candidates.len();

    let sections: Vec<SectionNode> =
        renumber::renumber(merge::merge_siblings(merge::build_tree(candidates)))
            .into_iter()
            .map(|c| finalize(c, policy))
            .collect();

    debug!(
        document_id = %metadata.document_id,
        candidates = found,
        sections = sections.len(),
        "parsed document"
    );
    Ok(Document { metadata, sections })
}

/// Parse undecoded bytes; invalid UTF-8 sequences are replaced, not rejected.
pub fn parse_bytes(raw: &[u8], policy: &ParserPolicy) -> Result<Document, ParseFailure> {
    parse_with(&String::from_utf8_lossy(raw), policy)
}

/// Parse many labels independently. Results keep input order; one failure never
/// affects another document.
#[cfg(feature = "rayon")]
pub fn parse_batch<S>(raws: &[S], policy: &ParserPolicy) -> Vec<Result<Document, ParseFailure>>
where
    S: AsRef<str> + Sync,
{
    raws.par_iter()
        .map(|raw| parse_with(raw.as_ref(), policy))
        .collect()
}

#[cfg(not(feature = "rayon"))]
pub fn parse_batch<S>(raws: &[S], policy: &ParserPolicy) -> Vec<Result<Document, ParseFailure>>
where
    S: AsRef<str> + Sync,
{
    raws.iter()
        .map(|raw| parse_with(raw.as_ref(), policy))
        .collect()
}

fn finalize(candidate: Candidate, policy: &ParserPolicy) -> SectionNode {
    let Candidate {
        path,
        code,
        title,
        html,
        text,
        has_table,
        has_list,
        importance,
        category,
        ..
    } = candidate;

    let structured_findings =
        extract::extract_all(&text, category, policy.max_findings_per_kind);
    let content_html = if policy.importance_badges {
        format!(
            "<div class=\"importance-badge importance-{}\">{}</div>{}",
            importance,
            importance.as_str().to_uppercase(),
            html
        )
    } else {
        html
    };

    SectionNode {
        level: renumber::level_of(&path),
        word_count: text.split_whitespace().count(),
        content_hash: content_hash(&text),
        path,
        code,
        title,
        content_html,
        content_text: text,
        importance,
        category,
        has_table,
        has_list,
        structured_findings,
    }
}

/// Hex SHA-256 of the plain text.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{parent_path, Category, FindingKind, Importance};
    use std::collections::BTreeMap;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
    }

    fn label() -> Document {
        parse(&fixture("examplol_label.xml")).unwrap()
    }

    fn wrap(sections: &str) -> String {
        format!(
            "<document><id root=\"t\"/><component><structuredBody>{}</structuredBody></component></document>",
            sections
        )
    }

    fn section(title: &str, text: &str, children: &str) -> String {
        format!(
            "<component><section><title>{title}</title><text><paragraph>{text}</paragraph></text>{children}</section></component>"
        )
    }

    #[test]
    fn label_structure() {
        let doc = label();
        let outline: Vec<(&str, &str)> = doc
            .sections
            .iter()
            .map(|s| (s.path.as_str(), s.title.as_str()))
            .collect();
        assert_eq!(
            outline,
            vec![
                ("1", "WARNING: RISK OF THYROID C-CELL TUMORS"),
                ("2", "1 INDICATIONS AND USAGE"),
                ("3", "2 DOSAGE AND ADMINISTRATION"),
                ("3.1", "2.1 Recommended Dosage"),
                ("3.2", "2.2 Missed Dose"),
                ("4", "5.1 Pancreatitis"),
                ("5", "5.2 Hypoglycemia"),
                ("6", "7 DRUG INTERACTIONS"),
                ("7", "Section 7"),
                ("8", "16 HOW SUPPLIED/STORAGE AND HANDLING"),
                ("9", "PACKAGE LABEL.PRINCIPAL DISPLAY PANEL"),
            ]
        );
    }

    #[test]
    fn label_metadata() {
        let meta = label().metadata;
        assert_eq!(meta.document_id, "6f1c2a9e-0b7d-4c1e-9a51-3f2d7e8b4c10");
        assert_eq!(meta.revision_number, 7);
        assert_eq!(meta.issuer, "Acme Pharma Inc.");
        assert!(meta.title.contains("EXAMPLOL safely"));
        assert_eq!(meta.attributes.product_name.as_deref(), Some("Examplol"));
        assert_eq!(meta.attributes.strengths, vec!["0.25 mg"]);
    }

    #[test]
    fn promoted_sections_inherit_dropped_parent_class() {
        let doc = label();
        let pancreatitis = doc.section("4").unwrap();
        assert_eq!(pancreatitis.level, 1);
        assert_eq!(pancreatitis.importance, Importance::Critical);
        assert_eq!(pancreatitis.category, Category::Safety);
    }

    #[test]
    fn label_dosing_table_and_findings() {
        let doc = label();
        let dosing = doc.section("3.1").unwrap();
        assert_eq!(dosing.level, 2);
        assert_eq!(dosing.category, Category::Dosing);
        assert!(dosing.has_table);
        assert!(dosing.content_html.contains("<caption>Table 1: Dose Escalation</caption>"));
        assert!(dosing
            .content_text
            .ends_with("Week Weekly Dose 1 through 4 0.25 mg 5 and onward 0.5 mg"));
        assert_eq!(
            dosing.structured_findings[&FindingKind::Strength],
            vec!["0.25 mg", "0.5 mg"]
        );
        assert_eq!(
            dosing.structured_findings[&FindingKind::Frequency],
            vec!["once weekly"]
        );
    }

    #[test]
    fn label_boxed_warning_findings() {
        let doc = label();
        let boxed = doc.section("1").unwrap();
        assert_eq!(boxed.importance, Importance::Critical);
        assert!(boxed.has_list);
        assert!(boxed.content_html.starts_with("<p><strong>In rodents"));
        let contra = &boxed.structured_findings[&FindingKind::Contraindication];
        assert!(contra.contains(&"medullary thyroid carcinoma".to_string()));
        assert!(contra.contains(&"MEN 2".to_string()));
        assert!(boxed.structured_findings[&FindingKind::SafetyKeyword]
            .contains(&"contraindicated".to_string()));
    }

    #[test]
    fn label_duplicate_interactions_merged() {
        let doc = label();
        let di = doc.section("6").unwrap();
        let first = di.content_text.find("gastric emptying").unwrap();
        let second = di.content_text.find("reducing the dose").unwrap();
        assert!(first < second);
        assert_eq!(doc.roots().count(), 9);
    }

    #[test]
    fn label_media_is_placeholder() {
        let doc = label();
        let panel = doc.section("9").unwrap();
        assert!(panel.content_html.contains("class=\"media-placeholder\""));
        assert!(panel.content_text.ends_with("[media]"));
        assert!(panel.content_html.contains("<br/>"));
    }

    #[test]
    fn path_and_no_gap_invariants() {
        let doc = label();
        let mut children: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for s in &doc.sections {
            let parent = parent_path(&s.path);
            assert!(parent.is_empty() || doc.section(parent).is_some());
            assert_eq!(s.level, s.path.split('.').count());
            children.entry(parent).or_default().push(s.ordinal());
        }
        for ordinals in children.values() {
            let expected: Vec<usize> = (1..=ordinals.len()).collect();
            assert_eq!(ordinals, &expected);
        }
    }

    #[test]
    fn titles_are_never_blank_or_sentinel() {
        let policy = ParserPolicy::default();
        for s in &label().sections {
            assert!(!s.title.trim().is_empty());
            assert!(!policy.is_sentinel(&s.title), "{}", s.title);
        }
    }

    #[test]
    fn text_is_markup_free_and_collapsed() {
        for s in &label().sections {
            assert!(!s.content_text.contains('<'));
            assert!(!s.content_text.contains("  "));
            assert_eq!(s.content_text, s.content_text.trim());
            assert_eq!(s.word_count, s.content_text.split_whitespace().count());
        }
    }

    #[test]
    fn parsing_is_deterministic() {
        let raw = fixture("examplol_label.xml");
        let a = parse(&raw).unwrap();
        let b = parse(&raw).unwrap();
        assert_eq!(a, b);
        assert!(a.changed_paths(&b).is_empty());
        assert_eq!(a.sections[0].content_hash.len(), 64);
    }

    #[test]
    fn merge_scenario() {
        let raw = wrap(&format!(
            "{}{}{}",
            section("Drug Interactions", "X happens with food.", ""),
            section("Other", "Something unrelated here.", ""),
            section("Drug Interactions", "Y happens with alcohol.", "")
        ));
        let doc = parse(&raw).unwrap();
        assert_eq!(doc.sections.len(), 2);
        let merged = &doc.sections[0];
        assert_eq!(merged.content_text, "X happens with food. Y happens with alcohol.");
        assert_eq!(doc.sections[1].path, "2");
    }

    #[test]
    fn promoted_subsection_stays_apart_from_top_level_namesake() {
        let raw = wrap(&format!(
            "{}{}",
            section(
                "5 WARNINGS",
                "ok",
                &section("Drug Interactions", "Nested warning child text.", "")
            ),
            section("Drug Interactions", "Top level interactions text.", "")
        ));
        let doc = parse(&raw).unwrap();
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[0].content_text, "Nested warning child text.");
        assert_eq!(doc.sections[1].content_text, "Top level interactions text.");
        assert_eq!(doc.sections[1].path, "2");
    }

    #[test]
    fn deeply_nested_markup_keeps_its_text() {
        let n = 20_000;
        let text = format!(
            "Deep {}nested words{} here.",
            "<content>".repeat(n),
            "</content>".repeat(n)
        );
        let doc = parse(&wrap(&section("Deep Markup", &text, ""))).unwrap();
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].content_text, "Deep nested words here.");
    }

    #[test]
    fn line_break_in_title_is_a_space() {
        let doc = parse(&wrap(&section(
            "5.1 Acute<br/>Pancreatitis",
            "Inflammation of the pancreas.",
            ""
        )))
        .unwrap();
        assert_eq!(doc.sections[0].title, "5.1 Acute Pancreatitis");
    }

    #[test]
    fn minimum_length_drop() {
        let raw = wrap(&format!(
            "{}{}",
            section("Short", "ok", ""),
            section("Long", "This is sufficient text.", "")
        ));
        let doc = parse(&raw).unwrap();
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].title, "Long");
        assert_eq!(doc.sections[0].path, "1");
    }

    #[test]
    fn malformed_is_distinct_from_empty() {
        let empty = parse(&fixture("empty_body.xml")).unwrap();
        assert!(empty.sections.is_empty());
        assert_eq!(empty.metadata.title, "Empty label");

        assert!(matches!(
            parse(&fixture("no_body.xml")),
            Err(ParseFailure::MalformedInput(_))
        ));
        assert!(matches!(
            parse("<document><unclosed></document>"),
            Err(ParseFailure::MalformedInput(_))
        ));
        assert!(parse("").is_err());
    }

    #[test]
    fn bytes_with_bom_and_bad_utf8() {
        let mut raw = vec![0xEF, 0xBB, 0xBF];
        raw.extend_from_slice(
            wrap(&section("Notes", "Caf\u{e9} text goes here.", "")).as_bytes(),
        );
        let doc = parse_bytes(&raw, &ParserPolicy::default()).unwrap();
        assert_eq!(doc.sections.len(), 1);

        let mut bad = wrap(&section("Notes", "Broken byte here: X", "")).into_bytes();
        let pos = bad.iter().position(|b| *b == b'X').unwrap();
        bad[pos] = 0xFF;
        let doc = parse_bytes(&bad, &ParserPolicy::default()).unwrap();
        assert!(doc.sections[0].content_text.contains('\u{FFFD}'));
    }

    #[test]
    fn badges_are_optional() {
        let raw = fixture("examplol_label.xml");
        let policy = ParserPolicy {
            importance_badges: true,
            ..Default::default()
        };
        let doc = parse_with(&raw, &policy).unwrap();
        assert!(doc.sections[0]
            .content_html
            .starts_with("<div class=\"importance-badge importance-critical\">CRITICAL</div>"));
        let plain = label();
        assert_eq!(doc.sections[0].content_hash, plain.sections[0].content_hash);
    }

    #[test]
    fn batch_isolates_failures() {
        let raws = vec![
            fixture("examplol_label.xml"),
            "<not xml".to_string(),
            fixture("empty_body.xml"),
        ];
        let results = parse_batch(&raws, &ParserPolicy::default());
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().sections.len(), 11);
        assert!(results[1].is_err());
        assert!(results[2].as_ref().unwrap().sections.is_empty());
    }

    #[test]
    fn content_hash_is_sha256_hex() {
        assert_eq!(
            content_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
