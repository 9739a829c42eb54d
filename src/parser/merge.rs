use std::collections::HashMap;

use tracing::debug;

use super::sections::{Candidate, TitleSource};
use crate::config::normalize_title;
use crate::document::parent_path;

/// A candidate with its subsections, rebuilt from the flat list for merging.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub section: Candidate,
    pub children: Vec<Branch>,
}

impl Branch {
    fn leaf(section: Candidate) -> Self {
        Branch {
            section,
            children: Vec::new(),
        }
    }

    /// Fold a later sibling into this one. Content is appended in order, the more
    /// important classification wins, and the sibling's subsections follow ours.
    fn absorb(&mut self, other: Branch) {
        let Branch { section, mut children } = other;
        for child in &mut children {
            if child.section.source_parent == section.source {
                child.section.source_parent = self.section.source;
            }
        }
        let own = &mut self.section;

        own.html = join_non_empty(&own.html, &section.html, "\n");
        own.text = join_non_empty(&own.text, &section.text, " ");
        own.has_table |= section.has_table;
        own.has_list |= section.has_list;
        if own.code.is_none() {
            own.code = section.code;
        }
        if section.importance < own.importance {
            own.importance = section.importance;
        }
        self.children.extend(children);
    }
}

fn join_non_empty(a: &str, b: &str, sep: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => format!("{}{}{}", a, sep, b),
    }
}

/// Rebuild the hierarchy from pre-ordered candidates using the path prefix relation.
/// A candidate whose parent path never appeared becomes a root.
pub fn build_tree(flat: Vec<Candidate>) -> Vec<Branch> {
    let mut roots = Vec::new();
    let mut stack: Vec<Branch> = Vec::new();

    for candidate in flat {
        let parent = parent_path(&candidate.path).to_string();
        while stack
            .last()
            .is_some_and(|top| top.section.path != parent)
        {
            if let Some(done) = stack.pop() {
                attach(done, &mut stack, &mut roots);
            }
        }
        stack.push(Branch::leaf(candidate));
    }
    while let Some(done) = stack.pop() {
        attach(done, &mut stack, &mut roots);
    }
    roots
}

fn attach(branch: Branch, stack: &mut [Branch], roots: &mut Vec<Branch>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(branch),
        None => roots.push(branch),
    }
}

/// Collapse direct siblings that share a normalized title and came from the same
/// enclosing `section` element, then recurse.
///
/// Subsections promoted out of a dropped section keep their own source parent, so
/// they never fold into a same-titled section that sat outside it. Placeholder
/// titles never coalesce. Running this on its own output changes nothing.
pub fn merge_siblings(branches: Vec<Branch>) -> Vec<Branch> {
    let mut merged: Vec<Branch> = Vec::with_capacity(branches.len());
    let mut by_title: HashMap<(usize, String), usize> = HashMap::new();

    for branch in branches {
        if branch.section.title_source != TitleSource::Placeholder {
            let key = (
                branch.section.source_parent,
                normalize_title(&branch.section.title),
            );
            if let Some(&idx) = by_title.get(&key) {
                debug!(
                    title = %branch.section.title,
                    into = %merged[idx].section.path,
                    from = %branch.section.path,
                    "merging duplicate sibling"
                );
                merged[idx].absorb(branch);
                continue;
            }
            by_title.insert(key, merged.len());
        }
        merged.push(branch);
    }

    for branch in &mut merged {
        branch.children = merge_siblings(std::mem::take(&mut branch.children));
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Category, Importance};

    // Source ids follow the path digits so parents and children line up the way
    // the extractor numbers them.
    fn source_of(path: &str) -> usize {
        path.replace('.', "0").parse().unwrap()
    }

    fn candidate(path: &str, title: &str, text: &str) -> Candidate {
        let parent = parent_path(path);
        Candidate {
            source: source_of(path),
            source_parent: if parent.is_empty() { 0 } else { source_of(parent) },
            path: path.to_string(),
            code: None,
            title: title.to_string(),
            title_source: TitleSource::Explicit,
            html: format!("<p>{}</p>", text),
            text: text.to_string(),
            has_table: false,
            has_list: false,
            importance: Importance::Medium,
            category: Category::Safety,
        }
    }

    fn titles(branches: &[Branch]) -> Vec<&str> {
        branches.iter().map(|b| b.section.title.as_str()).collect()
    }

    #[test]
    fn tree_follows_paths() {
        let tree = build_tree(vec![
            candidate("1", "A", "a"),
            candidate("1.1", "A1", "a1"),
            candidate("1.1.1", "A11", "a11"),
            candidate("1.2", "A2", "a2"),
            candidate("2", "B", "b"),
        ]);
        assert_eq!(titles(&tree), vec!["A", "B"]);
        assert_eq!(titles(&tree[0].children), vec!["A1", "A2"]);
        assert_eq!(titles(&tree[0].children[0].children), vec!["A11"]);
    }

    #[test]
    fn duplicate_siblings_merge_in_order() {
        let tree = build_tree(vec![
            candidate("1", "Drug Interactions", "X"),
            candidate("2", "Other", "O"),
            candidate("3", "drug  INTERACTIONS", "Y"),
        ]);
        let merged = merge_siblings(tree);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].section.text, "X Y");
        assert_eq!(merged[0].section.html, "<p>X</p>\n<p>Y</p>");
    }

    #[test]
    fn cousins_do_not_merge() {
        let tree = build_tree(vec![
            candidate("1", "A", "a"),
            candidate("1.1", "Dup", "x"),
            candidate("2", "B", "b"),
            candidate("2.1", "Dup", "y"),
        ]);
        let merged = merge_siblings(tree);
        assert_eq!(merged[0].children.len(), 1);
        assert_eq!(merged[1].children.len(), 1);
    }

    #[test]
    fn placeholders_never_merge() {
        let mut a = candidate("1", "Section 1", "a");
        a.title_source = TitleSource::Placeholder;
        let mut b = candidate("2", "Section 1", "b");
        b.title_source = TitleSource::Placeholder;
        assert_eq!(merge_siblings(build_tree(vec![a, b])).len(), 2);
    }

    #[test]
    fn absorbed_children_follow_and_merge() {
        let mut high = candidate("2", "Warnings", "second");
        high.importance = Importance::Critical;
        high.has_table = true;
        let tree = build_tree(vec![
            candidate("1", "Warnings", "first"),
            candidate("1.1", "Liver", "l1"),
            high,
            candidate("2.1", "Kidney", "k"),
            candidate("2.2", "Liver", "l2"),
        ]);
        let merged = merge_siblings(tree);
        assert_eq!(merged.len(), 1);
        let w = &merged[0];
        assert_eq!(w.section.importance, Importance::Critical);
        assert!(w.section.has_table);
        assert_eq!(titles(&w.children), vec!["Liver", "Kidney"]);
        assert_eq!(w.children[0].section.text, "l1 l2");
    }

    #[test]
    fn promoted_siblings_keep_their_source_parent() {
        // "1" was promoted out of a dropped section (source 90), "2" sat at the body.
        let mut promoted = candidate("1", "Drug Interactions", "nested");
        promoted.source = 91;
        promoted.source_parent = 90;
        let tree = build_tree(vec![promoted, candidate("2", "Drug Interactions", "top")]);
        let merged = merge_siblings(tree);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].section.text, "nested");
        assert_eq!(merged[1].section.text, "top");
    }

    #[test]
    fn promoted_siblings_from_one_source_still_merge() {
        let mut a = candidate("1", "Dup", "x");
        a.source_parent = 90;
        let mut b = candidate("2", "dup", "y");
        b.source_parent = 90;
        let merged = merge_siblings(build_tree(vec![a, b]));
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].section.text, "x y");
    }

    #[test]
    fn merge_is_idempotent() {
        let tree = build_tree(vec![
            candidate("1", "A", "a"),
            candidate("2", "A", "b"),
            candidate("2.1", "C", "c"),
        ]);
        let once = merge_siblings(tree);
        let twice = merge_siblings(once.clone());
        assert_eq!(once, twice);
    }
}
