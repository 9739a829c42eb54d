use super::merge::Branch;
use super::sections::{placeholder_title, Candidate, TitleSource};

/// Flatten the merged tree back to pre-order, relabelling each parent's children 1..N.
pub fn renumber(branches: Vec<Branch>) -> Vec<Candidate> {
    let mut out = Vec::new();
    assign(branches, "", &mut out);
    out
}

fn assign(branches: Vec<Branch>, parent: &str, out: &mut Vec<Candidate>) {
    for (i, Branch { mut section, children }) in branches.into_iter().enumerate() {
        let path = if parent.is_empty() {
            (i + 1).to_string()
        } else {
            format!("{}.{}", parent, i + 1)
        };
        if section.title_source == TitleSource::Placeholder {
            section.title = placeholder_title(&path);
        }
        section.path = path.clone();
        out.push(section);
        assign(children, &path, out);
    }
}

/// Nesting depth of a dotted path; roots are level 1.
pub fn level_of(path: &str) -> usize {
    path.split('.').count()
}
