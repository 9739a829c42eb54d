use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::ParseFailure;

/// Deepest element nesting kept in the tree. Elements below it are flattened into
/// their deepest kept ancestor as plain text, which bounds every recursive walk.
pub const MAX_DEPTH: usize = 128;

/// A namespace-stripped XML element. Attribute and element names are local names.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Element {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Direct child elements, in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    /// Follow a chain of direct-child names, e.g. `["author", "assignedEntity"]`.
    pub fn child_path(&self, names: &[&str]) -> Option<&Element> {
        names
            .iter()
            .try_fold(self, |current, name| current.child(name))
    }

    /// First descendant (pre-order, excluding self) with the given name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        for child in self.elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants (pre-order, excluding self) with the given name.
    pub fn find_all<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut out = Vec::new();
        self.collect_named(name, &mut out);
        out
    }

    fn collect_named<'a>(&'a self, name: &str, out: &mut Vec<&'a Element>) {
        for child in self.elements() {
            if child.name == name {
                out.push(child);
            }
            child.collect_named(name, out);
        }
    }

    /// Concatenated descendant text, unnormalized.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) if e.name == "br" => out.push(' '),
                Node::Element(e) => e.push_text(out),
            }
        }
    }
}

/// Build an element tree from XML text. Returns the root element.
///
/// Comments, processing instructions and the doctype are discarded. Entities the reader
/// cannot resolve are kept verbatim rather than failing the document. Nesting below
/// [`MAX_DEPTH`] keeps its text but loses its elements.
pub fn parse_tree(xml: &str) -> Result<Element, ParseFailure> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    // Open elements below MAX_DEPTH that were not kept.
    let mut flattened = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) if stack.len() >= MAX_DEPTH => flattened += 1,
            Ok(Event::Empty(_)) if stack.len() >= MAX_DEPTH => push_text(&mut stack, " ".into()),
            Ok(Event::End(_)) if flattened > 0 => flattened -= 1,
            Ok(Event::Start(e)) => stack.push(open_element(&e)?),
            Ok(Event::Empty(e)) => {
                let element = open_element(&e)?;
                attach(element, &mut stack, &mut root)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ParseFailure::malformed("unbalanced closing tag"))?;
                attach(element, &mut stack, &mut root)?;
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map(|t| t.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&e).into_owned());
                push_text(&mut stack, text);
            }
            Ok(Event::CData(e)) => {
                push_text(&mut stack, String::from_utf8_lossy(&e).into_owned());
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ParseFailure::malformed(format!(
                    "xml error at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ParseFailure::malformed(format!(
            "unclosed element <{}>",
            open.name
        )));
    }
    root.ok_or_else(|| ParseFailure::malformed("no root element"))
}

fn open_element(e: &BytesStart) -> Result<Element, ParseFailure> {
    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| {
            ParseFailure::malformed(format!("bad attribute on <{}>: {}", name, err))
        })?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
        attrs.push((key, value));
    }
    Ok(Element {
        name,
        attrs,
        children: Vec::new(),
    })
}

fn attach(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), ParseFailure> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(Node::Element(element));
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(ParseFailure::malformed("multiple root elements")),
    }
}

fn push_text(stack: &mut [Element], text: String) {
    // Text outside the root (whitespace between prolog items) is dropped.
    if let Some(parent) = stack.last_mut() {
        if let Some(Node::Text(prev)) = parent.children.last_mut() {
            prev.push_str(&text);
        } else {
            parent.children.push(Node::Text(text));
        }
    }
}
