use std::sync::LazyLock;

use html_escape::{encode_double_quoted_attribute, encode_text};
use regex::Regex;

use super::xml::{Element, Node};

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const MEDIA_LABEL: &str = "[Media: see original document]";
pub const MEDIA_TEXT: &str = "[media]";

/// HTML and plain text for one piece of content, produced in a single traversal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub html: String,
    pub text: String,
    pub has_table: bool,
    pub has_list: bool,
}

impl Rendered {
    fn escaped(raw: &str) -> Self {
        Rendered {
            html: encode_text(&WS_RE.replace_all(raw, " ")).into_owned(),
            text: raw.to_string(),
            ..Default::default()
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    fn push_inline(&mut self, other: Rendered) {
        self.html.push_str(&other.html);
        self.text.push_str(&other.text);
        self.has_table |= other.has_table;
        self.has_list |= other.has_list;
    }

    fn push_block(&mut self, other: Rendered) {
        if other.html.is_empty() {
            return;
        }
        self.push_inline(other);
        if !self.text.ends_with(' ') {
            self.text.push(' ');
        }
    }
}

/// Inherited emphasis flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl Style {
    /// Apply a `styleCode` attribute on top of the inherited flags.
    pub fn with_code(self, code: Option<&str>) -> Style {
        let mut style = self;
        for token in code
            .unwrap_or_default()
            .split(|c: char| c.is_whitespace() || c == ',')
        {
            match token.to_ascii_lowercase().as_str() {
                "bold" | "emphasis" => style.bold = true,
                "italics" | "italic" => style.italic = true,
                "underline" => style.underline = true,
                _ => {}
            }
        }
        style
    }

    fn added_since(self, base: Style) -> Style {
        Style {
            bold: self.bold && !base.bold,
            italic: self.italic && !base.italic,
            underline: self.underline && !base.underline,
        }
    }

    fn open(self) -> String {
        let mut s = String::new();
        if self.bold {
            s.push_str("<strong>");
        }
        if self.italic {
            s.push_str("<em>");
        }
        if self.underline {
            s.push_str("<u>");
        }
        s
    }

    fn close(self) -> String {
        let mut s = String::new();
        if self.underline {
            s.push_str("</u>");
        }
        if self.italic {
            s.push_str("</em>");
        }
        if self.bold {
            s.push_str("</strong>");
        }
        s
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Paragraph,
    List,
    Table,
    Span,
    LineBreak,
    Media,
    Unknown,
}

impl ElementKind {
    pub fn of(name: &str) -> Self {
        match name {
            "paragraph" => ElementKind::Paragraph,
            "list" => ElementKind::List,
            "table" => ElementKind::Table,
            "content" => ElementKind::Span,
            "br" => ElementKind::LineBreak,
            "renderMultiMedia" | "renderMultimedia" => ElementKind::Media,
            _ => ElementKind::Unknown,
        }
    }

    fn is_block(self) -> bool {
        matches!(
            self,
            ElementKind::Paragraph | ElementKind::List | ElementKind::Table
        )
    }
}

/// Where loose inline runs end up: wrapped in `<p>` (section bodies, paragraphs)
/// or left bare (list items, table cells). Inside a span nothing block-level may
/// appear, so nested paragraphs, lists and tables keep only their text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Block,
    Flow,
    Inline,
}

/// Render the body of a section's `text` element.
pub fn render_text(text: &Element) -> Rendered {
    render_flow(
        &text.children,
        Style::default(),
        Style::default(),
        Context::Block,
    )
}

/// Render a single element, dispatching on its kind. Never fails.
pub fn render_element(el: &Element, style: Style) -> Rendered {
    match ElementKind::of(&el.name) {
        ElementKind::Paragraph => render_paragraph(el, style),
        ElementKind::List => render_list(el, style),
        ElementKind::Table => render_table(el, style),
        ElementKind::Span => render_span(el, style),
        ElementKind::LineBreak => Rendered {
            html: "<br/>".to_string(),
            text: " ".to_string(),
            ..Default::default()
        },
        ElementKind::Media => render_media(el, Context::Block),
        ElementKind::Unknown => Rendered::escaped(&el.text_content()),
    }
}

fn render_flow(children: &[Node], style: Style, emphasis: Style, context: Context) -> Rendered {
    let mut out = Rendered::default();
    let mut run = Rendered::default();

    for node in children {
        match node {
            Node::Text(t) => run.push_inline(Rendered::escaped(t)),
            Node::Element(el) => {
                let kind = ElementKind::of(&el.name);
                if kind.is_block() && context == Context::Inline {
                    let block = render_element(el, style);
                    if !block.is_blank() {
                        run.push_inline(Rendered::escaped(&format!(" {} ", block.text)));
                    }
                } else if kind.is_block() {
                    flush_run(&mut out, &mut run, emphasis, context);
                    out.push_block(render_element(el, style));
                } else if kind == ElementKind::Media && context == Context::Block {
                    flush_run(&mut out, &mut run, emphasis, context);
                    out.push_block(render_media(el, context));
                } else if kind == ElementKind::Media {
                    run.push_inline(render_media(el, context));
                } else {
                    run.push_inline(render_element(el, style));
                }
            }
        }
    }
    flush_run(&mut out, &mut run, emphasis, context);
    out
}

fn flush_run(out: &mut Rendered, run: &mut Rendered, emphasis: Style, context: Context) {
    let run = std::mem::take(run);
    if run.is_blank() {
        return;
    }
    match context {
        Context::Block => out.push_block(Rendered {
            html: format!(
                "<p>{}{}{}</p>",
                emphasis.open(),
                run.html.trim(),
                emphasis.close()
            ),
            ..run
        }),
        Context::Flow | Context::Inline => out.push_inline(run),
    }
}

fn render_paragraph(el: &Element, inherited: Style) -> Rendered {
    let style = inherited.with_code(el.attr("styleCode"));
    render_flow(
        &el.children,
        style,
        style.added_since(inherited),
        Context::Block,
    )
}

fn render_span(el: &Element, inherited: Style) -> Rendered {
    let style = inherited.with_code(el.attr("styleCode"));
    let inner = render_flow(&el.children, style, Style::default(), Context::Inline);
    if inner.is_blank() {
        // Keep the word boundary a whitespace-only span may carry.
        return if inner.text.is_empty() {
            Rendered::default()
        } else {
            Rendered::escaped(" ")
        };
    }
    let added = style.added_since(inherited);
    Rendered {
        html: format!("{}{}{}", added.open(), inner.html, added.close()),
        ..inner
    }
}

/// Render children as bare flow content and trim: the body of an `li`, cell or caption.
fn render_cell_body(el: &Element, style: Style) -> Rendered {
    let body = render_flow(&el.children, style, Style::default(), Context::Flow);
    Rendered {
        html: body.html.trim().to_string(),
        text: collapse_whitespace(&body.text),
        ..body
    }
}

fn render_list(el: &Element, style: Style) -> Rendered {
    let mut out = Rendered::default();
    let mut items_html = String::new();
    let mut texts = Vec::new();

    for item in el.children_named("item") {
        let body = render_cell_body(item, style);
        if body.text.is_empty() {
            continue;
        }
        items_html.push_str(&format!("<li>{}</li>", body.html));
        texts.push(body.text);
        out.has_table |= body.has_table;
        out.has_list |= body.has_list;
    }
    if texts.is_empty() {
        return Rendered::default();
    }

    let ordered = el
        .attr("listType")
        .is_some_and(|t| t.eq_ignore_ascii_case("ordered"));
    let tag = if ordered { "ol" } else { "ul" };

    if let Some(caption) = el.child("caption").map(|c| render_cell_body(c, style)) {
        if !caption.text.is_empty() {
            out.html
                .push_str(&format!("<p class=\"list-caption\">{}</p>", caption.html));
            texts.insert(0, caption.text);
        }
    }
    out.html
        .push_str(&format!("<{tag}>{items_html}</{tag}>"));
    out.text = texts.join(" ");
    out.has_list = true;
    out
}

struct RenderedRow {
    html: String,
    texts: Vec<String>,
    has_list: bool,
}

fn render_row(tr: &Element, header: bool, style: Style) -> Option<RenderedRow> {
    let mut row = RenderedRow {
        html: String::from("<tr>"),
        texts: Vec::new(),
        has_list: false,
    };
    let mut any_text = false;

    for cell in tr.elements().filter(|c| c.name == "th" || c.name == "td") {
        let body = render_cell_body(cell, style);
        let tag = if header || cell.name == "th" { "th" } else { "td" };
        let mut attrs = String::new();
        for key in ["colspan", "rowspan"] {
            if let Some(v) = cell.attr(key) {
                attrs.push_str(&format!(
                    " {}=\"{}\"",
                    key,
                    encode_double_quoted_attribute(v)
                ));
            }
        }
        row.html
            .push_str(&format!("<{tag}{attrs}>{}</{tag}>", body.html));
        any_text |= !body.text.is_empty();
        if !body.text.is_empty() {
            row.texts.push(body.text);
        }
        row.has_list |= body.has_list;
    }
    row.html.push_str("</tr>");

    if any_text {
        Some(row)
    } else {
        None
    }
}

fn render_table(el: &Element, style: Style) -> Rendered {
    let mut header_rows = Vec::new();
    let mut body_rows = Vec::new();
    let mut footer_rows = Vec::new();

    for child in el.elements() {
        match child.name.as_str() {
            "thead" => header_rows.extend(child.children_named("tr")),
            "tbody" => body_rows.extend(child.children_named("tr")),
            "tfoot" => footer_rows.extend(child.children_named("tr")),
            "tr" => body_rows.push(child),
            _ => {}
        }
    }
    body_rows.extend(footer_rows);

    // Pass one: header rows. Pass two: body rows.
    let header: Vec<RenderedRow> = header_rows
        .into_iter()
        .filter_map(|tr| render_row(tr, true, style))
        .collect();
    let body: Vec<RenderedRow> = body_rows
        .into_iter()
        .filter_map(|tr| render_row(tr, false, style))
        .collect();

    if header.is_empty() && body.is_empty() {
        return Rendered::default();
    }

    let mut out = Rendered {
        html: String::from("<table>"),
        has_table: true,
        ..Default::default()
    };
    let mut texts = Vec::new();

    if let Some(caption) = el.child("caption").map(|c| render_cell_body(c, style)) {
        if !caption.text.is_empty() {
            out.html
                .push_str(&format!("<caption>{}</caption>", caption.html));
            texts.push(caption.text);
        }
    }

    for (tag, rows) in [("thead", &header), ("tbody", &body)] {
        if rows.is_empty() {
            continue;
        }
        out.html.push_str(&format!("<{tag}>"));
        for row in rows.iter() {
            out.html.push_str(&row.html);
            texts.extend(row.texts.iter().cloned());
            out.has_list |= row.has_list;
        }
        out.html.push_str(&format!("</{tag}>"));
    }
    out.html.push_str("</table>");
    out.text = texts.join(" ");
    out
}

fn render_media(el: &Element, context: Context) -> Rendered {
    let tag = match context {
        Context::Block => "div",
        Context::Flow | Context::Inline => "span",
    };
    let reference = el
        .attr("referencedObject")
        .map(|r| format!(" data-ref=\"{}\"", encode_double_quoted_attribute(r)))
        .unwrap_or_default();
    Rendered {
        html: format!("<{tag} class=\"media-placeholder\"{reference}>{MEDIA_LABEL}</{tag}>"),
        text: MEDIA_TEXT.to_string(),
        ..Default::default()
    }
}

/// Collapse whitespace runs to single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    WS_RE.replace_all(s, " ").trim().to_string()
}
