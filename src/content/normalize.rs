//! Markup → canonical node normalization.
//!
//! Rules:
//! - `<h3>`/`<h4>` become headings; `<p>` becomes a paragraph of runs;
//!   `<ul>`/`<ol>` become lists with one item per `<li>`.
//! - Wrapper elements (`div`, `section`, tables, ...) become containers of
//!   their normalized children.
//! - Inline content sitting directly inside a wrapper is gathered into an
//!   anonymous paragraph.
//! - Any other block with text falls back to a plain paragraph of its text.
//! - Whitespace-only segments are dropped and empty blocks are omitted.
//!
//! Normalization never fails. Broken markup is repaired by the parser and
//! anything unrecognized degrades to plain text.

use crate::markup::{Dom, DomNodeId, NodeData, body, parse_markup};
use crate::model::{Book, Chapter};

use super::node::{Node, TextRun, strip_nodes};

/// Elements whose children are normalized in place of the element itself.
const WRAPPERS: &[&str] = &[
    "html",
    "body",
    "div",
    "section",
    "article",
    "aside",
    "main",
    "header",
    "footer",
    "nav",
    "blockquote",
    "figure",
    "center",
    "details",
    "table",
    "thead",
    "tbody",
    "tfoot",
    "tr",
    "dl",
];

const INLINE: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "cite", "code", "data", "del", "dfn", "em", "font", "i",
    "img", "ins", "kbd", "label", "mark", "q", "s", "samp", "small", "span", "strike", "strong",
    "sub", "sup", "time", "u", "var", "wbr",
];

const SKIPPED: &[&str] = &[
    "head", "script", "style", "template", "noscript", "title", "meta", "link",
];

/// Normalize one chapter's markup into canonical nodes.
///
/// ```
/// use bookpress::content::{normalize, Node, TextRun};
///
/// let nodes = normalize("<p>Plain <strong>bold</strong></p><h3>Section</h3>");
/// assert_eq!(nodes[0], Node::Paragraph {
///     runs: vec![TextRun::plain("Plain"), TextRun::bold(" bold")],
/// });
/// assert_eq!(nodes[1], Node::Heading { level: 3, text: "Section".into() });
/// ```
pub fn normalize(markup: &str) -> Vec<Node> {
    let dom = parse_markup(markup);
    let root = body(&dom);
    Normalizer { dom: &dom }.blocks(root)
}

/// Strip mode: the chapter as plain text, blocks separated by blank lines.
pub fn strip(markup: &str) -> String {
    strip_nodes(&normalize(markup))
}

/// A chapter paired with its normalized content.
#[derive(Debug, Clone)]
pub struct NormalizedChapter<'a> {
    /// 1-based position in the book.
    pub number: usize,
    pub chapter: &'a Chapter,
    pub nodes: Vec<Node>,
}

impl NormalizedChapter<'_> {
    pub fn stripped(&self) -> String {
        strip_nodes(&self.nodes)
    }
}

/// Normalize every chapter of a book, in order.
pub fn normalize_book(book: &Book) -> Vec<NormalizedChapter<'_>> {
    book.chapters()
        .iter()
        .enumerate()
        .map(|(i, chapter)| NormalizedChapter {
            number: i + 1,
            chapter,
            nodes: normalize(&chapter.content),
        })
        .collect()
}

enum Kind {
    Inline,
    Block,
    Skip,
}

struct Normalizer<'a> {
    dom: &'a Dom,
}

impl Normalizer<'_> {
    fn kind(&self, id: DomNodeId) -> Kind {
        match self.dom.get(id).map(|n| &n.data) {
            Some(NodeData::Text(_)) => Kind::Inline,
            Some(NodeData::Element { .. }) => {
                let tag = self.dom.tag(id).unwrap_or_default();
                if SKIPPED.contains(&tag) {
                    Kind::Skip
                } else if INLINE.contains(&tag) {
                    Kind::Inline
                } else {
                    Kind::Block
                }
            }
            _ => Kind::Skip,
        }
    }

    /// Normalize the children of a block-level parent.
    fn blocks(&self, parent: DomNodeId) -> Vec<Node> {
        let mut out = Vec::new();
        let mut pending: Vec<DomNodeId> = Vec::new();

        for child in self.dom.children(parent) {
            match self.kind(child) {
                Kind::Inline => pending.push(child),
                Kind::Skip => {}
                Kind::Block => {
                    self.flush_inline(&mut pending, &mut out);
                    out.extend(self.block(child));
                }
            }
        }
        self.flush_inline(&mut pending, &mut out);

        out
    }

    /// Turn a run of loose inline nodes into an anonymous paragraph.
    fn flush_inline(&self, pending: &mut Vec<DomNodeId>, out: &mut Vec<Node>) {
        if pending.is_empty() {
            return;
        }
        let runs = self.runs(pending);
        pending.clear();
        if !runs.is_empty() {
            out.push(Node::Paragraph { runs });
        }
    }

    fn block(&self, id: DomNodeId) -> Option<Node> {
        let tag = self.dom.tag(id).unwrap_or_default();
        match tag {
            "p" => {
                let children: Vec<_> = self.dom.children(id).collect();
                let runs = self.runs(&children);
                (!runs.is_empty()).then_some(Node::Paragraph { runs })
            }
            "h3" | "h4" => {
                let text = collapse(&self.spaced_text(id));
                let level = if tag == "h3" { 3 } else { 4 };
                (!text.is_empty()).then_some(Node::Heading { level, text })
            }
            "ul" | "ol" => {
                let items: Vec<String> = self
                    .dom
                    .children(id)
                    .filter(|&c| !matches!(self.kind(c), Kind::Skip))
                    .map(|c| collapse(&self.spaced_text(c)))
                    .filter(|text| !text.is_empty())
                    .collect();
                (!items.is_empty()).then_some(Node::List {
                    ordered: tag == "ol",
                    items,
                })
            }
            _ if WRAPPERS.contains(&tag) => {
                let children = self.blocks(id);
                (!children.is_empty()).then_some(Node::Container { children })
            }
            _ => {
                let text = collapse(&self.spaced_text(id));
                (!text.is_empty()).then(|| Node::paragraph(text))
            }
        }
    }

    fn runs(&self, nodes: &[DomNodeId]) -> Vec<TextRun> {
        let mut builder = RunBuilder::default();

        for &id in nodes {
            match self.dom.get(id).map(|n| &n.data) {
                Some(NodeData::Text(text)) => builder.push(text, false, false),
                Some(NodeData::Element { .. }) => {
                    if matches!(self.kind(id), Kind::Skip) {
                        continue;
                    }
                    if self.dom.tag(id) == Some("br") {
                        builder.space();
                        continue;
                    }
                    let (bold, italic) = self.emphasis(id);
                    builder.push(&self.spaced_text(id), bold, italic);
                }
                _ => {}
            }
        }

        builder.finish()
    }

    /// Text of a subtree, with a space wherever a block element or `<br>`
    /// starts or ends.
    fn spaced_text(&self, id: DomNodeId) -> String {
        let mut out = String::new();
        self.collect_spaced(id, &mut out);
        out
    }

    fn collect_spaced(&self, id: DomNodeId, out: &mut String) {
        for child in self.dom.children(id) {
            match self.dom.get(child).map(|n| &n.data) {
                Some(NodeData::Text(text)) => out.push_str(text),
                Some(NodeData::Element { .. }) => match self.kind(child) {
                    Kind::Skip => {}
                    Kind::Inline if self.dom.tag(child) != Some("br") => {
                        self.collect_spaced(child, out);
                    }
                    _ => {
                        out.push(' ');
                        self.collect_spaced(child, out);
                        out.push(' ');
                    }
                },
                _ => {}
            }
        }
    }

    /// Emphasis flags of an inline wrapper.
    ///
    /// The wrapper's own tag decides, plus any wrapper that is its only
    /// meaningful child (so `<strong><em>x</em></strong>` is bold and
    /// italic). Mixed deeper nesting flattens to the outer flags.
    fn emphasis(&self, id: DomNodeId) -> (bool, bool) {
        let mut bold = false;
        let mut italic = false;
        let mut current = Some(id);

        while let Some(node) = current {
            match self.dom.tag(node) {
                Some("strong" | "b") => bold = true,
                Some("em" | "i") => italic = true,
                _ => {}
            }
            current = self.sole_element_child(node);
        }

        (bold, italic)
    }

    fn sole_element_child(&self, id: DomNodeId) -> Option<DomNodeId> {
        let mut found = None;
        for child in self.dom.children(id) {
            match self.dom.get(child).map(|n| &n.data) {
                Some(NodeData::Text(text)) if text.trim().is_empty() => {}
                Some(NodeData::Element { .. }) if found.is_none() => found = Some(child),
                _ => return None,
            }
        }
        found
    }
}

/// Accumulates runs, collapsing whitespace the way HTML rendering does.
#[derive(Default)]
struct RunBuilder {
    runs: Vec<TextRun>,
    pending_space: bool,
}

impl RunBuilder {
    fn push(&mut self, text: &str, bold: bool, italic: bool) {
        let body = collapse(text);
        if body.is_empty() {
            if !text.is_empty() {
                self.space();
            }
            return;
        }

        let leading = self.pending_space || text.starts_with(char::is_whitespace);
        let run_text = if leading && !self.runs.is_empty() {
            format!(" {body}")
        } else {
            body
        };
        self.pending_space = text.ends_with(char::is_whitespace);

        self.runs.push(TextRun {
            text: run_text,
            bold,
            italic,
        });
    }

    fn space(&mut self) {
        if !self.runs.is_empty() {
            self.pending_space = true;
        }
    }

    fn finish(self) -> Vec<TextRun> {
        self.runs
    }
}

/// Collapse internal whitespace to single spaces and trim the ends.
fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
