//! Canonical content nodes.
//!
//! The normalizer turns chapter markup into these; every renderer consumes
//! them. There is no markup left at this level.

/// Glyph prefixed to unordered list items.
pub const BULLET: &str = "•";

/// A span of text with uniform emphasis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italic: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            italic: false,
        }
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italic: true,
        }
    }
}

/// A block of normalized content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Never empty.
    Paragraph { runs: Vec<TextRun> },
    /// `level` is 3 or 4.
    Heading { level: u8, text: String },
    /// Items are unprefixed; see [`Node::list_lines`].
    List { ordered: bool, items: Vec<String> },
    /// Grouping from a wrapper element. Renderers draw only the children.
    Container { children: Vec<Node> },
}

impl Node {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Node::Paragraph {
            runs: vec![TextRun::plain(text)],
        }
    }

    /// Plain text of a block. List items are one per line; container
    /// children are separated by blank lines.
    pub fn plain_text(&self) -> String {
        match self {
            Node::Paragraph { runs } => runs.iter().map(|r| r.text.as_str()).collect(),
            Node::Heading { text, .. } => text.clone(),
            Node::List { ordered, items } => list_lines(*ordered, items).join("\n"),
            Node::Container { children } => strip_nodes(children),
        }
    }
}

/// Prefixed list lines: `"1. item"` for ordered lists, `"• item"` otherwise.
pub fn list_lines(ordered: bool, items: &[String]) -> Vec<String> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            if ordered {
                format!("{}. {item}", i + 1)
            } else {
                format!("{BULLET} {item}")
            }
        })
        .collect()
}

/// Leaf blocks in reading order, with containers flattened away.
pub fn leaf_blocks(nodes: &[Node]) -> Vec<&Node> {
    let mut out = Vec::new();
    collect_leaves(nodes, &mut out);
    out
}

fn collect_leaves<'a>(nodes: &'a [Node], out: &mut Vec<&'a Node>) {
    for node in nodes {
        match node {
            Node::Container { children } => collect_leaves(children, out),
            leaf => out.push(leaf),
        }
    }
}

/// Flatten nodes to a plain string with blank lines between blocks.
pub fn strip_nodes(nodes: &[Node]) -> String {
    leaf_blocks(nodes)
        .iter()
        .map(|node| node.plain_text())
        .collect::<Vec<_>>()
        .join("\n\n")
}
