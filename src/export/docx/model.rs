//! In-memory word-processor document: paragraphs of formatted runs.
//!
//! Measurements follow WordprocessingML units: sizes in half-points,
//! indents and spacing in twentieths of a point (twips).

/// A complete document ready for packaging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    pub language: String,
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Paragraph(p) => Some(p),
            Block::PageBreak => None,
        })
    }

    pub fn page_breaks(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::PageBreak))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Paragraph),
    /// Forced page break.
    PageBreak,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Justify,
}

impl Alignment {
    /// Value of `w:jc`.
    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Justify => "both",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    pub align: Alignment,
    /// Left indent in twips.
    pub indent: u32,
    /// Space before, in twips.
    pub spacing_before: u32,
    /// Space after, in twips.
    pub spacing_after: u32,
    /// Box border color (hex, no `#`).
    pub border: Option<String>,
}

impl Paragraph {
    pub fn new(runs: Vec<Run>) -> Self {
        Self {
            runs,
            ..Default::default()
        }
    }

    pub fn aligned(mut self, align: Alignment) -> Self {
        self.align = align;
        self
    }

    pub fn indented(mut self, twips: u32) -> Self {
        self.indent = twips;
        self
    }

    pub fn spacing(mut self, before: u32, after: u32) -> Self {
        self.spacing_before = before;
        self.spacing_after = after;
        self
    }

    pub fn bordered(mut self, color: &str) -> Self {
        self.border = Some(color.to_string());
        self
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    /// Font size in half-points.
    pub size: Option<u32>,
    /// Text color (hex, no `#`).
    pub color: Option<String>,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn size(mut self, half_points: u32) -> Self {
        self.size = Some(half_points);
        self
    }

    pub fn color(mut self, hex: &str) -> Self {
        self.color = Some(hex.to_string());
        self
    }
}
