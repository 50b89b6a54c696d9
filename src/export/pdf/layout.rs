//! Page layout.
//!
//! The book is laid out into positioned lines before any PDF object is
//! written. Coordinates here run top-down: `y = 0` is the top edge of the
//! page, and the writer flips them.
//!
//! Four sections are laid out independently (title, contents, chapters,
//! colophon), then concatenated and numbered. Every page except the title
//! page gets a folio at bottom-center.

use serde::Deserialize;

use crate::config::Labels;
use crate::content::{
    NormalizedChapter, Node, TextRun, leaf_blocks, list_lines, normalize_book,
};
use crate::error::{RenderError, RenderResult};
use crate::export::{RenderContext, copyright_line};
use crate::model::{Book, BookInfo, starts_part};

use super::metrics::{ASCENT, FontStyle, TextMeasure};
use super::{PdfConfig, TocNumbering};

// Font sizes in points.
const TITLE_SIZE: f32 = 26.0;
const SUBTITLE_SIZE: f32 = 14.0;
const TAGLINE_SIZE: f32 = 12.0;
const CONTENTS_SIZE: f32 = 18.0;
const TOC_PART_SIZE: f32 = 12.0;
const PART_SIZE: f32 = 18.0;
const CHAPTER_LABEL_SIZE: f32 = 10.0;
const CHAPTER_TITLE_SIZE: f32 = 20.0;
const H3_SIZE: f32 = 14.0;
const H4_SIZE: f32 = 12.0;
const COLOPHON_SIZE: f32 = 10.0;
const FOLIO_SIZE: f32 = 9.0;

const LIST_INDENT: f32 = 14.0;
const TOC_INDENT: f32 = 14.0;
/// Width kept free at the right of contents lines for the page number.
const TOC_NUMBER_COLUMN: f32 = 40.0;
/// Page printed for the first chapter under [`TocNumbering::Sequential`].
const SEQUENTIAL_FIRST_PAGE: usize = 3;

pub type Color = [f32; 3];

const TEXT: Color = [0.2, 0.2, 0.2];
const ACCENT: Color = [0.851, 0.275, 0.937];
const PART_COLOR: Color = [0.545, 0.361, 0.965];
const MUTED: Color = [0.4, 0.4, 0.4];

/// Fixed page geometry, in points.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    /// Uniform margin on all four sides.
    pub margin: f32,
    /// Space above the bottom margin kept free for the folio.
    pub footer_reserve: f32,
    /// Distance of the folio baseline above the bottom edge.
    pub folio_offset: f32,
    pub body_size: f32,
    /// Line advance at `body_size`; other sizes scale proportionally.
    pub line_height: f32,
}

impl Default for PageGeometry {
    /// A4 portrait.
    fn default() -> Self {
        Self {
            width: 595.28,
            height: 841.89,
            margin: 56.0,
            footer_reserve: 24.0,
            folio_offset: 28.0,
            body_size: 11.0,
            line_height: 16.0,
        }
    }
}

impl PageGeometry {
    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// Lowest point a line box may reach.
    pub fn bottom_limit(&self) -> f32 {
        self.height - self.margin - self.footer_reserve
    }

    /// Line advance for text at `size`.
    pub fn advance(&self, size: f32) -> f32 {
        size * self.line_height / self.body_size
    }

    /// Reject geometries on which the largest line cannot fit an empty page.
    pub fn validate(&self) -> RenderResult<()> {
        let fields = [
            ("width", self.width),
            ("height", self.height),
            ("margin", self.margin),
            ("footer_reserve", self.footer_reserve),
            ("folio_offset", self.folio_offset),
            ("body_size", self.body_size),
            ("line_height", self.line_height),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(RenderError::Geometry(format!("{name} must be a non-negative number")));
            }
        }
        if self.body_size == 0.0 || self.line_height < self.body_size {
            return Err(RenderError::Geometry(
                "line_height must be at least body_size, and body_size positive".into(),
            ));
        }
        if self.content_width() < 2.0 * TITLE_SIZE {
            return Err(RenderError::Geometry(format!(
                "content width {} is too narrow",
                self.content_width()
            )));
        }
        if self.bottom_limit() - self.margin < self.advance(TITLE_SIZE) {
            return Err(RenderError::Geometry(format!(
                "usable height {} is too short",
                self.bottom_limit() - self.margin
            )));
        }
        Ok(())
    }
}

/// Active font, size and fill color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pen {
    pub font: FontStyle,
    pub size: f32,
    pub color: Color,
}

/// What a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Title,
    Contents,
    PartTitle,
    ChapterTitle,
    /// Chapter content: paragraphs, headings and list lines.
    Body,
    Colophon,
    Folio,
}

/// One line of text at a fixed position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub x: f32,
    /// Baseline, measured from the top edge.
    pub baseline: f32,
    pub pen: Pen,
    pub kind: LineKind,
}

impl TextLine {
    /// Lowest point of the line's glyphs, measured from the top edge.
    pub fn bottom(&self) -> f32 {
        self.baseline + (1.0 - ASCENT) * self.pen.size
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-based physical page number.
    pub number: usize,
    pub lines: Vec<TextLine>,
    /// Page number stamp; absent on the title page.
    pub folio: Option<TextLine>,
}

/// Page printed next to a chapter in the table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub chapter_id: String,
    pub chapter_number: usize,
    pub page: usize,
}

/// A fully laid out book.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfLayout {
    pub geometry: PageGeometry,
    pub pages: Vec<Page>,
    pub toc: Vec<TocEntry>,
}

impl PdfLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page the contents lists for a chapter.
    pub fn toc_page(&self, chapter_id: &str) -> Option<usize> {
        self.toc
            .iter()
            .find(|entry| entry.chapter_id == chapter_id)
            .map(|entry| entry.page)
    }

    /// All lines of one kind, in page order.
    pub fn lines(&self, kind: LineKind) -> impl Iterator<Item = &TextLine> {
        self.pages
            .iter()
            .flat_map(|page| page.lines.iter())
            .filter(move |line| line.kind == kind)
    }

    /// First page holding a chapter's title.
    pub fn chapter_start(&self, chapter_number: usize, labels: &Labels) -> Option<usize> {
        let marker = format!("{} {chapter_number}", labels.chapter);
        self.pages
            .iter()
            .find(|page| {
                page.lines
                    .iter()
                    .any(|line| line.kind == LineKind::ChapterTitle && line.text == marker)
            })
            .map(|page| page.number)
    }
}

#[derive(Debug, Clone, Copy)]
enum Align {
    /// Left margin plus an indent.
    Left(f32),
    Center,
}

/// A character and the face it is drawn in.
type Styled = (char, FontStyle);

/// Split a styled line into maximal runs of one face.
fn spans(line: &[Styled]) -> Vec<(FontStyle, String)> {
    let mut spans: Vec<(FontStyle, String)> = Vec::new();
    for &(c, font) in line {
        match spans.last_mut() {
            Some((last, text)) if *last == font => text.push(c),
            _ => spans.push((font, c.to_string())),
        }
    }
    spans
}

/// Stateful line placer for one section of pages.
struct Paginator<'a, M: TextMeasure + ?Sized> {
    geometry: &'a PageGeometry,
    metrics: &'a M,
    pages: Vec<Vec<TextLine>>,
    current: Vec<TextLine>,
    cursor_y: f32,
    pen: Pen,
}

impl<'a, M: TextMeasure + ?Sized> Paginator<'a, M> {
    fn new(geometry: &'a PageGeometry, metrics: &'a M) -> Self {
        Self {
            geometry,
            metrics,
            pages: Vec::new(),
            current: Vec::new(),
            cursor_y: geometry.margin,
            pen: Pen {
                font: FontStyle::Regular,
                size: geometry.body_size,
                color: TEXT,
            },
        }
    }

    fn set_pen(&mut self, font: FontStyle, size: f32, color: Color) {
        self.pen = Pen { font, size, color };
    }

    /// Index of the page being filled, within this section.
    fn page_index(&self) -> usize {
        self.pages.len()
    }

    fn move_to(&mut self, y: f32) {
        self.cursor_y = y;
    }

    fn gap(&mut self, points: f32) {
        self.cursor_y += points;
    }

    fn break_page(&mut self) {
        let done = std::mem::take(&mut self.current);
        self.pages.push(done);
        self.cursor_y = self.geometry.margin;
    }

    /// Make sure `height` points fit below the cursor, starting a new page
    /// when they would cross the bottom limit. An empty page always takes
    /// the line, so layout keeps moving forward.
    fn ensure_space(&mut self, height: f32) {
        if self.cursor_y + height <= self.geometry.bottom_limit() {
            return;
        }
        if self.current.is_empty() {
            self.cursor_y = self.geometry.margin;
        } else {
            self.break_page();
        }
    }

    fn text_width(&self, text: &str) -> RenderResult<f32> {
        self.measure(text, self.pen.font)
    }

    /// Width of `text` at the current size in `font`.
    fn measure(&self, text: &str, font: FontStyle) -> RenderResult<f32> {
        let width = self.metrics.width(text, font, self.pen.size);
        if width.is_finite() && width >= 0.0 {
            Ok(width)
        } else {
            Err(RenderError::Measure(format!("width {width} for {text:?}")))
        }
    }

    fn styled_width(&self, chars: &[Styled]) -> RenderResult<f32> {
        spans(chars)
            .iter()
            .try_fold(0.0, |width, (font, text)| Ok(width + self.measure(text, *font)?))
    }

    fn available(&self, align: Align) -> f32 {
        match align {
            Align::Left(indent) => self.geometry.content_width() - indent,
            Align::Center => self.geometry.content_width(),
        }
    }

    /// Draw one line and advance the cursor. Returns the baseline.
    fn draw(&mut self, text: String, align: Align, kind: LineKind) -> RenderResult<f32> {
        let advance = self.geometry.advance(self.pen.size);
        self.ensure_space(advance);

        let width = self.text_width(&text)?;
        let x = match align {
            Align::Left(indent) => self.geometry.margin + indent,
            Align::Center => (self.geometry.width - width) / 2.0,
        };
        let baseline = self.cursor_y + self.pen.size * ASCENT;
        self.current.push(TextLine {
            text,
            x,
            baseline,
            pen: self.pen,
            kind,
        });
        self.cursor_y += advance;
        Ok(baseline)
    }

    /// Place text flush against the right margin on an existing baseline.
    fn place_right(&mut self, text: String, baseline: f32, kind: LineKind) -> RenderResult<()> {
        let width = self.text_width(&text)?;
        self.current.push(TextLine {
            text,
            x: self.geometry.width - self.geometry.margin - width,
            baseline,
            pen: self.pen,
            kind,
        });
        Ok(())
    }

    /// Draw one line made of differently styled spans on a shared baseline.
    /// Size and color come from the current pen.
    fn draw_styled(&mut self, line: &[Styled], align: Align, kind: LineKind) -> RenderResult<()> {
        let advance = self.geometry.advance(self.pen.size);
        self.ensure_space(advance);

        let width = self.styled_width(line)?;
        let mut x = match align {
            Align::Left(indent) => self.geometry.margin + indent,
            Align::Center => (self.geometry.width - width) / 2.0,
        };
        let baseline = self.cursor_y + self.pen.size * ASCENT;
        for (font, text) in spans(line) {
            let span_width = self.measure(&text, font)?;
            self.current.push(TextLine {
                text,
                x,
                baseline,
                pen: Pen { font, ..self.pen },
                kind,
            });
            x += span_width;
        }
        self.cursor_y += advance;
        Ok(())
    }

    fn draw_wrapped(&mut self, text: &str, align: Align, kind: LineKind) -> RenderResult<()> {
        for line in self.wrap(text, self.available(align))? {
            self.draw(line, align, kind)?;
        }
        Ok(())
    }

    /// Wrap and draw a paragraph, keeping each run in its own face.
    fn draw_runs(&mut self, runs: &[TextRun], align: Align, kind: LineKind) -> RenderResult<()> {
        let mut words: Vec<Vec<Styled>> = Vec::new();
        let mut word = Vec::new();
        for run in runs {
            let font = FontStyle::from_flags(run.bold, run.italic);
            for c in run.text.chars() {
                if !c.is_whitespace() {
                    word.push((c, font));
                } else if !word.is_empty() {
                    words.push(std::mem::take(&mut word));
                }
            }
        }
        if !word.is_empty() {
            words.push(word);
        }

        for line in self.wrap_styled(&words, self.available(align))? {
            self.draw_styled(&line, align, kind)?;
        }
        Ok(())
    }

    /// Greedy wrap by measured width with the current pen. Words wider than
    /// `max_width` are split between characters.
    fn wrap(&self, text: &str, max_width: f32) -> RenderResult<Vec<String>> {
        let font = self.pen.font;
        let words: Vec<Vec<Styled>> = text
            .split_whitespace()
            .map(|word| word.chars().map(|c| (c, font)).collect())
            .collect();
        let lines = self.wrap_styled(&words, max_width)?;
        Ok(lines
            .into_iter()
            .map(|line| line.into_iter().map(|(c, _)| c).collect())
            .collect())
    }

    /// Greedy wrap of styled words. The space between two words takes the
    /// face of the character before it.
    fn wrap_styled(&self, words: &[Vec<Styled>], max_width: f32) -> RenderResult<Vec<Vec<Styled>>> {
        let mut lines = Vec::new();
        let mut line: Vec<Styled> = Vec::new();
        let mut line_width = 0.0;

        for word in words {
            let word_width = self.styled_width(word)?;
            if let Some(&(_, font)) = line.last() {
                let space = self.measure(" ", font)?;
                if line_width + space + word_width <= max_width {
                    line.push((' ', font));
                    line.extend_from_slice(word);
                    line_width += space + word_width;
                    continue;
                }
                lines.push(std::mem::take(&mut line));
            }
            if word_width <= max_width {
                line.extend_from_slice(word);
                line_width = word_width;
                continue;
            }

            let mut piece_width = 0.0;
            let mut buf = [0u8; 4];
            for &(c, font) in word {
                let char_width = self.measure(c.encode_utf8(&mut buf), font)?;
                if !line.is_empty() && piece_width + char_width > max_width {
                    lines.push(std::mem::take(&mut line));
                    piece_width = 0.0;
                }
                line.push((c, font));
                piece_width += char_width;
            }
            line_width = piece_width;
        }

        if !line.is_empty() {
            lines.push(line);
        }
        Ok(lines)
    }

    fn finish(mut self) -> Vec<Vec<TextLine>> {
        if !self.current.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

/// Lay out a book.
///
/// With [`TocNumbering::Physical`] the chapters are laid out before the
/// contents, so every contents entry names the page the chapter really
/// starts on. Contents lines do not depend on the numbers they print, so the
/// contents section has the same length either way.
pub fn paginate<M: TextMeasure + ?Sized>(
    book: &Book,
    ctx: &RenderContext,
    config: &PdfConfig,
    labels: &Labels,
    metrics: &M,
) -> RenderResult<PdfLayout> {
    let geometry = &config.geometry;
    geometry.validate()?;

    let chapters = normalize_book(book);

    let title = layout_title(book.info(), geometry, metrics)?;
    let (content, starts) = layout_chapters(book, &chapters, labels, geometry, metrics)?;
    let colophon = layout_colophon(book.info(), ctx, geometry, metrics)?;

    let numbers: Vec<usize> = match config.toc_numbering {
        TocNumbering::Sequential => (0..chapters.len())
            .map(|i| SEQUENTIAL_FIRST_PAGE + i)
            .collect(),
        TocNumbering::Physical => {
            let placeholder = vec![0; chapters.len()];
            let toc_pages = layout_toc(book, &placeholder, labels, geometry, metrics)?.len();
            let first_content = title.len() + toc_pages + 1;
            starts.iter().map(|start| first_content + start).collect()
        }
    };
    let toc = layout_toc(book, &numbers, labels, geometry, metrics)?;

    let mut pages = Vec::new();
    let sections = [title, toc, content, colophon];
    for lines in sections.into_iter().flatten() {
        let number = pages.len() + 1;
        let folio = (number > 1).then(|| folio_line(number, geometry, metrics));
        pages.push(Page {
            number,
            lines,
            folio,
        });
    }

    let toc = chapters
        .iter()
        .zip(&numbers)
        .map(|(normalized, &page)| TocEntry {
            chapter_id: normalized.chapter.id.clone(),
            chapter_number: normalized.number,
            page,
        })
        .collect();

    Ok(PdfLayout {
        geometry: *geometry,
        pages,
        toc,
    })
}

fn folio_line<M: TextMeasure + ?Sized>(
    number: usize,
    geometry: &PageGeometry,
    metrics: &M,
) -> TextLine {
    let text = number.to_string();
    let width = metrics.width(&text, FontStyle::Regular, FOLIO_SIZE);
    TextLine {
        x: (geometry.width - width) / 2.0,
        baseline: geometry.height - geometry.folio_offset,
        text,
        pen: Pen {
            font: FontStyle::Regular,
            size: FOLIO_SIZE,
            color: MUTED,
        },
        kind: LineKind::Folio,
    }
}

fn layout_title<M: TextMeasure + ?Sized>(
    info: &BookInfo,
    geometry: &PageGeometry,
    metrics: &M,
) -> RenderResult<Vec<Vec<TextLine>>> {
    let mut p = Paginator::new(geometry, metrics);
    let gap = geometry.line_height;

    let blocks = [
        (&info.title, FontStyle::Bold, TITLE_SIZE, ACCENT),
        (&info.subtitle, FontStyle::Regular, SUBTITLE_SIZE, MUTED),
        (&info.tagline, FontStyle::Italic, TAGLINE_SIZE, MUTED),
    ];

    // Measure the block first so it can be centered vertically.
    let mut wrapped = Vec::new();
    let mut height = 0.0;
    for (text, font, size, color) in blocks {
        if text.trim().is_empty() {
            continue;
        }
        p.set_pen(font, size, color);
        let lines = p.wrap(text, geometry.content_width())?;
        height += lines.len() as f32 * geometry.advance(size) + gap;
        wrapped.push((p.pen, lines));
    }

    p.move_to(((geometry.height - height) / 2.0).max(geometry.margin));
    for (pen, lines) in wrapped {
        p.pen = pen;
        for line in lines {
            p.draw(line, Align::Center, LineKind::Title)?;
        }
        p.gap(gap);
    }

    let mut pages = p.finish();
    if pages.is_empty() {
        pages.push(Vec::new());
    }
    Ok(pages)
}

fn layout_toc<M: TextMeasure + ?Sized>(
    book: &Book,
    numbers: &[usize],
    labels: &Labels,
    geometry: &PageGeometry,
    metrics: &M,
) -> RenderResult<Vec<Vec<TextLine>>> {
    let mut p = Paginator::new(geometry, metrics);

    p.set_pen(FontStyle::Bold, CONTENTS_SIZE, ACCENT);
    p.draw(labels.contents.clone(), Align::Left(0.0), LineKind::Contents)?;
    p.gap(geometry.line_height * 0.5);

    let title_width = geometry.content_width() - TOC_INDENT - TOC_NUMBER_COLUMN;
    for group in book.part_groups() {
        if let Some(label) = group.label {
            p.gap(geometry.line_height * 0.5);
            p.set_pen(FontStyle::Bold, TOC_PART_SIZE, PART_COLOR);
            p.draw_wrapped(label, Align::Left(0.0), LineKind::Contents)?;
        }

        p.set_pen(FontStyle::Regular, geometry.body_size, TEXT);
        for entry in &group.chapters {
            let page = numbers.get(entry.number - 1).copied().unwrap_or_default();
            let title = format!("{}. {}", entry.number, entry.chapter.title);
            for (i, line) in p.wrap(&title, title_width)?.into_iter().enumerate() {
                let baseline = p.draw(line, Align::Left(TOC_INDENT), LineKind::Contents)?;
                if i == 0 {
                    p.place_right(page.to_string(), baseline, LineKind::Contents)?;
                }
            }
        }
    }

    Ok(p.finish())
}

/// Lay out every chapter. Also returns, per chapter, the index of its first
/// page within this section.
fn layout_chapters<M: TextMeasure + ?Sized>(
    book: &Book,
    chapters: &[NormalizedChapter<'_>],
    labels: &Labels,
    geometry: &PageGeometry,
    metrics: &M,
) -> RenderResult<(Vec<Vec<TextLine>>, Vec<usize>)> {
    let mut p = Paginator::new(geometry, metrics);
    let mut starts = Vec::with_capacity(chapters.len());

    for (index, normalized) in chapters.iter().enumerate() {
        let chapter = normalized.chapter;
        if index > 0 {
            p.break_page();
        }
        starts.push(p.page_index());

        if starts_part(book.chapters(), index)
            && let Some(part) = chapter.part.as_deref()
        {
            p.set_pen(FontStyle::Bold, PART_SIZE, PART_COLOR);
            p.draw_wrapped(part, Align::Center, LineKind::PartTitle)?;
            p.gap(geometry.line_height);
        }

        p.set_pen(FontStyle::Regular, CHAPTER_LABEL_SIZE, MUTED);
        p.draw(
            format!("{} {}", labels.chapter, normalized.number),
            Align::Left(0.0),
            LineKind::ChapterTitle,
        )?;
        p.set_pen(FontStyle::Bold, CHAPTER_TITLE_SIZE, ACCENT);
        p.draw_wrapped(&chapter.title, Align::Left(0.0), LineKind::ChapterTitle)?;
        p.gap(geometry.line_height * 0.75);

        for node in leaf_blocks(&normalized.nodes) {
            layout_block(&mut p, node)?;
        }
    }

    Ok((p.finish(), starts))
}

fn layout_block<M: TextMeasure + ?Sized>(p: &mut Paginator<'_, M>, node: &Node) -> RenderResult<()> {
    let body_size = p.geometry.body_size;
    match node {
        Node::Paragraph { runs } => {
            p.set_pen(FontStyle::Regular, body_size, TEXT);
            p.draw_runs(runs, Align::Left(0.0), LineKind::Body)?;
        }
        Node::Heading { level, text } => {
            let size = match level {
                3 => H3_SIZE,
                4 => H4_SIZE,
                other => {
                    return Err(RenderError::Content(format!("unexpected heading level {other}")));
                }
            };
            p.gap(p.geometry.line_height * 0.25);
            p.set_pen(FontStyle::Bold, size, PART_COLOR);
            p.draw_wrapped(text, Align::Left(0.0), LineKind::Body)?;
        }
        Node::List { ordered, items } => {
            p.set_pen(FontStyle::Regular, body_size, TEXT);
            for line in list_lines(*ordered, items) {
                p.draw_wrapped(&line, Align::Left(LIST_INDENT), LineKind::Body)?;
            }
        }
        Node::Container { children } => {
            for child in children {
                layout_block(p, child)?;
            }
            return Ok(());
        }
    }
    p.gap(p.geometry.line_height * 0.5);
    Ok(())
}

fn layout_colophon<M: TextMeasure + ?Sized>(
    info: &BookInfo,
    ctx: &RenderContext,
    geometry: &PageGeometry,
    metrics: &M,
) -> RenderResult<Vec<Vec<TextLine>>> {
    let mut p = Paginator::new(geometry, metrics);
    p.move_to(geometry.height / 2.0);

    p.set_pen(FontStyle::Bold, COLOPHON_SIZE, TEXT);
    p.draw_wrapped(&copyright_line(info, ctx.year), Align::Center, LineKind::Colophon)?;

    if !info.disclaimer.is_empty() {
        p.gap(geometry.line_height * 0.5);
        p.set_pen(FontStyle::Italic, COLOPHON_SIZE, MUTED);
        p.draw_wrapped(&info.disclaimer, Align::Center, LineKind::Colophon)?;
    }
    if !info.site.is_empty() {
        p.gap(geometry.line_height * 0.5);
        p.set_pen(FontStyle::Regular, COLOPHON_SIZE, MUTED);
        p.draw_wrapped(&info.site, Align::Center, LineKind::Colophon)?;
    }

    Ok(p.finish())
}

#[cfg(test)]
mod tests {
    use super::super::metrics::FontSet;
    use super::*;
    use crate::content::strip;
    use crate::model::Chapter;

    fn layout_with(book: &Book, config: &PdfConfig) -> PdfLayout {
        let fonts = FontSet::bundled().unwrap();
        paginate(book, &RenderContext::new(2025), config, &Labels::default(), &*fonts).unwrap()
    }

    fn layout(book: &Book) -> PdfLayout {
        layout_with(book, &PdfConfig::default())
    }

    fn long_paragraphs(words: usize) -> String {
        let sentence = "The quick brown fox jumps over the lazy dog and keeps running far away.";
        let mut out = String::new();
        let mut count = 0;
        while count < words {
            out.push_str("<p>");
            out.push_str(sentence);
            out.push(' ');
            out.push_str(sentence);
            out.push_str("</p>");
            count += 28;
        }
        out
    }

    fn scenario_book() -> Book {
        Book::new(
            BookInfo::new("Test Code").with_subtitle("Beyond").with_tagline("Theory"),
            vec![
                Chapter::new("one", "First", "<p>Alpha</p>").with_part("Part One"),
                Chapter::new("two", "Second", "<p>Beta</p>").with_part("Part One"),
            ],
        )
        .unwrap()
    }

    fn words(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_scenario_pages_three_and_four() {
        for numbering in [TocNumbering::Physical, TocNumbering::Sequential] {
            let config = PdfConfig {
                toc_numbering: numbering,
                ..Default::default()
            };
            let layout = layout_with(&scenario_book(), &config);
            assert_eq!(layout.toc_page("one"), Some(3), "{numbering:?}");
            assert_eq!(layout.toc_page("two"), Some(4), "{numbering:?}");
            assert_eq!(layout.chapter_start(1, &Labels::default()), Some(3));
            assert_eq!(layout.chapter_start(2, &Labels::default()), Some(4));
            // title, contents, two chapters, colophon
            assert_eq!(layout.page_count(), 5);
        }
    }

    #[test]
    fn test_page_numbers_strictly_increase_from_one() {
        let layout = layout(&scenario_book());
        for (i, page) in layout.pages.iter().enumerate() {
            assert_eq!(page.number, i + 1);
        }
        assert!(layout.pages[0].folio.is_none());
        for page in &layout.pages[1..] {
            let folio = page.folio.as_ref().unwrap();
            assert_eq!(folio.text, page.number.to_string());
        }
    }

    #[test]
    fn test_each_chapter_starts_a_page() {
        let layout = layout(&scenario_book());
        for page in &layout.pages {
            let titles = page
                .lines
                .iter()
                .filter(|l| l.kind == LineKind::ChapterTitle && l.text.starts_with("Chapter "))
                .count();
            assert!(titles <= 1);
        }
    }

    #[test]
    fn test_content_coverage_and_bottom_margin() {
        let book = Book::new(
            BookInfo::new("Long"),
            vec![
                Chapter::new("a", "A", long_paragraphs(2000)),
                Chapter::new(
                    "b",
                    "B",
                    format!(
                        "<h3>Heading</h3><ul><li>one</li><li>two</li></ul>{}<div><p>nested</p></div>",
                        long_paragraphs(600)
                    ),
                ),
                Chapter::new("c", "C", format!("<p>{}</p>", "x".repeat(500))),
            ],
        )
        .unwrap();
        let layout = layout(&book);
        let geometry = layout.geometry;
        let fonts = FontSet::bundled().unwrap();

        let drawn: Vec<String> = layout
            .lines(LineKind::Body)
            .flat_map(|line| words(&line.text))
            .collect();
        let expected: Vec<String> = book
            .chapters()
            .iter()
            .flat_map(|c| words(&strip(&c.content)))
            .collect();
        // The 500-character word is split across lines, so compare joined.
        assert_eq!(drawn.concat(), expected.concat());
        assert!(drawn.len() >= expected.len());

        for page in &layout.pages {
            for line in &page.lines {
                assert!(
                    line.bottom() <= geometry.height - geometry.margin,
                    "line {:?} below bottom margin on page {}",
                    line.text,
                    page.number
                );
                if line.kind != LineKind::Contents {
                    let width = fonts.width(&line.text, line.pen.font, line.pen.size);
                    assert!(line.x + width <= geometry.width - geometry.margin + 0.01);
                }
            }
        }
        assert!(layout.page_count() > 6);
    }

    #[test]
    fn test_mixed_emphasis_keeps_each_run_face() {
        let book = Book::new(
            BookInfo::new("T"),
            vec![Chapter::new(
                "a",
                "A",
                "<p>plain <strong>bold</strong> <em>italic</em> <strong><em>both</em></strong> end</p>",
            )],
        )
        .unwrap();
        let layout = layout(&book);

        let spans: Vec<(&str, FontStyle)> = layout
            .lines(LineKind::Body)
            .map(|line| (line.text.as_str(), line.pen.font))
            .collect();
        assert_eq!(
            spans,
            vec![
                ("plain ", FontStyle::Regular),
                ("bold ", FontStyle::Bold),
                ("italic ", FontStyle::Italic),
                ("both ", FontStyle::BoldItalic),
                ("end", FontStyle::Regular),
            ]
        );

        let lines: Vec<&TextLine> = layout.lines(LineKind::Body).collect();
        let fonts = FontSet::bundled().unwrap();
        for pair in lines.windows(2) {
            assert_eq!(pair[0].baseline, pair[1].baseline);
            let width = fonts.width(&pair[0].text, pair[0].pen.font, pair[0].pen.size);
            assert!((pair[0].x + width - pair[1].x).abs() < 1e-3);
        }
    }

    #[test]
    fn test_emphasis_survives_wrapping() {
        let sentence = "<strong>Bold words</strong> and <em>slanted words</em> repeat. ";
        let book = Book::new(
            BookInfo::new("T"),
            vec![Chapter::new("a", "A", format!("<p>{}</p>", sentence.repeat(40)))],
        )
        .unwrap();
        let layout = layout(&book);

        let body: Vec<&TextLine> = layout.lines(LineKind::Body).collect();
        let baselines: std::collections::BTreeSet<u32> =
            body.iter().map(|line| line.baseline.to_bits()).collect();
        assert!(baselines.len() > 3);
        for line in &body {
            let allowed: &[&str] = match line.pen.font {
                FontStyle::Bold => &["Bold words", "Bold", "words"],
                FontStyle::Italic => &["slanted words", "slanted", "words"],
                FontStyle::Regular => &["and", "repeat."],
                FontStyle::BoldItalic => &[],
            };
            let text = line.text.trim();
            assert!(allowed.contains(&text), "{text:?} in {:?}", line.pen.font);
        }
    }

    #[test]
    fn test_physical_numbering_tracks_long_chapters() {
        let book = Book::new(
            BookInfo::new("T"),
            vec![
                Chapter::new("a", "A", long_paragraphs(3000)),
                Chapter::new("b", "B", "<p>short</p>"),
            ],
        )
        .unwrap();
        let layout = layout(&book);
        let start_b = layout.chapter_start(2, &Labels::default()).unwrap();
        assert_eq!(layout.toc_page("a"), Some(3));
        assert_eq!(layout.toc_page("b"), Some(start_b));
        assert!(start_b > 4);

        let sequential = layout_with(
            &book,
            &PdfConfig {
                toc_numbering: TocNumbering::Sequential,
                ..Default::default()
            },
        );
        assert_eq!(sequential.toc_page("b"), Some(4));
    }

    #[test]
    fn test_physical_numbering_with_multi_page_contents() {
        let chapters: Vec<Chapter> = (1..=120)
            .map(|i| {
                Chapter::new(format!("c{i}"), format!("Chapter title {i}"), "<p>x</p>")
                    .with_part(format!("Part {}", i / 10))
            })
            .collect();
        let book = Book::new(BookInfo::new("Many"), chapters).unwrap();
        let layout = layout(&book);

        let toc_pages = layout
            .pages
            .iter()
            .filter(|p| p.lines.iter().any(|l| l.kind == LineKind::Contents))
            .count();
        assert!(toc_pages > 1);
        for entry in &layout.toc {
            assert_eq!(
                layout.chapter_start(entry.chapter_number, &Labels::default()),
                Some(entry.page)
            );
        }
        assert_eq!(layout.toc[0].page, 2 + toc_pages);
    }

    #[test]
    fn test_colophon_in_lower_half() {
        let book = Book::new(
            BookInfo::new("T")
                .with_copyright("Holder")
                .with_disclaimer("A working hypothesis.")
                .with_site("example.org"),
            vec![Chapter::new("a", "A", "<p>x</p>")],
        )
        .unwrap();
        let layout = layout(&book);
        let last = layout.pages.last().unwrap();
        let texts: Vec<&str> = last.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["© 2025 Holder", "A working hypothesis.", "example.org"]);
        assert!(last.lines.iter().all(|l| l.baseline > layout.geometry.height / 2.0));
        assert!(last.folio.is_some());
    }

    #[test]
    fn test_title_page_is_centered_and_unnumbered() {
        let layout = layout(&scenario_book());
        let first = &layout.pages[0];
        let texts: Vec<&str> = first.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["Test Code", "Beyond", "Theory"]);
        assert!(first.folio.is_none());
        let top = first.lines[0].baseline;
        assert!(top > layout.geometry.height / 3.0 && top < layout.geometry.height / 2.0);
    }

    #[test]
    fn test_empty_book_still_has_title_contents_and_colophon() {
        let book = Book::new(BookInfo::new(""), Vec::new()).unwrap();
        let layout = layout(&book);
        assert_eq!(layout.page_count(), 3);
        assert!(layout.toc.is_empty());
    }

    #[test]
    fn test_invalid_geometry_is_rejected() {
        let config = PdfConfig {
            geometry: PageGeometry {
                margin: 400.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let result = paginate(
            &scenario_book(),
            &RenderContext::new(2025),
            &config,
            &Labels::default(),
            &*FontSet::bundled().unwrap(),
        );
        assert!(matches!(result, Err(RenderError::Geometry(_))));
    }

    struct Broken;

    impl TextMeasure for Broken {
        fn width(&self, _text: &str, _font: FontStyle, _size: f32) -> f32 {
            f32::NAN
        }
    }

    #[test]
    fn test_measure_fault_is_an_error() {
        let result = paginate(
            &scenario_book(),
            &RenderContext::new(2025),
            &PdfConfig::default(),
            &Labels::default(),
            &Broken,
        );
        assert!(matches!(result, Err(RenderError::Measure(_))));
    }

    #[test]
    fn test_tight_page_still_makes_progress() {
        // Room for exactly two title lines per page.
        let geometry = PageGeometry {
            height: 56.0 * 2.0 + 24.0 + 16.0 * 26.0 / 11.0 * 2.0,
            ..Default::default()
        };
        let config = PdfConfig {
            geometry,
            ..Default::default()
        };
        let book = Book::new(
            BookInfo::new("T"),
            vec![Chapter::new("a", "A", long_paragraphs(800))],
        )
        .unwrap();
        let layout = layout_with(&book, &config);
        assert!(layout.page_count() > 10);
        for page in &layout.pages {
            for line in &page.lines {
                assert!(line.bottom() <= geometry.height - geometry.margin);
            }
        }
    }
}
