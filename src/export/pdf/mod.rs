//! Paginated PDF exporter.
//!
//! Layout is computed first ([`paginate`]) as a [`PdfLayout`] of positioned
//! lines, then serialized with lopdf ([`write_pdf`]). No external flow
//! engine is involved: line breaking and page breaking happen here, measured
//! with the same TrueType faces that get embedded.

mod layout;
mod metrics;
mod writer;

use std::io::{Seek, Write};
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::config::Labels;
use crate::error::RenderResult;
use crate::model::Book;

use super::{Exporter, RenderContext};

pub use layout::{
    Color, LineKind, Page, PageGeometry, PdfLayout, Pen, TextLine, TocEntry, paginate,
};
pub use metrics::{ASCENT, FontFace, FontSet, FontStyle, TextMeasure};
pub use writer::write_pdf;

/// How contents entries get their page numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TocNumbering {
    /// The page each chapter really starts on.
    #[default]
    Physical,
    /// First chapter on page 3, then one page per chapter, regardless of
    /// contents length or chapter length.
    Sequential,
}

/// Configuration for PDF export.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    pub geometry: PageGeometry,
    pub toc_numbering: TocNumbering,
}

/// PDF format exporter. Text is set in the bundled DejaVu Sans faces unless
/// another [`FontSet`] is supplied.
#[derive(Debug, Clone, Default)]
pub struct PdfExporter {
    config: PdfConfig,
    labels: Labels,
    fonts: Option<Arc<FontSet>>,
}

impl PdfExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the exporter with custom settings.
    pub fn with_config(mut self, config: PdfConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_fonts(mut self, fonts: Arc<FontSet>) -> Self {
        self.fonts = Some(fonts);
        self
    }

    fn fonts(&self) -> RenderResult<Arc<FontSet>> {
        match &self.fonts {
            Some(fonts) => Ok(Arc::clone(fonts)),
            None => FontSet::bundled(),
        }
    }

    /// Lay the book out without writing it.
    pub fn layout(&self, book: &Book, ctx: &RenderContext) -> RenderResult<PdfLayout> {
        paginate(book, ctx, &self.config, &self.labels, &*self.fonts()?)
    }
}

impl Exporter for PdfExporter {
    fn export<W: Write + Seek>(
        &self,
        book: &Book,
        ctx: &RenderContext,
        writer: &mut W,
    ) -> RenderResult<()> {
        let fonts = self.fonts()?;
        let layout = paginate(book, ctx, &self.config, &self.labels, &*fonts)?;
        debug!(
            pages = layout.page_count(),
            chapters = layout.toc.len(),
            "pdf layout complete"
        );
        write_pdf(&layout, &fonts, &book.info().title, writer)
    }
}
