//! Word-processor (`.docx`) exporter.
//!
//! Export happens in two steps: [`build_document`] turns the book into an
//! in-memory [`Document`] of paragraphs and runs, then [`write_package`]
//! serializes that tree into an Office Open XML zip package.

mod build;
mod model;
mod package;

use std::io::{Seek, Write};

use serde::Deserialize;
use tracing::debug;

use crate::config::Labels;
use crate::error::RenderResult;
use crate::model::Book;

use super::{Exporter, RenderContext};

pub use build::build_document;
pub use model::{Alignment, Block, Document, Paragraph, Run};
pub use package::write_package;

/// Configuration for DOCX export.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DocxConfig {
    /// Compression level for deflate (0-9, default 6).
    pub compression_level: Option<u32>,
}

/// DOCX format exporter.
#[derive(Debug, Clone, Default)]
pub struct DocxExporter {
    config: DocxConfig,
    labels: Labels,
}

impl DocxExporter {
    /// Create a new exporter with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the exporter with custom settings.
    pub fn with_config(mut self, config: DocxConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }
}

impl Exporter for DocxExporter {
    fn export<W: Write + Seek>(
        &self,
        book: &Book,
        ctx: &RenderContext,
        writer: &mut W,
    ) -> RenderResult<()> {
        let document = build_document(book, ctx, &self.labels);
        debug!(blocks = document.blocks.len(), "docx tree built");
        write_package(&document, self.config.compression_level, writer)
    }
}
