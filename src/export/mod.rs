//! Export module for writing books to various formats.
//!
//! Provides the `Exporter` trait and format-specific implementations.
//!
//! # Architecture
//!
//! The `Exporter` trait uses a builder pattern:
//! - `new()` creates an exporter with default configuration
//! - `with_config()` allows customization
//! - `export()` writes to any `Write + Seek` destination
//!
//! All exporters read chapter content through [`crate::content`], so they
//! agree on stripping, list prefixes and part grouping. Exporters never read
//! the clock: the colophon year comes in through [`RenderContext`].
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use bookpress::{Book, BookInfo, Chapter};
//! use bookpress::export::{Exporter, RenderContext, TextExporter};
//!
//! let book = Book::new(
//!     BookInfo::new("Field Notes"),
//!     vec![Chapter::new("one", "One", "<p>Hello</p>")],
//! ).unwrap();
//!
//! let mut out = Cursor::new(Vec::new());
//! TextExporter::new().export(&book, &RenderContext::new(2025), &mut out).unwrap();
//! assert!(String::from_utf8(out.into_inner()).unwrap().contains("Hello"));
//! ```

use std::fmt;
use std::io::{Seek, Write};
use std::str::FromStr;

use crate::error::{ExportError, RenderResult};
use crate::model::{Book, BookInfo};

pub mod docx;
mod html;
pub mod pdf;
mod text;

pub use docx::{DocxConfig, DocxExporter};
pub use html::{HtmlConfig, HtmlExporter, chapter_anchor, chapter_href, escape_html};
pub use pdf::{PageGeometry, PdfConfig, PdfExporter, TocNumbering};
pub use text::{TextConfig, TextExporter, wrap_text};

/// The closed set of export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Text,
    Html,
    Docx,
    Pdf,
}

impl Format {
    pub const ALL: [Format; 4] = [Format::Text, Format::Html, Format::Docx, Format::Pdf];

    pub fn extension(&self) -> &'static str {
        match self {
            Format::Text => "txt",
            Format::Html => "html",
            Format::Docx => "docx",
            Format::Pdf => "pdf",
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            Format::Text => "text/plain; charset=utf-8",
            Format::Html => "text/html; charset=utf-8",
            Format::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Format::Pdf => "application/pdf",
        }
    }

    /// Suggested file name: the base name plus this format's extension.
    pub fn filename(&self, base: &str) -> String {
        format!("{base}.{}", self.extension())
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_ascii_uppercase())
    }
}

impl FromStr for Format {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(Format::Text),
            "html" | "htm" => Ok(Format::Html),
            "docx" | "doc" => Ok(Format::Docx),
            "pdf" => Ok(Format::Pdf),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Parameters injected by the caller for one export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderContext {
    /// Year printed in the colophon.
    pub year: i32,
}

impl RenderContext {
    pub fn new(year: i32) -> Self {
        Self { year }
    }
}

/// Trait for exporting books to specific formats.
///
/// Exporters use a builder pattern where configuration is held in the struct,
/// and the `export` method writes to any `Write + Seek` destination.
pub trait Exporter {
    /// Export the book to the provided writer.
    ///
    /// The writer can be:
    /// - `std::fs::File` for disk output
    /// - `std::io::Cursor<Vec<u8>>` for in-memory output
    /// - Any other type implementing `Write + Seek`
    fn export<W: Write + Seek>(
        &self,
        book: &Book,
        ctx: &RenderContext,
        writer: &mut W,
    ) -> RenderResult<()>;
}

/// `© {year} {holder}`, or just `© {year}` without a holder.
pub(crate) fn copyright_line(info: &BookInfo, year: i32) -> String {
    if info.copyright.is_empty() {
        format!("© {year}")
    } else {
        format!("© {year} {}", info.copyright)
    }
}
