//! # bookpress
//!
//! A multi-format book export engine. One immutable [`Book`] (ordered
//! chapters of rich markup, grouped into parts) renders to four standalone
//! artifacts:
//!
//! - plain text, hard-wrapped at a fixed column
//! - a printable, self-contained HTML document
//! - a word-processor document (`.docx`)
//! - a paginated PDF laid out without any external flow engine
//!
//! ## Quick Start
//!
//! ```
//! use bookpress::{Book, BookInfo, Chapter, ExportConfig, ExportContext, ExportService, Identity};
//! use bookpress::export::Format;
//!
//! let book = Book::new(
//!     BookInfo::new("Field Notes").with_copyright("The Authors"),
//!     vec![
//!         Chapter::new("one", "Arrival", "<p>It began <em>quietly</em>.</p>").with_part("Part One"),
//!         Chapter::new("two", "Departure", "<ul><li>pack</li><li>leave</li></ul>").with_part("Part One"),
//!     ],
//! ).unwrap();
//!
//! let service = ExportService::new(ExportConfig::default());
//! let ctx = ExportContext::authenticated(Identity::new("reader"), 2025);
//!
//! let pdf = service.export(&book, Format::Pdf, &ctx).unwrap();
//! assert_eq!(pdf.filename, "book.pdf");
//! assert!(pdf.bytes.starts_with(b"%PDF"));
//! ```
//!
//! ## Layers
//!
//! - [`model`]: the book, its chapters and contiguous part groups
//! - [`content`]: chapter markup normalized into canonical nodes
//! - [`export`]: one exporter per format, all reading canonical nodes
//! - [`service`]: the export boundary with its authorization gate

pub mod config;
pub mod content;
pub mod error;
pub mod export;
pub mod markup;
pub mod model;
pub mod service;

pub use config::{ExportConfig, Labels};
pub use error::{BookError, ConfigError, ExportError, RenderError};
pub use export::{Exporter, Format, RenderContext};
pub use model::{Book, BookInfo, Chapter};
pub use service::{Artifact, ExportContext, ExportService, Identity, Notification};
