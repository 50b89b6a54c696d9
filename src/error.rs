//! Error types for bookpress operations.

use thiserror::Error;

/// Errors raised while loading or validating a book.
#[derive(Error, Debug)]
pub enum BookError {
    #[error("JSON decoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Duplicate chapter id: {0}")]
    DuplicateChapterId(String),

    #[error("Chapter at position {0} has an empty id")]
    EmptyChapterId(usize),
}

/// Faults raised inside a renderer.
///
/// These carry implementation detail for logging. They never cross the
/// export boundary; [`crate::service::ExportService`] converts them into
/// [`ExportError::RenderFailure`].
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML writing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Invalid page geometry: {0}")]
    Geometry(String),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Text measurement failed: {0}")]
    Measure(String),

    #[error("Malformed content: {0}")]
    Content(String),
}

/// Errors reported at the export boundary.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Authorization required: sign in to export the book")]
    AuthorizationRequired,

    #[error("The book could not be exported")]
    RenderFailure,

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("The exported file could not be saved")]
    SaveFailed,
}

/// Errors raised while loading an export configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;
pub type RenderResult<T> = std::result::Result<T, RenderError>;
