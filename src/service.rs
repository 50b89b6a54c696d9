//! Export orchestration.
//!
//! [`ExportService`] is the only boundary callers talk to. It checks that an
//! identity is present, renders the requested format fully in memory, and
//! turns every renderer fault into [`ExportError::RenderFailure`]. Saving
//! and notifying go through the [`ArtifactSink`] and [`Notifier`]
//! collaborators.

use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::config::ExportConfig;
use crate::error::{ExportError, RenderResult, Result};
use crate::export::{
    DocxExporter, Exporter, Format, HtmlExporter, PdfExporter, RenderContext, TextExporter,
};
use crate::model::Book;

/// An authenticated user. Only its presence matters to the exporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
}

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Caller-supplied parameters for one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportContext {
    pub identity: Option<Identity>,
    /// Year printed in the colophon.
    pub year: i32,
}

impl ExportContext {
    /// An anonymous context. Exports with it are rejected.
    pub fn anonymous(year: i32) -> Self {
        Self {
            identity: None,
            year,
        }
    }

    pub fn authenticated(identity: Identity, year: i32) -> Self {
        Self {
            identity: Some(identity),
            year,
        }
    }

    fn render_context(&self) -> RenderContext {
        RenderContext::new(self.year)
    }
}

/// A complete export result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub format: Format,
    /// Suggested file name: base name plus format extension.
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn media_type(&self) -> &'static str {
        self.format.media_type()
    }
}

/// Outcome reported to the user after an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(Format),
    Failure(String),
    AuthorizationRequired,
}

/// Where finished artifacts go.
pub trait ArtifactSink {
    fn save(&self, artifact: &Artifact) -> io::Result<()>;
}

/// Writes artifacts into a directory under their suggested file names.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactSink for DirectorySink {
    fn save(&self, artifact: &Artifact) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(&artifact.filename);
        fs::write(&path, &artifact.bytes)?;
        debug!(path = %path.display(), bytes = artifact.bytes.len(), "artifact saved");
        Ok(())
    }
}

/// Keeps artifacts in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    artifacts: Mutex<Vec<Artifact>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifacts(&self) -> Vec<Artifact> {
        self.artifacts
            .lock()
            .map(|artifacts| artifacts.clone())
            .unwrap_or_default()
    }
}

impl ArtifactSink for MemorySink {
    fn save(&self, artifact: &Artifact) -> io::Result<()> {
        self.artifacts
            .lock()
            .map_err(|_| io::Error::other("memory sink poisoned"))?
            .push(artifact.clone());
        Ok(())
    }
}

/// Receives export outcomes.
pub trait Notifier {
    fn notify(&self, notification: &Notification);
}

/// Reports outcomes through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: &Notification) {
        match notification {
            Notification::Success(format) => info!(%format, "export finished"),
            Notification::Failure(reason) => warn!(%reason, "export failed"),
            Notification::AuthorizationRequired => {
                warn!("export rejected: authorization required")
            }
        }
    }
}

/// Renders one format of a book into bytes.
pub trait Renderers {
    fn render(&self, book: &Book, format: Format, ctx: &RenderContext) -> RenderResult<Vec<u8>>;
}

/// The four built-in exporters, configured from an [`ExportConfig`].
#[derive(Debug, Clone, Default)]
pub struct StandardRenderers {
    config: ExportConfig,
}

impl StandardRenderers {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }
}

impl Renderers for StandardRenderers {
    fn render(&self, book: &Book, format: Format, ctx: &RenderContext) -> RenderResult<Vec<u8>> {
        let config = &self.config;
        let labels = config.labels.clone();
        let mut out = Cursor::new(Vec::new());
        match format {
            Format::Text => TextExporter::new()
                .with_config(config.text.clone())
                .with_labels(labels)
                .export(book, ctx, &mut out)?,
            Format::Html => HtmlExporter::new()
                .with_config(config.html.clone())
                .with_labels(labels)
                .export(book, ctx, &mut out)?,
            Format::Docx => DocxExporter::new()
                .with_config(config.docx.clone())
                .with_labels(labels)
                .export(book, ctx, &mut out)?,
            Format::Pdf => PdfExporter::new()
                .with_config(config.pdf.clone())
                .with_labels(labels)
                .export(book, ctx, &mut out)?,
        }
        Ok(out.into_inner())
    }
}

/// Clears the in-progress flag when dropped.
struct InProgress<'a>(&'a AtomicBool);

impl<'a> InProgress<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The export boundary.
///
/// ```
/// use bookpress::{Book, BookInfo, Chapter, ExportConfig, ExportError};
/// use bookpress::export::Format;
/// use bookpress::service::{ExportContext, ExportService, Identity};
///
/// let book = Book::new(
///     BookInfo::new("Field Notes"),
///     vec![Chapter::new("one", "One", "<p>Hello</p>")],
/// ).unwrap();
/// let service = ExportService::new(ExportConfig::default());
///
/// let anonymous = ExportContext::anonymous(2025);
/// assert!(matches!(
///     service.export(&book, Format::Text, &anonymous),
///     Err(ExportError::AuthorizationRequired)
/// ));
///
/// let signed_in = ExportContext::authenticated(Identity::new("reader"), 2025);
/// let artifact = service.export(&book, Format::Text, &signed_in).unwrap();
/// assert_eq!(artifact.filename, "book.txt");
/// ```
#[derive(Debug)]
pub struct ExportService<R: Renderers = StandardRenderers> {
    renderers: R,
    base_filename: String,
    in_progress: Arc<AtomicBool>,
}

impl ExportService<StandardRenderers> {
    pub fn new(config: ExportConfig) -> Self {
        let base_filename = config.base_filename.clone();
        Self::with_renderers(StandardRenderers::new(config), base_filename)
    }
}

impl<R: Renderers> ExportService<R> {
    pub fn with_renderers(renderers: R, base_filename: impl Into<String>) -> Self {
        Self {
            renderers,
            base_filename: base_filename.into(),
            in_progress: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared handle to the in-progress flag, e.g. for a UI spinner.
    pub fn in_progress_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.in_progress)
    }

    pub fn is_exporting(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    pub fn renderers(&self) -> &R {
        &self.renderers
    }

    /// Export one format.
    ///
    /// Without an identity this returns
    /// [`ExportError::AuthorizationRequired`] and renders nothing. Renderer
    /// faults are logged and reported as [`ExportError::RenderFailure`].
    /// The in-progress flag is raised for the duration of the call.
    pub fn export(&self, book: &Book, format: Format, ctx: &ExportContext) -> Result<Artifact> {
        let _guard = InProgress::raise(&self.in_progress);

        let Some(identity) = &ctx.identity else {
            debug!(%format, "export without identity");
            return Err(ExportError::AuthorizationRequired);
        };
        info!(%format, user = %identity.name, "export started");

        let bytes = self
            .renderers
            .render(book, format, &ctx.render_context())
            .map_err(|e| {
                warn!(%format, error = %e, "renderer failed");
                ExportError::RenderFailure
            })?;

        debug!(%format, bytes = bytes.len(), "export rendered");
        Ok(Artifact {
            format,
            filename: format.filename(&self.base_filename),
            bytes,
        })
    }

    /// Export one format, save the artifact, and report the outcome.
    pub fn export_to(
        &self,
        book: &Book,
        format: Format,
        ctx: &ExportContext,
        sink: &dyn ArtifactSink,
        notifier: &dyn Notifier,
    ) -> Result<Artifact> {
        let result = self.export(book, format, ctx).and_then(|artifact| {
            sink.save(&artifact).map_err(|e| {
                warn!(filename = %artifact.filename, error = %e, "saving artifact failed");
                ExportError::SaveFailed
            })?;
            Ok(artifact)
        });

        let notification = match &result {
            Ok(artifact) => Notification::Success(artifact.format),
            Err(ExportError::AuthorizationRequired) => Notification::AuthorizationRequired,
            Err(e) => Notification::Failure(e.to_string()),
        };
        notifier.notify(&notification);
        result
    }
}
