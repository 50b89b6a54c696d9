//! bookpress - export a book to text, HTML, DOCX and PDF

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use chrono::{Datelike, Utc};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bookpress::export::Format;
use bookpress::service::{DirectorySink, TracingNotifier};
use bookpress::{Book, ExportConfig, ExportContext, ExportError, ExportService, Identity};

#[derive(Parser)]
#[command(name = "bookpress")]
#[command(version, about = "Export a book to text, HTML, DOCX and PDF", long_about = None)]
#[command(after_help = "EXAMPLES:
    bookpress book.json -u me               Export all four formats here
    bookpress book.json -u me -f pdf -o out Export only the PDF into out/
    bookpress -i book.json                  Show book summary")]
struct Cli {
    /// Book file (JSON)
    #[arg(value_name = "BOOK")]
    book: PathBuf,

    /// Format to export: txt, html, docx or pdf (repeatable; all when omitted)
    #[arg(short, long = "format", value_name = "FORMAT")]
    formats: Vec<Format>,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output: PathBuf,

    /// Export configuration (JSON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Year printed in the colophon (defaults to the current year)
    #[arg(long)]
    year: Option<i32>,

    /// Signed-in user; exports are refused without one
    #[arg(short, long, value_name = "NAME")]
    user: Option<String>,

    /// Show a book summary without exporting
    #[arg(short, long)]
    info: bool,

    /// Suppress output messages
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    let result = if cli.info {
        show_info(&cli.book)
    } else {
        export(&cli)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn open_book(path: &Path) -> Result<Book> {
    Book::open(path).with_context(|| format!("failed to load {}", path.display()))
}

fn show_info(path: &Path) -> Result<()> {
    let book = open_book(path)?;
    let info = book.info();

    println!("File: {}", path.display());
    println!("Title: {}", info.title);
    if !info.subtitle.is_empty() {
        println!("Subtitle: {}", info.subtitle);
    }
    if !info.language.is_empty() {
        println!("Language: {}", info.language);
    }
    println!("Chapters: {}", book.chapters().len());

    let groups = book.part_groups();
    println!("Part groups: {}", groups.len());
    for group in &groups {
        println!(
            "  {} ({} chapters)",
            group.label.unwrap_or("(no part)"),
            group.chapters.len()
        );
    }

    Ok(())
}

fn export(cli: &Cli) -> Result<()> {
    let book = open_book(&cli.book)?;
    let config = match &cli.config {
        Some(path) => ExportConfig::from_path(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => ExportConfig::default(),
    };

    let year = colophon_year(cli);
    let ctx = match &cli.user {
        Some(name) => ExportContext::authenticated(Identity::new(name), year),
        None => ExportContext::anonymous(year),
    };

    let formats = if cli.formats.is_empty() {
        Format::ALL.to_vec()
    } else {
        cli.formats.clone()
    };

    let service = ExportService::new(config);
    let sink = DirectorySink::new(&cli.output);
    let mut failed = Vec::new();

    for format in formats {
        match service.export_to(&book, format, &ctx, &sink, &TracingNotifier) {
            Ok(artifact) => {
                if !cli.quiet {
                    println!("{}", cli.output.join(&artifact.filename).display());
                }
            }
            Err(ExportError::AuthorizationRequired) => {
                bail!(ExportError::AuthorizationRequired);
            }
            Err(_) => failed.push(format.to_string()),
        }
    }

    if !failed.is_empty() {
        bail!("export failed for {}", failed.join(", "));
    }
    Ok(())
}

/// Year printed in the colophon: `--year`, else the current UTC year.
fn colophon_year(cli: &Cli) -> i32 {
    cli.year.unwrap_or_else(|| Utc::now().year())
}
