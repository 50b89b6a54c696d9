//! Benchmarks for the export pipeline.
//!
//! Run with: cargo bench

use std::io::Cursor;

use criterion::{Criterion, criterion_group, criterion_main};

use bookpress::content::normalize_book;
use bookpress::export::{DocxExporter, HtmlExporter, PdfExporter, TextExporter};
use bookpress::{Book, Exporter, RenderContext};

const BOOK_JSON: &str = include_str!("../tests/fixtures/book.json");

/// The fixture with its chapters repeated until the book is long enough to
/// span many pages.
fn large_book() -> Book {
    let base = Book::from_json(BOOK_JSON).unwrap();
    let mut chapters = Vec::new();
    for round in 0..20 {
        for chapter in base.chapters() {
            let mut copy = chapter.clone();
            copy.id = format!("{}-{round}", chapter.id);
            chapters.push(copy);
        }
    }
    Book::new(base.info().clone(), chapters).unwrap()
}

fn run<E: Exporter>(exporter: &E, book: &Book) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    exporter
        .export(book, &RenderContext::new(2025), &mut out)
        .unwrap();
    out.into_inner()
}

// ============================================================================
// Normalization
// ============================================================================

fn bench_normalize(c: &mut Criterion) {
    let book = large_book();
    c.bench_function("normalize_book", |b| {
        b.iter(|| normalize_book(&book));
    });
}

// ============================================================================
// Exporters
// ============================================================================

fn bench_export_text(c: &mut Criterion) {
    let book = large_book();
    c.bench_function("export_text", |b| {
        b.iter(|| run(&TextExporter::new(), &book));
    });
}

fn bench_export_html(c: &mut Criterion) {
    let book = large_book();
    c.bench_function("export_html", |b| {
        b.iter(|| run(&HtmlExporter::new(), &book));
    });
}

fn bench_export_docx(c: &mut Criterion) {
    let book = large_book();
    c.bench_function("export_docx", |b| {
        b.iter(|| run(&DocxExporter::new(), &book));
    });
}

fn bench_paginate(c: &mut Criterion) {
    let book = large_book();
    let exporter = PdfExporter::new();
    c.bench_function("paginate", |b| {
        b.iter(|| exporter.layout(&book, &RenderContext::new(2025)).unwrap());
    });
}

fn bench_export_pdf(c: &mut Criterion) {
    let book = large_book();
    c.bench_function("export_pdf", |b| {
        b.iter(|| run(&PdfExporter::new(), &book));
    });
}

criterion_group!(
    benches,
    bench_normalize,
    bench_export_text,
    bench_export_html,
    bench_export_docx,
    bench_paginate,
    bench_export_pdf,
);
criterion_main!(benches);
