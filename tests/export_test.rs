//! End-to-end export tests over a realistic book fixture.
//!
//! The fixture has a prologue and epilogue outside any part, two parts, a
//! chapter in Russian, and chapter markup with nested wrappers, tables, lists
//! and inline emphasis.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use bookpress::config::Labels;
use bookpress::content::strip;
use bookpress::export::pdf::LineKind;
use bookpress::export::{
    DocxExporter, HtmlExporter, PdfConfig, PdfExporter, TextConfig, TextExporter, TocNumbering,
    chapter_anchor,
};
use bookpress::{Book, Exporter, RenderContext};
use lopdf::{Document, Object};
use zip::ZipArchive;

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn fixture_book() -> Book {
    Book::open(format!("{}/book.json", FIXTURES_DIR)).expect("Failed to load fixture book")
}

fn ctx() -> RenderContext {
    RenderContext::new(2025)
}

fn export_bytes<E: Exporter>(exporter: &E, book: &Book) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    exporter.export(book, &ctx(), &mut out).expect("export failed");
    out.into_inner()
}

// ============================================================================
// Fixture sanity
// ============================================================================

#[test]
fn test_fixture_groups() {
    let book = fixture_book();
    assert_eq!(book.chapters().len(), 6);

    let labels: Vec<Option<&str>> = book.part_groups().iter().map(|g| g.label).collect();
    assert_eq!(
        labels,
        vec![
            None,
            Some("Part I: The Architecture of the Trial"),
            Some("Part II: The Players and the Rules"),
            None,
        ]
    );
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_every_format_is_deterministic() {
    let book = fixture_book();

    assert_eq!(
        export_bytes(&TextExporter::new(), &book),
        export_bytes(&TextExporter::new(), &book)
    );
    assert_eq!(
        export_bytes(&HtmlExporter::new(), &book),
        export_bytes(&HtmlExporter::new(), &book)
    );
    assert_eq!(
        export_bytes(&DocxExporter::new(), &book),
        export_bytes(&DocxExporter::new(), &book)
    );
    assert_eq!(
        export_bytes(&PdfExporter::new(), &book),
        export_bytes(&PdfExporter::new(), &book)
    );
}

// ============================================================================
// Plain text
// ============================================================================

#[test]
fn test_text_export() {
    let book = fixture_book();
    let text = String::from_utf8(export_bytes(&TextExporter::new(), &book)).unwrap();

    assert!(text.starts_with("The Trial Code"));
    for n in 1..=6 {
        assert_eq!(
            text.matches(&format!("[CHAPTER {n}]")).count(),
            1,
            "chapter {n} header"
        );
    }
    assert!(text.contains("1. The world is rendered on demand."));
    assert!(text.contains("• Ground floor: survival"));
    assert!(text.contains("Это началось не с озарения."));
    assert!(text.contains("• Два языка — науки и веры."));
    assert!(text.contains("© 2025 Unified Theory of the Multidimensional Spiritual Trial"));

    // No markup survives.
    assert!(!text.contains('<'));
    assert!(!text.contains("class="));

    for line in text.lines() {
        assert!(line.chars().count() <= 75, "line too long: {line:?}");
    }
}

#[test]
fn test_text_export_unwrapped() {
    let book = fixture_book();
    let exporter = TextExporter::new().with_config(TextConfig {
        line_width: 0,
        ..TextConfig::default()
    });
    let text = String::from_utf8(export_bytes(&exporter, &book)).unwrap();

    assert!(text.lines().any(|line| line.chars().count() > 75));
}

// ============================================================================
// HTML
// ============================================================================

/// Values of every `attr="..."` occurrence in order.
fn attr_values<'a>(html: &'a str, attr: &str) -> Vec<&'a str> {
    let needle = format!("{attr}=\"");
    html.match_indices(&needle)
        .filter_map(|(i, _)| {
            let rest = &html[i + needle.len()..];
            rest.find('"').map(|end| &rest[..end])
        })
        .collect()
}

#[test]
fn test_html_links_resolve() {
    let book = fixture_book();
    let html = String::from_utf8(export_bytes(&HtmlExporter::new(), &book)).unwrap();

    let ids = attr_values(&html, "id");
    let hrefs: Vec<&str> = attr_values(&html, "href")
        .into_iter()
        .filter(|href| href.starts_with('#'))
        .collect();

    assert_eq!(hrefs.len(), book.chapters().len());
    for href in hrefs {
        assert!(ids.contains(&&href[1..]), "dangling link {href}");
    }
    for chapter in book.chapters() {
        let anchor = chapter_anchor(&chapter.id);
        assert_eq!(ids.iter().filter(|id| **id == anchor).count(), 1);
    }
}

#[test]
fn test_html_structure() {
    let book = fixture_book();
    let html = String::from_utf8(export_bytes(&HtmlExporter::new(), &book)).unwrap();

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<html lang=\"en\">"));
    assert_eq!(html.matches("<article class=\"chapter\"").count(), 6);
    assert_eq!(html.matches("<section class=\"part\">").count(), 2);
    assert!(html.contains("<h3>The First Principle</h3>"));
    assert!(html.contains("<h4>Corollaries</h4>"));
    assert!(html.contains("<strong>A bug in the Matrix.</strong>"));
    assert!(html.contains("<strong>Постоянная тонкой структуры.</strong>"));
    assert!(!html.contains("bg-gradient-to-r"));
}

// ============================================================================
// DOCX
// ============================================================================

fn read_part(bytes: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("not a zip");
    let mut file = archive.by_name(name).expect("missing part");
    let mut xml = String::new();
    file.read_to_string(&mut xml).unwrap();
    xml
}

#[test]
fn test_docx_package() {
    let book = fixture_book();
    let bytes = export_bytes(&DocxExporter::new(), &book);

    let document = read_part(&bytes, "word/document.xml");
    assert!(document.contains("Prologue: Hacking Reality"));
    assert!(document.contains("Exit Code Zero"));
    assert!(document.contains("Part II: The Players and the Rules"));
    assert!(document.contains("1. The world is rendered on demand."));
    // Title page break plus one between each pair of chapters.
    assert!(document.contains("Пролог: Взлом реальности"));
    assert_eq!(document.matches("<w:br w:type=\"page\"/>").count(), 1 + 5);

    let core = read_part(&bytes, "docProps/core.xml");
    assert!(core.contains("<dc:title>The Trial Code</dc:title>"));
    assert!(core.contains("<dc:language>en</dc:language>"));
}

// ============================================================================
// PDF
// ============================================================================

#[test]
fn test_pdf_layout_properties() {
    let book = fixture_book();
    let exporter = PdfExporter::new();
    let layout = exporter.layout(&book, &ctx()).unwrap();
    let geometry = layout.geometry;
    let labels = Labels::default();

    // Pages are numbered 1..=n and every page but the title page has a folio.
    for (i, page) in layout.pages.iter().enumerate() {
        assert_eq!(page.number, i + 1);
        match &page.folio {
            Some(folio) => assert_eq!(folio.text, page.number.to_string()),
            None => assert_eq!(page.number, 1),
        }
        for line in &page.lines {
            assert!(line.bottom() <= geometry.bottom_limit() + 0.01);
            assert!(line.x >= geometry.margin - 0.01);
        }
    }

    // Contents entries point at the page each chapter starts on.
    for (i, chapter) in book.chapters().iter().enumerate() {
        let printed = layout.toc_page(&chapter.id).unwrap();
        assert_eq!(Some(printed), layout.chapter_start(i + 1, &labels));
    }

    // Chapter starts never go backwards.
    let starts: Vec<usize> = (1..=6)
        .filter_map(|n| layout.chapter_start(n, &labels))
        .collect();
    assert!(starts.windows(2).all(|w| w[0] <= w[1]));

    assert_eq!(layout.lines(LineKind::PartTitle).count(), 2);
    assert!(layout.lines(LineKind::Colophon).count() >= 3);
}

#[test]
fn test_pdf_sequential_numbering() {
    let book = fixture_book();
    let exporter = PdfExporter::new().with_config(PdfConfig {
        toc_numbering: TocNumbering::Sequential,
        ..PdfConfig::default()
    });
    let layout = exporter.layout(&book, &ctx()).unwrap();

    let pages: Vec<usize> = layout.toc.iter().map(|entry| entry.page).collect();
    assert_eq!(pages, vec![3, 4, 5, 6, 7, 8]);
}

#[test]
fn test_pdf_two_chapter_scenario() {
    let book = Book::from_json(
        r#"{
            "info": { "title": "Test Code", "copyright": "Holder" },
            "chapters": [
                { "id": "one", "title": "First", "content": "<p>Alpha</p>", "part": "Part One" },
                { "id": "two", "title": "Second", "content": "<p>Beta</p>", "part": "Part One" }
            ]
        }"#,
    )
    .unwrap();

    for numbering in [TocNumbering::Physical, TocNumbering::Sequential] {
        let exporter = PdfExporter::new().with_config(PdfConfig {
            toc_numbering: numbering,
            ..PdfConfig::default()
        });
        let layout = exporter.layout(&book, &ctx()).unwrap();
        assert_eq!(layout.toc_page("one"), Some(3), "{numbering:?}");
        assert_eq!(layout.toc_page("two"), Some(4), "{numbering:?}");
    }
}

#[test]
fn test_pdf_bytes_load() {
    let book = fixture_book();
    let exporter = PdfExporter::new();
    let layout = exporter.layout(&book, &ctx()).unwrap();
    let bytes = export_bytes(&exporter, &book);

    assert!(bytes.starts_with(b"%PDF"));
    let doc = Document::load_mem(&bytes).expect("unreadable PDF");
    assert_eq!(doc.get_pages().len(), layout.page_count());
}

/// Decoded bytes of a stream, whether or not it was compressed.
fn stream_bytes(object: &Object) -> Vec<u8> {
    let stream = object.as_stream().expect("not a stream");
    if stream.dict.get(b"Filter").is_ok() {
        stream.decompressed_content().expect("undecodable stream")
    } else {
        stream.content.clone()
    }
}

/// Glyph code to text, from the `bfchar` blocks of a `ToUnicode` CMap.
fn parse_to_unicode(cmap: &str) -> HashMap<u16, String> {
    let mut map = HashMap::new();
    let mut inside = false;
    for line in cmap.lines() {
        if line.ends_with("beginbfchar") {
            inside = true;
        } else if line == "endbfchar" {
            inside = false;
        } else if inside {
            let hex: Vec<&str> = line
                .split(['<', '>', ' '])
                .filter(|part| !part.is_empty())
                .collect();
            let glyph = u16::from_str_radix(hex[0], 16).unwrap();
            let units: Vec<u16> = hex[1]
                .as_bytes()
                .chunks(4)
                .map(|unit| u16::from_str_radix(std::str::from_utf8(unit).unwrap(), 16).unwrap())
                .collect();
            map.insert(glyph, String::from_utf16(&units).unwrap());
        }
    }
    map
}

/// Text shown on each page, one string per `Tj`, decoded the way a PDF
/// reader extracts it: through each font's `ToUnicode` map.
fn shown_text(bytes: &[u8]) -> Vec<Vec<String>> {
    let doc = Document::load_mem(bytes).expect("unreadable PDF");
    let pages = doc.get_pages();

    let first = doc.get_dictionary(pages[&1]).unwrap();
    let parent = doc
        .get_dictionary(first.get(b"Parent").unwrap().as_reference().unwrap())
        .unwrap();
    let resources = doc
        .get_dictionary(parent.get(b"Resources").unwrap().as_reference().unwrap())
        .unwrap();
    let mut fonts = HashMap::new();
    for (name, font) in resources.get(b"Font").unwrap().as_dict().unwrap().iter() {
        let font = doc.get_dictionary(font.as_reference().unwrap()).unwrap();
        let cmap = doc
            .get_object(font.get(b"ToUnicode").unwrap().as_reference().unwrap())
            .unwrap();
        let cmap = String::from_utf8(stream_bytes(cmap)).unwrap();
        fonts.insert(name.clone(), parse_to_unicode(&cmap));
    }

    pages
        .values()
        .map(|&page_id| {
            let content = doc.get_and_decode_page_content(page_id).unwrap();
            let mut font = None;
            let mut shown = Vec::new();
            for op in &content.operations {
                match (op.operator.as_str(), op.operands.first()) {
                    ("Tf", Some(Object::Name(name))) => font = fonts.get(name),
                    ("Tj", Some(Object::String(codes, _))) => {
                        let map = font.expect("text shown before a font was set");
                        let text: String = codes
                            .chunks(2)
                            .map(|code| {
                                let glyph = u16::from_be_bytes([code[0], code[1]]);
                                map.get(&glyph).map_or("\u{FFFD}", String::as_str)
                            })
                            .collect();
                        shown.push(text);
                    }
                    _ => {}
                }
            }
            shown
        })
        .collect()
}

fn without_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

#[test]
fn test_pdf_text_extracts_as_written() {
    let book = fixture_book();
    let pages = shown_text(&export_bytes(&PdfExporter::new(), &book));

    // Every page after the title page ends with its folio.
    let mut body = String::new();
    for (i, page) in pages.iter().enumerate() {
        let mut strings = page.as_slice();
        if i > 0 {
            let (folio, rest) = strings.split_last().unwrap();
            assert_eq!(*folio, (i + 1).to_string());
            strings = rest;
        }
        for text in strings {
            body.push_str(text);
            body.push('\n');
        }
    }

    assert!(!body.contains('\u{FFFD}'), "glyph without a text mapping");
    assert!(body.contains("Пролог: Взлом реальности"));
    assert!(body.contains("Это началось не с озарения. Это началось с бага."));
    assert!(body.contains("Постоянная тонкой структуры."));

    let drawn = without_whitespace(&body);
    for chapter in book.chapters() {
        assert!(
            drawn.contains(&without_whitespace(&strip(&chapter.content))),
            "chapter {} is not drawn in full",
            chapter.id
        );
        assert!(drawn.contains(&without_whitespace(&chapter.title)));
    }
}
