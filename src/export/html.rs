//! Printable HTML exporter.
//!
//! Produces one self-contained document: inline stylesheet, a table of
//! contents grouped by part, every chapter in an `<article>` whose id is the
//! target of its contents link, and a footer.

use std::io::{Seek, Write};

use percent_encoding::{AsciiSet, CONTROLS, percent_encode_byte, utf8_percent_encode};
use serde::Deserialize;
use tracing::debug;

use crate::config::Labels;
use crate::content::{NormalizedChapter, Node, TextRun, normalize_book};
use crate::error::RenderResult;
use crate::model::Book;

use super::{Exporter, RenderContext, copyright_line};

/// Characters escaped in `#fragment` hrefs.
const FRAGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'`');

const STYLESHEET: &str = r#"
    body {
      font-family: Georgia, serif;
      max-width: 800px;
      margin: 0 auto;
      padding: 40px 20px;
      line-height: 1.8;
      color: #333;
      background: #fafafa;
    }
    h1 {
      text-align: center;
      color: #d946ef;
      font-size: 2.5em;
      margin-bottom: 0.3em;
    }
    .subtitle {
      text-align: center;
      color: #666;
      font-size: 1.2em;
      margin-bottom: 3em;
    }
    nav.toc ol { list-style: none; padding-left: 1.5em; }
    nav.toc .toc-part { font-weight: bold; margin-top: 1em; }
    .part-title {
      color: #8b5cf6;
      font-size: 1.5em;
      font-weight: bold;
      margin-top: 3em;
      margin-bottom: 1em;
      text-align: center;
      border-top: 3px solid #8b5cf6;
      padding-top: 1em;
    }
    h2 {
      color: #d946ef;
      font-size: 1.8em;
      margin-top: 2em;
      margin-bottom: 1em;
    }
    h3, h4 {
      color: #8b5cf6;
      margin-top: 1.5em;
    }
    p { margin-bottom: 1.2em; }
    ul, ol {
      margin-left: 2em;
      margin-bottom: 1.2em;
    }
    li { margin-bottom: 0.5em; }
    .footer {
      margin-top: 4em;
      padding-top: 2em;
      border-top: 2px solid #ddd;
      text-align: center;
      color: #666;
      font-size: 0.9em;
    }
    @media print {
      body { background: #fff; max-width: none; padding: 0; }
      nav.toc { break-after: page; page-break-after: always; }
      .part, .chapter { break-before: page; page-break-before: always; }
      .part-title + .chapter { break-before: avoid; page-break-before: avoid; }
      h2, h3, h4 { break-after: avoid; page-break-after: avoid; }
    }
"#;

/// Configuration for HTML export.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HtmlConfig {
    /// `lang` attribute used when the book declares no language.
    pub lang: String,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            lang: "en".to_string(),
        }
    }
}

/// Exporter for a single printable HTML document.
#[derive(Debug, Clone, Default)]
pub struct HtmlExporter {
    config: HtmlConfig,
    labels: Labels,
}

impl HtmlExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: HtmlConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    /// Render the whole document to a string.
    pub fn render(&self, book: &Book, ctx: &RenderContext) -> String {
        let info = book.info();
        let chapters = normalize_book(book);
        let lang = if info.language.is_empty() {
            &self.config.lang
        } else {
            &info.language
        };

        let mut doc = String::with_capacity(16 * 1024);
        doc.push_str("<!DOCTYPE html>\n");
        doc.push_str(&format!("<html lang=\"{}\">\n<head>\n", escape_html(lang)));
        doc.push_str("  <meta charset=\"UTF-8\">\n");
        doc.push_str(
            "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
        );
        doc.push_str(&format!("  <title>{}</title>\n", escape_html(&info.title)));
        doc.push_str("  <style>");
        doc.push_str(STYLESHEET);
        doc.push_str("  </style>\n</head>\n<body>\n");

        // Title block
        doc.push_str(&format!("  <h1>{}</h1>\n", escape_html(&info.title)));
        let subtitles: Vec<String> = [&info.subtitle, &info.tagline]
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(|s| escape_html(s))
            .collect();
        if !subtitles.is_empty() {
            doc.push_str(&format!(
                "  <p class=\"subtitle\">{}</p>\n",
                subtitles.join("<br/>")
            ));
        }

        self.write_toc(&mut doc, book);
        self.write_chapters(&mut doc, book, &chapters);

        // Footer
        doc.push_str("  <footer class=\"footer\">\n");
        doc.push_str(&format!(
            "    <p><strong>{}</strong></p>\n",
            escape_html(&copyright_line(info, ctx.year))
        ));
        if !info.disclaimer.is_empty() {
            doc.push_str(&format!(
                "    <p><em>{}</em></p>\n",
                escape_html(&info.disclaimer)
            ));
        }
        if !info.site.is_empty() {
            doc.push_str(&format!("    <p>{}</p>\n", escape_html(&info.site)));
        }
        doc.push_str("  </footer>\n</body>\n</html>\n");

        debug!(chapters = chapters.len(), bytes = doc.len(), "html export complete");
        doc
    }

    fn write_toc(&self, doc: &mut String, book: &Book) {
        doc.push_str("  <nav class=\"toc\">\n");
        doc.push_str(&format!(
            "    <h2>{}</h2>\n",
            escape_html(&self.labels.contents)
        ));
        for group in book.part_groups() {
            doc.push_str("    <div class=\"toc-group\">\n");
            if let Some(label) = group.label {
                doc.push_str(&format!(
                    "      <p class=\"toc-part\">{}</p>\n",
                    escape_html(label)
                ));
            }
            doc.push_str("      <ol>\n");
            for entry in &group.chapters {
                doc.push_str(&format!(
                    "        <li><a href=\"{}\">{}. {}</a></li>\n",
                    escape_html(&chapter_href(&entry.chapter.id)),
                    entry.number,
                    escape_html(&entry.chapter.title)
                ));
            }
            doc.push_str("      </ol>\n    </div>\n");
        }
        doc.push_str("  </nav>\n");
    }

    fn write_chapters(&self, doc: &mut String, book: &Book, chapters: &[NormalizedChapter<'_>]) {
        let mut chapters = chapters.iter();
        for group in book.part_groups() {
            doc.push_str("  <section class=\"part\">\n");
            if let Some(label) = group.label {
                doc.push_str(&format!(
                    "    <div class=\"part-title\">{}</div>\n",
                    escape_html(label)
                ));
            }
            for normalized in chapters.by_ref().take(group.chapters.len()) {
                let chapter = normalized.chapter;
                doc.push_str(&format!(
                    "    <article class=\"chapter\" id=\"{}\">\n",
                    escape_html(&chapter_anchor(&chapter.id))
                ));
                doc.push_str(&format!("      <h2>{}</h2>\n", escape_html(&chapter.title)));
                for node in &normalized.nodes {
                    write_node(doc, node, 3);
                }
                doc.push_str("    </article>\n");
            }
            doc.push_str("  </section>\n");
        }
    }
}

impl Exporter for HtmlExporter {
    fn export<W: Write + Seek>(
        &self,
        book: &Book,
        ctx: &RenderContext,
        writer: &mut W,
    ) -> RenderResult<()> {
        writer.write_all(self.render(book, ctx).as_bytes())?;
        Ok(())
    }
}

fn write_node(doc: &mut String, node: &Node, depth: usize) {
    let indent = "  ".repeat(depth);
    match node {
        Node::Paragraph { runs } => {
            doc.push_str(&indent);
            doc.push_str("<p>");
            for run in runs {
                write_run(doc, run);
            }
            doc.push_str("</p>\n");
        }
        Node::Heading { level, text } => {
            doc.push_str(&format!(
                "{indent}<h{level}>{}</h{level}>\n",
                escape_html(text)
            ));
        }
        Node::List { ordered, items } => {
            let tag = if *ordered { "ol" } else { "ul" };
            doc.push_str(&format!("{indent}<{tag}>\n"));
            for item in items {
                doc.push_str(&format!("{indent}  <li>{}</li>\n", escape_html(item)));
            }
            doc.push_str(&format!("{indent}</{tag}>\n"));
        }
        Node::Container { children } => {
            doc.push_str(&format!("{indent}<div>\n"));
            for child in children {
                write_node(doc, child, depth + 1);
            }
            doc.push_str(&format!("{indent}</div>\n"));
        }
    }
}

/// Write one run. Leading whitespace goes before the emphasis tags.
fn write_run(doc: &mut String, run: &TextRun) {
    let body = run.text.trim_start();
    doc.push_str(&run.text[..run.text.len() - body.len()]);
    let text = escape_html(body);
    match (run.bold, run.italic) {
        (true, true) => doc.push_str(&format!("<strong><em>{text}</em></strong>")),
        (true, false) => doc.push_str(&format!("<strong>{text}</strong>")),
        (false, true) => doc.push_str(&format!("<em>{text}</em>")),
        (false, false) => doc.push_str(&text),
    }
}

/// Element id of a chapter's article: `chapter-{id}`, with whitespace,
/// control characters and `%` percent-encoded. HTML ids may not contain
/// whitespace; encoding `%` as well keeps distinct ids distinct.
pub fn chapter_anchor(id: &str) -> String {
    let mut anchor = String::from("chapter-");
    let mut buf = [0u8; 4];
    for c in id.chars() {
        if c.is_whitespace() || c.is_control() || c == '%' {
            for &byte in c.encode_utf8(&mut buf).as_bytes() {
                anchor.push_str(percent_encode_byte(byte));
            }
        } else {
            anchor.push(c);
        }
    }
    anchor
}

/// Contents link to a chapter's anchor, percent-encoded as a fragment.
pub fn chapter_href(id: &str) -> String {
    format!("#{}", utf8_percent_encode(&chapter_anchor(id), FRAGMENT))
}

/// Escape text for HTML content and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}
