//! Plain text exporter.
//!
//! Emits the title block, a numbered table of contents, every chapter as
//! stripped text hard-wrapped at a fixed column, and the colophon.
//!
//! Output is a pure function of the book, the config and the injected year.

use std::io::{Seek, Write};

use serde::Deserialize;
use tracing::debug;

use crate::config::Labels;
use crate::content::{leaf_blocks, normalize_book};
use crate::error::RenderResult;
use crate::model::{Book, starts_part};

use super::{Exporter, RenderContext, copyright_line};

/// Indent of chapter lines in the table of contents.
const TOC_INDENT: &str = "    ";

/// Configuration for plain text export.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Line width for wrapping, in characters (0 = no wrapping).
    pub line_width: usize,
    /// Length of the `=` divider between chapters.
    pub divider_width: usize,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            line_width: 75,
            divider_width: 75,
        }
    }
}

/// Exporter for plain text output.
#[derive(Debug, Clone, Default)]
pub struct TextExporter {
    config: TextConfig,
    labels: Labels,
}

impl TextExporter {
    /// Create a new TextExporter with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the exporter with custom settings.
    pub fn with_config(mut self, config: TextConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    fn divider(&self) -> String {
        "=".repeat(self.config.divider_width)
    }

    /// Wrap `text` and write it, one line per wrapped line.
    fn write_wrapped<W: Write>(&self, writer: &mut W, text: &str) -> RenderResult<()> {
        for line in text.lines() {
            for wrapped in wrap_text(line, self.config.line_width) {
                writeln!(writer, "{wrapped}")?;
            }
        }
        Ok(())
    }
}

impl Exporter for TextExporter {
    fn export<W: Write + Seek>(
        &self,
        book: &Book,
        ctx: &RenderContext,
        writer: &mut W,
    ) -> RenderResult<()> {
        let info = book.info();
        let chapters = normalize_book(book);
        let divider = self.divider();

        // Title block
        self.write_wrapped(writer, &info.title)?;
        for line in [&info.subtitle, &info.tagline] {
            if !line.is_empty() {
                self.write_wrapped(writer, line)?;
            }
        }
        writeln!(writer)?;
        writeln!(writer, "{divider}")?;
        writeln!(writer)?;

        // Table of contents
        writeln!(writer, "{}", self.labels.contents.to_uppercase())?;
        for group in book.part_groups() {
            writeln!(writer)?;
            if let Some(label) = group.label {
                self.write_wrapped(writer, &label.to_uppercase())?;
            }
            for entry in &group.chapters {
                let prefix = format!("{TOC_INDENT}{}. ", entry.number);
                let width = self
                    .config
                    .line_width
                    .saturating_sub(prefix.chars().count())
                    .max(1);
                let width = if self.config.line_width == 0 { 0 } else { width };
                let continuation = " ".repeat(prefix.chars().count());
                for (i, line) in wrap_text(&entry.chapter.title, width).iter().enumerate() {
                    let lead = if i == 0 { &prefix } else { &continuation };
                    writeln!(writer, "{lead}{line}")?;
                }
            }
        }
        writeln!(writer)?;

        // Chapters
        for (index, normalized) in chapters.iter().enumerate() {
            let chapter = normalized.chapter;
            writeln!(writer, "{divider}")?;
            writeln!(writer)?;

            if starts_part(book.chapters(), index)
                && let Some(part) = chapter.part.as_deref()
            {
                self.write_wrapped(writer, part)?;
                writeln!(writer, "{}", "=".repeat(part.chars().count()))?;
                writeln!(writer)?;
            }

            writeln!(
                writer,
                "[{} {}]",
                self.labels.chapter.to_uppercase(),
                normalized.number
            )?;
            self.write_wrapped(writer, &chapter.title)?;
            let rule = match self.config.line_width {
                0 => chapter.title.chars().count(),
                width => chapter.title.chars().count().min(width),
            };
            writeln!(writer, "{}", "-".repeat(rule))?;
            writeln!(writer)?;

            for block in leaf_blocks(&normalized.nodes) {
                self.write_wrapped(writer, &block.plain_text())?;
                writeln!(writer)?;
            }
        }

        // Colophon
        writeln!(writer, "{divider}")?;
        writeln!(writer)?;
        self.write_wrapped(writer, &copyright_line(info, ctx.year))?;
        if !info.disclaimer.is_empty() {
            writeln!(writer)?;
            self.write_wrapped(writer, &info.disclaimer)?;
        }
        if !info.site.is_empty() {
            writeln!(writer)?;
            self.write_wrapped(writer, &info.site)?;
        }

        debug!(chapters = chapters.len(), "text export complete");
        Ok(())
    }
}

/// Greedy word wrap at `width` characters.
///
/// Lines break only at whitespace. A word longer than `width` is the one
/// exception: it is split into `width`-sized pieces. Runs of whitespace
/// collapse to one space. `width == 0` disables wrapping.
///
/// ```
/// use bookpress::export::wrap_text;
///
/// assert_eq!(wrap_text("aaa bbb ccc", 7), vec!["aaa bbb", "ccc"]);
/// assert_eq!(wrap_text("abcdefgh", 3), vec!["abc", "def", "gh"]);
/// ```
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let words = text.split_whitespace();

    if width == 0 {
        let joined = words.collect::<Vec<_>>().join(" ");
        return if joined.is_empty() { Vec::new() } else { vec![joined] };
    }

    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_len = 0;

    for word in words {
        let word_len = word.chars().count();

        if word_len > width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let chars: Vec<char> = word.chars().collect();
            for chunk in chars.chunks(width) {
                let piece: String = chunk.iter().collect();
                if chunk.len() == width {
                    lines.push(piece);
                    line_len = 0;
                } else {
                    line = piece;
                    line_len = chunk.len();
                }
            }
            continue;
        }

        if line.is_empty() {
            line.push_str(word);
            line_len = word_len;
        } else if line_len + 1 + word_len <= width {
            line.push(' ');
            line.push_str(word);
            line_len += 1 + word_len;
        } else {
            lines.push(std::mem::replace(&mut line, word.to_string()));
            line_len = word_len;
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use proptest::prelude::*;

    use super::*;
    use crate::model::{BookInfo, Chapter};

    fn render(book: &Book, config: TextConfig) -> String {
        let mut out = Cursor::new(Vec::new());
        TextExporter::new()
            .with_config(config)
            .export(book, &RenderContext::new(2025), &mut out)
            .unwrap();
        String::from_utf8(out.into_inner()).unwrap()
    }

    fn sample_book() -> Book {
        Book::new(
            BookInfo::new("Test Code")
                .with_subtitle("Beyond the Matrix")
                .with_tagline("A Unified Theory")
                .with_copyright("Unified Theory")
                .with_disclaimer("A working hypothesis, not a dogma."),
            vec![
                Chapter::new("prologue", "Prologue", "<p>It began with a bug.</p>"),
                Chapter::new("c1", "The Creator", "<p>First.</p><ul><li>one</li></ul>")
                    .with_part("Part I: Architecture"),
                Chapter::new("c2", "Floors", "<h3>Plan</h3><p>Second.</p>")
                    .with_part("Part I: Architecture"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_wrap_basic() {
        assert_eq!(wrap_text("", 10), Vec::<String>::new());
        assert_eq!(wrap_text("   ", 10), Vec::<String>::new());
        assert_eq!(wrap_text("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap_text("one  two", 0), vec!["one two"]);
    }

    #[test]
    fn test_wrap_long_word_is_split() {
        assert_eq!(
            wrap_text("ab abcdefgh cd", 4),
            vec!["ab", "abcd", "efgh", "cd"]
        );
        assert_eq!(wrap_text("abcdefg x", 4), vec!["abcd", "efg", "x"]);
    }

    #[test]
    fn test_wrap_counts_characters_not_bytes() {
        let lines = wrap_text("Привет мир", 6);
        assert_eq!(lines, vec!["Привет", "мир"]);
    }

    #[test]
    fn test_text_layout() {
        let text = render(&sample_book(), TextConfig::default());

        assert!(text.starts_with("Test Code\nBeyond the Matrix\nA Unified Theory\n"));
        assert!(text.contains("CONTENTS\n"));
        assert!(text.contains("PART I: ARCHITECTURE\n    2. The Creator\n    3. Floors\n"));
        assert!(text.contains("    1. Prologue\n"));
        assert!(text.contains("[CHAPTER 2]\nThe Creator\n-----------\n"));
        assert!(text.contains("First.\n\n• one\n"));
        assert!(text.contains("Plan\n\nSecond.\n"));
        assert!(text.contains("© 2025 Unified Theory\n\nA working hypothesis, not a dogma.\n"));
    }

    #[test]
    fn test_part_banner_only_on_part_change() {
        let text = render(&sample_book(), TextConfig::default());
        assert_eq!(text.matches("Part I: Architecture\n====").count(), 1);
    }

    #[test]
    fn test_body_lines_respect_width() {
        let long = "word ".repeat(100);
        let book = Book::new(
            BookInfo::new("T"),
            vec![Chapter::new("a", "A", format!("<p>{long}</p>"))],
        )
        .unwrap();
        let text = render(
            &book,
            TextConfig {
                line_width: 30,
                divider_width: 30,
            },
        );
        assert!(text.lines().all(|l| l.chars().count() <= 30));
    }

    #[test]
    fn test_output_is_deterministic() {
        let book = sample_book();
        assert_eq!(
            render(&book, TextConfig::default()),
            render(&book, TextConfig::default())
        );
    }

    proptest! {
        #[test]
        fn prop_wrap_never_splits_fitting_words(
            words in proptest::collection::vec("[a-zA-Z]{1,12}", 0..40),
            width in 12usize..80,
        ) {
            let text = words.join(" ");
            let lines = wrap_text(&text, width);

            for line in &lines {
                prop_assert!(line.chars().count() <= width);
            }
            // Every word survives intact, in order.
            let rewrapped: Vec<&str> = lines.iter().flat_map(|l| l.split(' ')).collect();
            let expected: Vec<&str> = words.iter().map(String::as_str).collect();
            prop_assert_eq!(rewrapped, expected);
        }

        #[test]
        fn prop_wrap_splits_only_oversized_words(
            word in "[a-z]{1,40}",
            width in 1usize..20,
        ) {
            let lines = wrap_text(&word, width);
            if word.len() <= width {
                prop_assert_eq!(lines, vec![word.clone()]);
            } else {
                prop_assert_eq!(lines.concat(), word.clone());
                prop_assert!(lines.iter().all(|l| l.len() <= width));
            }
        }
    }
}
