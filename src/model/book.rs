use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::BookError;

use super::parts::{PartGroup, group_parts};

/// Front matter and closing text of a book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BookInfo {
    pub title: String,
    pub subtitle: String,
    /// Second subtitle line, shown under `subtitle` on title pages.
    pub tagline: String,
    /// Copyright holder, printed as `© {year} {copyright}`.
    pub copyright: String,
    pub disclaimer: String,
    /// Site or publisher identifier printed at the very end.
    pub site: String,
    pub language: String,
}

impl BookInfo {
    /// Create front matter with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    pub fn with_tagline(mut self, tagline: impl Into<String>) -> Self {
        self.tagline = tagline.into();
        self
    }

    pub fn with_copyright(mut self, copyright: impl Into<String>) -> Self {
        self.copyright = copyright.into();
        self
    }

    pub fn with_disclaimer(mut self, disclaimer: impl Into<String>) -> Self {
        self.disclaimer = disclaimer.into();
        self
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = site.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

/// One chapter of the book.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Chapter {
    /// Stable, opaque identifier. Unique within a book.
    pub id: String,
    pub title: String,
    /// Rich markup (HTML fragment).
    pub content: String,
    #[serde(default)]
    pub part: Option<String>,
}

impl Chapter {
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            part: None,
        }
    }

    pub fn with_part(mut self, part: impl Into<String>) -> Self {
        self.part = Some(part.into());
        self
    }
}

#[derive(Deserialize)]
struct RawBook {
    #[serde(default)]
    info: BookInfo,
    chapters: Vec<Chapter>,
}

/// An immutable, ordered book.
///
/// Chapter order is the export order. Ids are validated to be non-empty and
/// unique when the book is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawBook")]
pub struct Book {
    info: BookInfo,
    chapters: Vec<Chapter>,
}

impl TryFrom<RawBook> for Book {
    type Error = BookError;

    fn try_from(raw: RawBook) -> Result<Self, Self::Error> {
        Book::new(raw.info, raw.chapters)
    }
}

impl Book {
    /// Build a book, validating chapter ids.
    pub fn new(info: BookInfo, chapters: Vec<Chapter>) -> Result<Self, BookError> {
        let mut seen = HashSet::new();
        for (i, chapter) in chapters.iter().enumerate() {
            if chapter.id.is_empty() {
                return Err(BookError::EmptyChapterId(i));
            }
            if !seen.insert(chapter.id.as_str()) {
                return Err(BookError::DuplicateChapterId(chapter.id.clone()));
            }
        }
        Ok(Self { info, chapters })
    }

    /// Parse a book from its JSON representation.
    ///
    /// ```
    /// use bookpress::Book;
    ///
    /// let book = Book::from_json(r#"{
    ///     "info": { "title": "Field Notes" },
    ///     "chapters": [
    ///         { "id": "one", "title": "One", "content": "<p>Hello</p>", "part": "Part I" }
    ///     ]
    /// }"#).unwrap();
    /// assert_eq!(book.chapters().len(), 1);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, BookError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON book file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BookError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn info(&self) -> &BookInfo {
        &self.info
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    /// Look up a chapter by id.
    pub fn chapter(&self, id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }

    /// Contiguous part groups in reading order.
    pub fn part_groups(&self) -> Vec<PartGroup<'_>> {
        group_parts(&self.chapters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_duplicate_ids() {
        let result = Book::new(
            BookInfo::new("T"),
            vec![Chapter::new("a", "A", ""), Chapter::new("a", "B", "")],
        );
        assert!(matches!(result, Err(BookError::DuplicateChapterId(id)) if id == "a"));
    }

    #[test]
    fn test_rejects_empty_id() {
        let result = Book::new(BookInfo::new("T"), vec![Chapter::new("", "A", "")]);
        assert!(matches!(result, Err(BookError::EmptyChapterId(0))));
    }

    #[test]
    fn test_json_validation_runs_on_deserialize() {
        let json = r#"{"chapters": [
            {"id": "x", "title": "X", "content": ""},
            {"id": "x", "title": "Y", "content": ""}
        ]}"#;
        assert!(Book::from_json(json).is_err());
    }

    #[test]
    fn test_json_defaults() {
        let book = Book::from_json(r#"{"chapters": [{"id": "x", "title": "X", "content": "<p>a</p>"}]}"#)
            .unwrap();
        assert_eq!(book.info().title, "");
        assert_eq!(book.chapters()[0].part, None);
        assert!(book.chapter("x").is_some());
        assert!(book.chapter("y").is_none());
    }
}
