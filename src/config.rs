//! Export configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```
//! use bookpress::ExportConfig;
//!
//! let config = ExportConfig::from_json_str(r#"{
//!     "base_filename": "field-notes",
//!     "text": { "line_width": 60 },
//!     "labels": { "contents": "Inhalt" }
//! }"#).unwrap();
//! assert_eq!(config.text.line_width, 60);
//! assert_eq!(config.labels.chapter, "Chapter");
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::export::{DocxConfig, HtmlConfig, PdfConfig, TextConfig};

/// Fixed strings drawn by the exporters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Labels {
    /// Heading of the table of contents.
    pub contents: String,
    /// Word used in chapter headers, e.g. `[CHAPTER 3]`.
    pub chapter: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            contents: "Contents".to_string(),
            chapter: "Chapter".to_string(),
        }
    }
}

/// Configuration for all exporters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Artifact file name without extension.
    pub base_filename: String,
    pub text: TextConfig,
    pub html: HtmlConfig,
    pub docx: DocxConfig,
    pub pdf: PdfConfig,
    pub labels: Labels,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            base_filename: "book".to_string(),
            text: TextConfig::default(),
            html: HtmlConfig::default(),
            docx: DocxConfig::default(),
            pdf: PdfConfig::default(),
            labels: Labels::default(),
        }
    }
}

impl ExportConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
