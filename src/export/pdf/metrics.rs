//! Embedded font faces and text measurement.
//!
//! PDF text is set in TrueType faces that are embedded in the document, so
//! any script the faces cover prints as written. The bundled set is DejaVu
//! Sans, which covers Latin, Greek and Cyrillic.

use std::fmt;
use std::sync::{Arc, OnceLock};

use owned_ttf_parser::{AsFaceRef, Face, GlyphId, OwnedFace, name_id};

use crate::error::{RenderError, RenderResult};

/// Font face used for a span of PDF text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    pub const ALL: [FontStyle; 4] = [
        FontStyle::Regular,
        FontStyle::Bold,
        FontStyle::Italic,
        FontStyle::BoldItalic,
    ];

    pub fn from_flags(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (false, false) => FontStyle::Regular,
            (true, false) => FontStyle::Bold,
            (false, true) => FontStyle::Italic,
            (true, true) => FontStyle::BoldItalic,
        }
    }

    pub fn is_bold(self) -> bool {
        matches!(self, FontStyle::Bold | FontStyle::BoldItalic)
    }

    pub fn is_italic(self) -> bool {
        matches!(self, FontStyle::Italic | FontStyle::BoldItalic)
    }

    /// Resource name in the page font dictionary.
    pub fn resource(self) -> &'static str {
        match self {
            FontStyle::Regular => "F1",
            FontStyle::Bold => "F2",
            FontStyle::Italic => "F3",
            FontStyle::BoldItalic => "F4",
        }
    }
}

/// Measures the advance width of text on the rendering surface.
pub trait TextMeasure {
    /// Width of `text` in points at `size`.
    fn width(&self, text: &str, font: FontStyle, size: f32) -> f32;
}

/// Distance from the top of a line box to its baseline, as a fraction of
/// the font size.
pub const ASCENT: f32 = 0.76;

/// A parsed TrueType face together with its file bytes.
pub struct FontFace {
    face: OwnedFace,
    name: String,
}

impl FontFace {
    /// Parse the first face of a TrueType file.
    pub fn from_vec(data: Vec<u8>) -> RenderResult<Self> {
        let face = OwnedFace::from_vec(data, 0).map_err(|e| RenderError::Font(e.to_string()))?;
        let name = postscript_name(face.as_face_ref()).unwrap_or_else(|| "Embedded".to_string());
        Ok(Self { face, name })
    }

    fn face(&self) -> &Face<'_> {
        self.face.as_face_ref()
    }

    /// The font file as embedded in the PDF.
    pub fn data(&self) -> &[u8] {
        self.face.as_slice()
    }

    /// PostScript name, restricted to characters valid in a PDF name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn units_per_em(&self) -> u16 {
        self.face().units_per_em()
    }

    /// Glyph for a character, or 0 (`.notdef`) when the face lacks one.
    pub fn glyph(&self, c: char) -> u16 {
        self.face().glyph_index(c).map_or(0, |id| id.0)
    }

    pub fn has_glyph(&self, c: char) -> bool {
        self.glyph(c) != 0
    }

    /// Horizontal advance in font units.
    pub fn advance(&self, glyph: u16) -> u16 {
        self.face().glyph_hor_advance(GlyphId(glyph)).unwrap_or(0)
    }

    /// Convert font units to the 1/1000 em units of PDF font dictionaries.
    pub fn to_pdf_units(&self, units: i32) -> i64 {
        let upem = i64::from(self.units_per_em().max(1));
        (i64::from(units) * 1000 + upem / 2).div_euclid(upem)
    }

    pub fn ascender(&self) -> i16 {
        self.face().ascender()
    }

    pub fn descender(&self) -> i16 {
        self.face().descender()
    }

    pub fn cap_height(&self) -> i16 {
        self.face()
            .capital_height()
            .unwrap_or_else(|| self.ascender())
    }

    /// Union of all glyph boxes: `[x_min, y_min, x_max, y_max]`.
    pub fn bounding_box(&self) -> [i16; 4] {
        let rect = self.face().global_bounding_box();
        [rect.x_min, rect.y_min, rect.x_max, rect.y_max]
    }

    /// Width of `text` in points at `size`. The faces are set without
    /// kerning, so widths add up character by character.
    pub fn width(&self, text: &str, size: f32) -> f32 {
        let units: u32 = text
            .chars()
            .map(|c| u32::from(self.advance(self.glyph(c))))
            .sum();
        units as f32 * size / f32::from(self.units_per_em().max(1))
    }
}

impl fmt::Debug for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontFace")
            .field("name", &self.name)
            .field("bytes", &self.data().len())
            .finish()
    }
}

fn postscript_name(face: &Face<'_>) -> Option<String> {
    let name = face
        .names()
        .into_iter()
        .filter(|name| name.name_id == name_id::POST_SCRIPT_NAME)
        .find_map(|name| name.to_string())?;
    let name: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+'))
        .collect();
    (!name.is_empty()).then_some(name)
}

/// The four faces a book is set in.
#[derive(Debug)]
pub struct FontSet {
    regular: FontFace,
    bold: FontFace,
    italic: FontFace,
    bold_italic: FontFace,
}

static BUNDLED: OnceLock<Result<Arc<FontSet>, String>> = OnceLock::new();

impl FontSet {
    pub fn new(regular: FontFace, bold: FontFace, italic: FontFace, bold_italic: FontFace) -> Self {
        Self {
            regular,
            bold,
            italic,
            bold_italic,
        }
    }

    /// DejaVu Sans, compiled into the crate. Parsed once per process.
    pub fn bundled() -> RenderResult<Arc<FontSet>> {
        BUNDLED
            .get_or_init(|| match load_bundled() {
                Ok(set) => Ok(Arc::new(set)),
                Err(RenderError::Font(message)) => Err(message),
                Err(other) => Err(other.to_string()),
            })
            .clone()
            .map_err(RenderError::Font)
    }

    pub fn face(&self, style: FontStyle) -> &FontFace {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
            FontStyle::BoldItalic => &self.bold_italic,
        }
    }
}

fn load_bundled() -> RenderResult<FontSet> {
    let load = |bytes: &[u8]| FontFace::from_vec(bytes.to_vec());
    Ok(FontSet::new(
        load(include_bytes!("../../../fonts/DejaVuSans.ttf"))?,
        load(include_bytes!("../../../fonts/DejaVuSans-Bold.ttf"))?,
        load(include_bytes!("../../../fonts/DejaVuSans-Oblique.ttf"))?,
        load(include_bytes!("../../../fonts/DejaVuSans-BoldOblique.ttf"))?,
    ))
}

impl TextMeasure for FontSet {
    fn width(&self, text: &str, font: FontStyle, size: f32) -> f32 {
        self.face(font).width(text, size)
    }
}
