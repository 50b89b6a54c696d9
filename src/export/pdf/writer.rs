//! PDF serialization of a [`PdfLayout`].

use std::collections::BTreeMap;
use std::io::Write;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};

use crate::error::RenderResult;

use super::layout::{Page, PageGeometry, Pen, PdfLayout};
use super::metrics::{FontFace, FontSet, FontStyle};

/// Glyphs drawn per face: glyph id to the character it was drawn for.
type GlyphUse = BTreeMap<FontStyle, BTreeMap<u16, char>>;

/// `bfchar` entries per block; the CMap format caps a block at 100.
const CMAP_BLOCK: usize = 100;

/// Write a laid out book as a PDF document.
///
/// Each face that draws at least one glyph is embedded whole as a
/// `CIDFontType2` font under `Identity-H`, so text is shown as glyph ids.
/// A `ToUnicode` map per face keeps the text extractable. All pages share
/// one resource dictionary. No timestamps are written, so equal layouts
/// produce equal bytes.
pub fn write_pdf<W: Write>(
    layout: &PdfLayout,
    fonts: &FontSet,
    title: &str,
    writer: &mut W,
) -> RenderResult<()> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut font_resources = Dictionary::new();
    for (style, glyphs) in glyph_use(layout, fonts) {
        let font_id = embed_font(&mut doc, fonts.face(style), style, &glyphs);
        font_resources.set(style.resource(), font_id);
    }
    let resources_id = doc.add_object(dictionary! {
        "Font" => font_resources,
    });

    let mut kids = Vec::with_capacity(layout.pages.len());
    for page in &layout.pages {
        let content = page_content(page, &layout.geometry, fonts);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    let media_box = vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::from(layout.geometry.width),
        Object::from(layout.geometry.height),
    ];
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => media_box,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::String(text_string(title), StringFormat::Hexadecimal),
        "Producer" => Object::string_literal("bookpress"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    doc.compress();
    doc.save_to(writer)?;
    Ok(())
}

/// Collect every glyph the layout draws, per face. `.notdef` is left out:
/// it has no character to map back to.
fn glyph_use(layout: &PdfLayout, fonts: &FontSet) -> GlyphUse {
    let mut used = GlyphUse::new();
    let lines = layout
        .pages
        .iter()
        .flat_map(|page| page.lines.iter().chain(page.folio.iter()));
    for line in lines {
        let face = fonts.face(line.pen.font);
        let glyphs = used.entry(line.pen.font).or_default();
        for c in line.text.chars() {
            let glyph = face.glyph(c);
            if glyph != 0 {
                glyphs.entry(glyph).or_insert(c);
            }
        }
    }
    used
}

/// Add a Type0 font with its descendant, descriptor, font file and
/// `ToUnicode` map. Returns the Type0 font's id.
fn embed_font(
    doc: &mut Document,
    face: &FontFace,
    style: FontStyle,
    glyphs: &BTreeMap<u16, char>,
) -> ObjectId {
    // TODO: subset the font file to the glyphs in `glyphs`.
    let data = face.data().to_vec();
    let original_length = data.len() as i64;
    let file_id = doc.add_object(Stream::new(
        dictionary! { "Length1" => original_length },
        data,
    ));

    let name = face.name().as_bytes().to_vec();
    let bbox: Vec<Object> = face
        .bounding_box()
        .iter()
        .map(|&v| Object::Integer(face.to_pdf_units(v.into())))
        .collect();
    let (flags, italic_angle) = if style.is_italic() {
        (32 + 64, -11)
    } else {
        (32, 0)
    };
    let stem_v = if style.is_bold() { 120 } else { 80 };
    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => Object::Name(name.clone()),
        "Flags" => flags,
        "FontBBox" => bbox,
        "ItalicAngle" => italic_angle,
        "Ascent" => face.to_pdf_units(face.ascender().into()),
        "Descent" => face.to_pdf_units(face.descender().into()),
        "CapHeight" => face.to_pdf_units(face.cap_height().into()),
        "StemV" => stem_v,
        "FontFile2" => file_id,
    });

    let widths: Vec<Object> = glyphs
        .keys()
        .flat_map(|&glyph| {
            let width = face.to_pdf_units(face.advance(glyph).into());
            [
                Object::Integer(glyph.into()),
                Object::Array(vec![Object::Integer(width)]),
            ]
        })
        .collect();
    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => Object::Name(name.clone()),
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
        "DW" => face.to_pdf_units(face.advance(0).into()),
        "W" => widths,
        "CIDToGIDMap" => "Identity",
    });

    let cmap_id = doc.add_object(Stream::new(
        dictionary! {},
        to_unicode_cmap(glyphs).into_bytes(),
    ));
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => Object::Name(name),
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::Reference(cid_font_id)],
        "ToUnicode" => cmap_id,
    })
}

/// `ToUnicode` CMap from two-byte glyph codes back to UTF-16BE.
fn to_unicode_cmap(glyphs: &BTreeMap<u16, char>) -> String {
    let mut out = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <FFFF>\n\
         endcodespacerange\n",
    );

    let entries: Vec<(&u16, &char)> = glyphs.iter().collect();
    for block in entries.chunks(CMAP_BLOCK) {
        out.push_str(&format!("{} beginbfchar\n", block.len()));
        for (glyph, c) in block {
            let mut units = [0u16; 2];
            let target: String = c
                .encode_utf16(&mut units)
                .iter()
                .map(|unit| format!("{unit:04X}"))
                .collect();
            out.push_str(&format!("<{glyph:04X}> <{target}>\n"));
        }
        out.push_str("endbfchar\n");
    }

    out.push_str(
        "endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );
    out
}

/// Content stream for one page. Font and color operators are emitted only
/// when the pen changes.
fn page_content(page: &Page, geometry: &PageGeometry, fonts: &FontSet) -> Content {
    let mut operations = Vec::new();
    let mut pen: Option<Pen> = None;

    for line in page.lines.iter().chain(page.folio.iter()) {
        operations.push(Operation::new("BT", vec![]));
        if pen.map(|p| (p.font, p.size)) != Some((line.pen.font, line.pen.size)) {
            operations.push(Operation::new(
                "Tf",
                vec![line.pen.font.resource().into(), line.pen.size.into()],
            ));
        }
        if pen.map(|p| p.color) != Some(line.pen.color) {
            let [r, g, b] = line.pen.color;
            operations.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
        }
        pen = Some(line.pen);

        operations.push(Operation::new(
            "Td",
            vec![line.x.into(), (geometry.height - line.baseline).into()],
        ));
        let shown = encode_glyphs(fonts.face(line.pen.font), &line.text);
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(shown, StringFormat::Hexadecimal)],
        ));
        operations.push(Operation::new("ET", vec![]));
    }

    Content { operations }
}

/// Two-byte big-endian glyph ids, as `Identity-H` expects.
fn encode_glyphs(face: &FontFace, text: &str) -> Vec<u8> {
    text.chars()
        .flat_map(|c| face.glyph(c).to_be_bytes())
        .collect()
}

/// PDF text string: UTF-16BE with a byte order mark.
fn text_string(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes
}
