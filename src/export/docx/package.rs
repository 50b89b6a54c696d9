//! Office Open XML packaging of a [`Document`].

use std::io::{Cursor, Seek, Write};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::RenderResult;

use super::model::{Block, Document, Paragraph, Run};

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
  <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
</Types>
"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
</Relationships>
"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>
"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:docDefaults>
    <w:rPrDefault>
      <w:rPr>
        <w:rFonts w:ascii="Georgia" w:hAnsi="Georgia" w:eastAsia="Georgia" w:cs="Georgia"/>
        <w:color w:val="333333"/>
        <w:sz w:val="24"/>
        <w:szCs w:val="24"/>
      </w:rPr>
    </w:rPrDefault>
    <w:pPrDefault>
      <w:pPr>
        <w:spacing w:after="120" w:line="312" w:lineRule="auto"/>
      </w:pPr>
    </w:pPrDefault>
  </w:docDefaults>
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
    <w:name w:val="Normal"/>
    <w:qFormat/>
  </w:style>
</w:styles>
"#;

/// Write `document` as a `.docx` package.
///
/// Entry timestamps are pinned to the DOS epoch, so equal documents
/// produce equal bytes.
pub fn write_package<W: Write + Seek>(
    document: &Document,
    compression_level: Option<u32>,
    writer: &mut W,
) -> RenderResult<()> {
    let mut zip = ZipWriter::new(writer);

    let compression_level = compression_level.unwrap_or(6);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(compression_level as i64))
        .last_modified_time(DateTime::default());

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(CONTENT_TYPES.as_bytes())?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(PACKAGE_RELS.as_bytes())?;

    zip.start_file("docProps/core.xml", options)?;
    zip.write_all(&core_xml(document)?)?;

    zip.start_file("word/_rels/document.xml.rels", options)?;
    zip.write_all(DOCUMENT_RELS.as_bytes())?;

    zip.start_file("word/styles.xml", options)?;
    zip.write_all(STYLES.as_bytes())?;

    zip.start_file("word/document.xml", options)?;
    zip.write_all(&document_xml(document)?)?;

    zip.finish()?;
    Ok(())
}

fn xml_writer() -> RenderResult<Writer<Cursor<Vec<u8>>>> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    Ok(writer)
}

fn core_xml(document: &Document) -> RenderResult<Vec<u8>> {
    let mut w = xml_writer()?;
    w.write_event(Event::Start(BytesStart::new("cp:coreProperties").with_attributes([
        (
            "xmlns:cp",
            "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
        ),
        ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
    ])))?;
    text_element(&mut w, "dc:title", &document.title)?;
    if !document.language.is_empty() {
        text_element(&mut w, "dc:language", &document.language)?;
    }
    w.write_event(Event::End(BytesEnd::new("cp:coreProperties")))?;
    Ok(w.into_inner().into_inner())
}

fn text_element(w: &mut Writer<Cursor<Vec<u8>>>, name: &str, text: &str) -> RenderResult<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn document_xml(document: &Document) -> RenderResult<Vec<u8>> {
    let mut w = xml_writer()?;
    w.write_event(Event::Start(
        BytesStart::new("w:document").with_attributes([("xmlns:w", WORDML_NS)]),
    ))?;
    w.write_event(Event::Start(BytesStart::new("w:body")))?;

    for block in &document.blocks {
        match block {
            Block::Paragraph(paragraph) => write_paragraph(&mut w, paragraph)?,
            Block::PageBreak => {
                w.write_event(Event::Start(BytesStart::new("w:p")))?;
                w.write_event(Event::Start(BytesStart::new("w:r")))?;
                w.write_event(Event::Empty(
                    BytesStart::new("w:br").with_attributes([("w:type", "page")]),
                ))?;
                w.write_event(Event::End(BytesEnd::new("w:r")))?;
                w.write_event(Event::End(BytesEnd::new("w:p")))?;
            }
        }
    }

    // A4 with one-inch margins
    w.write_event(Event::Start(BytesStart::new("w:sectPr")))?;
    w.write_event(Event::Empty(
        BytesStart::new("w:pgSz").with_attributes([("w:w", "11906"), ("w:h", "16838")]),
    ))?;
    w.write_event(Event::Empty(BytesStart::new("w:pgMar").with_attributes([
        ("w:top", "1440"),
        ("w:right", "1440"),
        ("w:bottom", "1440"),
        ("w:left", "1440"),
        ("w:header", "708"),
        ("w:footer", "708"),
        ("w:gutter", "0"),
    ])))?;
    w.write_event(Event::End(BytesEnd::new("w:sectPr")))?;

    w.write_event(Event::End(BytesEnd::new("w:body")))?;
    w.write_event(Event::End(BytesEnd::new("w:document")))?;
    Ok(w.into_inner().into_inner())
}

fn write_paragraph(w: &mut Writer<Cursor<Vec<u8>>>, paragraph: &Paragraph) -> RenderResult<()> {
    w.write_event(Event::Start(BytesStart::new("w:p")))?;
    w.write_event(Event::Start(BytesStart::new("w:pPr")))?;

    if let Some(color) = &paragraph.border {
        w.write_event(Event::Start(BytesStart::new("w:pBdr")))?;
        for side in ["w:top", "w:left", "w:bottom", "w:right"] {
            w.write_event(Event::Empty(BytesStart::new(side).with_attributes([
                ("w:val", "single"),
                ("w:sz", "12"),
                ("w:space", "4"),
                ("w:color", color.as_str()),
            ])))?;
        }
        w.write_event(Event::End(BytesEnd::new("w:pBdr")))?;
    }

    let before = paragraph.spacing_before.to_string();
    let after = paragraph.spacing_after.to_string();
    w.write_event(Event::Empty(BytesStart::new("w:spacing").with_attributes([
        ("w:before", before.as_str()),
        ("w:after", after.as_str()),
    ])))?;

    if paragraph.indent > 0 {
        let indent = paragraph.indent.to_string();
        w.write_event(Event::Empty(
            BytesStart::new("w:ind").with_attributes([("w:left", indent.as_str())]),
        ))?;
    }

    w.write_event(Event::Empty(
        BytesStart::new("w:jc").with_attributes([("w:val", paragraph.align.as_str())]),
    ))?;
    w.write_event(Event::End(BytesEnd::new("w:pPr")))?;

    for run in &paragraph.runs {
        write_run(w, run)?;
    }

    w.write_event(Event::End(BytesEnd::new("w:p")))?;
    Ok(())
}

fn write_run(w: &mut Writer<Cursor<Vec<u8>>>, run: &Run) -> RenderResult<()> {
    w.write_event(Event::Start(BytesStart::new("w:r")))?;

    let has_props = run.bold || run.italic || run.size.is_some() || run.color.is_some();
    if has_props {
        w.write_event(Event::Start(BytesStart::new("w:rPr")))?;
        if run.bold {
            w.write_event(Event::Empty(BytesStart::new("w:b")))?;
        }
        if run.italic {
            w.write_event(Event::Empty(BytesStart::new("w:i")))?;
        }
        if let Some(color) = &run.color {
            w.write_event(Event::Empty(
                BytesStart::new("w:color").with_attributes([("w:val", color.as_str())]),
            ))?;
        }
        if let Some(size) = run.size {
            let size = size.to_string();
            w.write_event(Event::Empty(
                BytesStart::new("w:sz").with_attributes([("w:val", size.as_str())]),
            ))?;
        }
        w.write_event(Event::End(BytesEnd::new("w:rPr")))?;
    }

    w.write_event(Event::Start(
        BytesStart::new("w:t").with_attributes([("xml:space", "preserve")]),
    ))?;
    w.write_event(Event::Text(BytesText::new(&run.text)))?;
    w.write_event(Event::End(BytesEnd::new("w:t")))?;

    w.write_event(Event::End(BytesEnd::new("w:r")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use zip::ZipArchive;

    use super::super::model::Alignment;
    use super::*;

    fn package(document: &Document) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        write_package(document, None, &mut out).unwrap();
        out.into_inner()
    }

    fn read_entry(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut text = String::new();
        entry.read_to_string(&mut text).unwrap();
        text
    }

    fn sample() -> Document {
        Document {
            title: "Tom & Jerry".to_string(),
            language: "en".to_string(),
            blocks: vec![
                Block::Paragraph(
                    Paragraph::new(vec![Run::new("Part <One>").bold().size(36).color("8B5CF6")])
                        .aligned(Alignment::Center)
                        .bordered("8B5CF6"),
                ),
                Block::PageBreak,
                Block::Paragraph(
                    Paragraph::new(vec![Run::new("lead "), Run::new("both").bold().italic()])
                        .aligned(Alignment::Justify)
                        .indented(720),
                ),
            ],
        }
    }

    #[test]
    fn test_package_parts() {
        let bytes = package(&sample());
        let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort_unstable();
        assert_eq!(
            names,
            vec![
                "[Content_Types].xml",
                "_rels/.rels",
                "docProps/core.xml",
                "word/_rels/document.xml.rels",
                "word/document.xml",
                "word/styles.xml",
            ]
        );
    }

    #[test]
    fn test_document_xml_properties() {
        let xml = read_entry(&package(&sample()), "word/document.xml");

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>"));
        assert!(xml.contains("<w:jc w:val=\"center\"/>"));
        assert!(xml.contains("<w:jc w:val=\"both\"/>"));
        assert!(xml.contains("<w:ind w:left=\"720\"/>"));
        assert!(xml.contains("<w:pBdr><w:top w:val=\"single\""));
        assert!(xml.contains("<w:br w:type=\"page\"/>"));
        assert!(xml.contains("<w:rPr><w:b/><w:i/></w:rPr>"));
        assert!(xml.contains("<w:color w:val=\"8B5CF6\"/><w:sz w:val=\"36\"/>"));
        assert!(xml.contains("<w:t xml:space=\"preserve\">Part &lt;One&gt;</w:t>"));
        assert!(xml.contains("<w:t xml:space=\"preserve\">lead </w:t>"));
    }

    #[test]
    fn test_core_properties_escape_title() {
        let xml = read_entry(&package(&sample()), "docProps/core.xml");
        assert!(xml.contains("<dc:title>Tom &amp; Jerry</dc:title>"));
        assert!(xml.contains("<dc:language>en</dc:language>"));
    }

    #[test]
    fn test_package_is_deterministic() {
        assert_eq!(package(&sample()), package(&sample()));
    }
}
