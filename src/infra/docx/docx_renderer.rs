// =============================================================================
// DOCX RENDERER
// =============================================================================
//
// Writes an `AssembledDocument` as a minimal WordprocessingML package:
//
//   [Content_Types].xml
//   _rels/.rels
//   word/document.xml
//   word/_rels/document.xml.rels
//
// Layout is structural only: a centered title, a justified body paragraph,
// then per group a bold "ANEXO - <group>" line and a bordered table whose
// first row is bold. Fonts and sizes are left to the reader's defaults.

use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::core::document::{AssembledDocument, Section};
use crate::core::export::{DocumentRenderer, RenderError};

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Usable width of an A4 page with 2cm margins, in twentieths of a point.
const TEXT_WIDTH_TWIPS: usize = 9638;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#;

fn render_error(err: impl std::fmt::Display) -> RenderError {
    RenderError(err.to_string())
}

#[derive(Debug, Clone, Copy)]
enum Alignment {
    Center,
    Justify,
}

impl Alignment {
    fn as_wordml(self) -> &'static str {
        match self {
            Alignment::Center => "center",
            Alignment::Justify => "both",
        }
    }
}

/// Thin helper over `quick_xml::Writer` for the handful of WordprocessingML
/// elements we emit.
struct BodyWriter {
    xml: Writer<Vec<u8>>,
}

impl BodyWriter {
    fn new() -> Self {
        Self {
            xml: Writer::new(Vec::new()),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), RenderError> {
        self.xml.write_event(event).map_err(render_error)
    }

    fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), RenderError> {
        let mut element = BytesStart::new(name);
        for attribute in attributes {
            element.push_attribute(*attribute);
        }
        self.event(Event::Start(element))
    }

    fn end(&mut self, name: &str) -> Result<(), RenderError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), RenderError> {
        let mut element = BytesStart::new(name);
        for attribute in attributes {
            element.push_attribute(*attribute);
        }
        self.event(Event::Empty(element))
    }

    fn run(&mut self, text: &str, bold: bool) -> Result<(), RenderError> {
        self.start("w:r", &[])?;
        if bold {
            self.start("w:rPr", &[])?;
            self.empty("w:b", &[])?;
            self.end("w:rPr")?;
        }
        // Line breaks inside a cell become <w:br/> between text pieces.
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                self.empty("w:br", &[])?;
            }
            self.start("w:t", &[("xml:space", "preserve")])?;
            self.event(Event::Text(BytesText::new(line.trim_end_matches('\r'))))?;
            self.end("w:t")?;
        }
        self.end("w:r")
    }

    fn paragraph(
        &mut self,
        text: &str,
        alignment: Option<Alignment>,
        bold: bool,
    ) -> Result<(), RenderError> {
        self.start("w:p", &[])?;
        if let Some(alignment) = alignment {
            self.start("w:pPr", &[])?;
            self.empty("w:jc", &[("w:val", alignment.as_wordml())])?;
            self.end("w:pPr")?;
        }
        if !text.is_empty() {
            self.run(text, bold)?;
        }
        self.end("w:p")
    }

    fn table_properties(&mut self, columns: usize) -> Result<(), RenderError> {
        self.start("w:tblPr", &[])?;
        self.empty("w:tblW", &[("w:w", "0"), ("w:type", "auto")])?;
        self.start("w:tblBorders", &[])?;
        for side in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
            self.empty(
                side,
                &[
                    ("w:val", "single"),
                    ("w:sz", "4"),
                    ("w:space", "0"),
                    ("w:color", "000000"),
                ],
            )?;
        }
        self.end("w:tblBorders")?;
        self.end("w:tblPr")?;

        let width = (TEXT_WIDTH_TWIPS / columns).to_string();
        self.start("w:tblGrid", &[])?;
        for _ in 0..columns {
            self.empty("w:gridCol", &[("w:w", width.as_str())])?;
        }
        self.end("w:tblGrid")
    }

    fn table_row(&mut self, cells: &[String], bold: bool) -> Result<(), RenderError> {
        self.start("w:tr", &[])?;
        for cell in cells {
            self.start("w:tc", &[])?;
            self.paragraph(cell, None, bold)?;
            self.end("w:tc")?;
        }
        self.end("w:tr")
    }

    fn section(&mut self, section: &Section) -> Result<(), RenderError> {
        self.paragraph(&section.heading(), None, true)?;

        let columns = section.table.column_count();
        if columns > 0 {
            self.start("w:tbl", &[])?;
            self.table_properties(columns)?;
            self.table_row(&section.table.header, true)?;
            for row in &section.table.rows {
                self.table_row(row, false)?;
            }
            self.end("w:tbl")?;
        }

        // Blank line between sections; also keeps consecutive tables apart.
        self.paragraph("", None, false)
    }

    fn page_setup(&mut self) -> Result<(), RenderError> {
        self.start("w:sectPr", &[])?;
        self.empty("w:pgSz", &[("w:w", "11906"), ("w:h", "16838")])?;
        self.empty(
            "w:pgMar",
            &[
                ("w:top", "1134"),
                ("w:right", "1134"),
                ("w:bottom", "1134"),
                ("w:left", "1134"),
                ("w:header", "709"),
                ("w:footer", "709"),
                ("w:gutter", "0"),
            ],
        )?;
        self.end("w:sectPr")
    }

    fn finish(self) -> Vec<u8> {
        self.xml.into_inner()
    }
}

/// Produces the `word/document.xml` part.
fn document_xml(document: &AssembledDocument) -> Result<Vec<u8>, RenderError> {
    let mut w = BodyWriter::new();

    w.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    w.start("w:document", &[("xmlns:w", WORDML_NS)])?;
    w.start("w:body", &[])?;

    w.paragraph(&document.title_block.title, Some(Alignment::Center), false)?;
    w.paragraph(&document.title_block.body, Some(Alignment::Justify), false)?;

    for section in &document.sections {
        w.section(section)?;
    }

    w.page_setup()?;
    w.end("w:body")?;
    w.end("w:document")?;

    Ok(w.finish())
}

/// Renders `.docx` packages.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxRenderer;

impl DocumentRenderer for DocxRenderer {
    fn mime_type(&self) -> &'static str {
        DOCX_MIME
    }

    fn render(&self, document: &AssembledDocument) -> Result<Vec<u8>, RenderError> {
        let body = document_xml(document)?;

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let parts: [(&str, &[u8]); 4] = [
            ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
            ("_rels/.rels", PACKAGE_RELS.as_bytes()),
            ("word/document.xml", &body),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS.as_bytes()),
        ];
        for (name, content) in parts {
            zip.start_file(name, options).map_err(render_error)?;
            zip.write_all(content).map_err(render_error)?;
        }

        let cursor = zip.finish().map_err(render_error)?;
        Ok(cursor.into_inner())
    }
}
