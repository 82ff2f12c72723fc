//! DOCX package backend.
//!
//! A package is read into an ordered list of zip entries. Only
//! `word/document.xml` is interpreted: body paragraphs, top-level tables and
//! their runs are lifted into the document model, and every run remembers
//! the byte range of its `<w:r>` element and of its text-bearing children.
//! Saving rewrites only the text of runs that changed and writes every other
//! entry back untouched, in the original order.

use crate::error::{DocumentOpenError, SaveError};
use crate::model::{Cell, FontSize, Paragraph, Row, Run, RunFormat, StructuredDocument, Table};
use quick_xml::escape::{escape, partial_escape, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const DOCUMENT_PART: &str = "word/document.xml";

// ─── Package zip I/O ────────────────────────────────────────────────────────

/// Read a DOCX zip into an ordered list of (entry_name, bytes).
pub fn read_docx(path: &Path) -> Result<Vec<(String, Vec<u8>)>, DocumentOpenError> {
    let io_err = |source| DocumentOpenError::Io {
        path: path.to_path_buf(),
        source,
    };
    let zip_err = |source| DocumentOpenError::Package {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::open(path).map_err(io_err)?;
    let mut archive = zip::ZipArchive::new(file).map_err(zip_err)?;
    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(zip_err)?;
        let name = entry.name().to_string();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).map_err(io_err)?;
        entries.push((name, data));
    }
    Ok(entries)
}

/// Write an ordered list of (entry_name, bytes) to a DOCX zip.
///
/// Media entries are STORED and everything else DEFLATED, the layout Word
/// itself produces. The package is assembled in a sibling `.part` file and
/// renamed into place, so a failed save never leaves a truncated output.
pub fn write_docx(path: &Path, entries: &[(String, Vec<u8>)]) -> Result<(), SaveError> {
    let partial = partial_path(path);
    let result = write_entries(&partial, path, entries).and_then(|()| {
        std::fs::rename(&partial, path).map_err(|source| SaveError::Io {
            path: path.to_path_buf(),
            source,
        })
    });
    if result.is_err() {
        let _ = std::fs::remove_file(&partial);
    }
    result
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("output.docx"));
    name.push(".part");
    path.with_file_name(name)
}

fn write_entries(
    partial: &Path,
    target: &Path,
    entries: &[(String, Vec<u8>)],
) -> Result<(), SaveError> {
    let io_err = |source| SaveError::Io {
        path: target.to_path_buf(),
        source,
    };
    let zip_err = |source| SaveError::Package {
        path: target.to_path_buf(),
        source,
    };

    let file = std::fs::File::create(partial).map_err(io_err)?;
    let mut zip = zip::ZipWriter::new(file);
    let deflated = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    let stored =
        zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, data) in entries {
        if name.ends_with('/') {
            zip.add_directory(name.as_str(), stored).map_err(zip_err)?;
            continue;
        }
        let opts = if name.starts_with("word/media/") {
            stored
        } else {
            deflated
        };
        zip.start_file(name.as_str(), opts).map_err(zip_err)?;
        zip.write_all(data).map_err(io_err)?;
    }
    let mut file = zip.finish().map_err(zip_err)?;
    file.flush().map_err(io_err)?;
    Ok(())
}

// ─── Document backed by a DOCX package ──────────────────────────────────────

/// Where a parsed run lives in the document model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunLocation {
    Body {
        paragraph: usize,
        run: usize,
    },
    Cell {
        table: usize,
        row: usize,
        cell: usize,
        paragraph: usize,
        run: usize,
    },
}

/// A parsed run and the markup it came from. Offsets index into
/// `word/document.xml`.
#[derive(Debug, Clone)]
struct RunSlot {
    location: RunLocation,
    start: usize,
    end: usize,
    /// Start of `</w:r>`; `None` for a self-closing `<w:r/>`
    content_end: Option<usize>,
    /// `w:t`, `w:tab`, `w:cr` and line-break `w:br` children
    text_spans: Vec<(usize, usize)>,
    original: String,
}

/// A `.docx` file opened read-only; changes are only written by `save`.
///
/// Run text edits are written back. Run formatting is read for reporting
/// and kept exactly as it appears in the template.
#[derive(Debug, Clone)]
pub struct DocxDocument {
    entries: Vec<(String, Vec<u8>)>,
    xml: String,
    paragraphs: Vec<Paragraph>,
    tables: Vec<Table>,
    slots: Vec<RunSlot>,
}

impl DocxDocument {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DocumentOpenError> {
        let path = path.as_ref();
        let entries = read_docx(path)?;
        let data = entries
            .iter()
            .find(|(name, _)| name == DOCUMENT_PART)
            .map(|(_, data)| data.clone())
            .ok_or_else(|| DocumentOpenError::MissingDocumentPart {
                path: path.to_path_buf(),
            })?;
        let xml = String::from_utf8(data).map_err(|_| DocumentOpenError::Encoding {
            path: path.to_path_buf(),
        })?;

        let parsed = BodyParser::new(&xml)
            .parse()
            .map_err(|reason| DocumentOpenError::Markup {
                path: path.to_path_buf(),
                reason,
            })?;

        log::info!(
            "Opened {}: {} paragraphs, {} tables, {} runs",
            path.display(),
            parsed.paragraphs.len(),
            parsed.tables.len(),
            parsed.slots.len()
        );

        Ok(Self {
            entries,
            paragraphs: parsed.paragraphs,
            tables: parsed.tables,
            slots: parsed.slots,
            xml,
        })
    }

    /// `word/document.xml` with the current run texts applied.
    pub fn document_xml(&self) -> String {
        let mut result = self.xml.clone();
        // Slots are in document order; splice from the end so earlier
        // offsets stay valid.
        for slot in self.slots.iter().rev() {
            let Some(current) = self.run_at(slot.location) else {
                continue;
            };
            if current.text == slot.original {
                continue;
            }
            let new_run = rewrite_run_text(&self.xml, slot, &current.text);
            result.replace_range(slot.start..slot.end, &new_run);
        }
        result
    }

    fn run_at(&self, location: RunLocation) -> Option<&Run> {
        match location {
            RunLocation::Body { paragraph, run } => self.paragraphs.get(paragraph)?.runs().get(run),
            RunLocation::Cell {
                table,
                row,
                cell,
                paragraph,
                run,
            } => self
                .tables
                .get(table)?
                .rows()
                .get(row)?
                .cells()
                .get(cell)?
                .paragraphs()
                .get(paragraph)?
                .runs()
                .get(run),
        }
    }
}

impl StructuredDocument for DocxDocument {
    fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    fn paragraphs_mut(&mut self) -> &mut [Paragraph] {
        &mut self.paragraphs
    }

    fn tables(&self) -> &[Table] {
        &self.tables
    }

    fn tables_mut(&mut self) -> &mut [Table] {
        &mut self.tables
    }

    fn save(&self, path: &Path) -> Result<(), SaveError> {
        let xml = self.document_xml();
        let entries: Vec<(String, Vec<u8>)> = self
            .entries
            .iter()
            .map(|(name, data)| {
                if name == DOCUMENT_PART {
                    (name.clone(), xml.as_bytes().to_vec())
                } else {
                    (name.clone(), data.clone())
                }
            })
            .collect();
        write_docx(path, &entries)?;
        log::info!("Saved {} ({} zip entries)", path.display(), entries.len());
        Ok(())
    }
}

// ─── document.xml → model ───────────────────────────────────────────────────

#[derive(Debug, Default)]
struct ParsedBody {
    paragraphs: Vec<Paragraph>,
    tables: Vec<Table>,
    slots: Vec<RunSlot>,
}

struct ParagraphBuilder {
    depth: usize,
    in_cell: bool,
    runs: Vec<Run>,
}

struct RunBuilder {
    depth: usize,
    start: usize,
    /// Open text-bearing child as (element start, content start)
    child: Option<(usize, usize)>,
    text_spans: Vec<(usize, usize)>,
    run: Run,
}

struct BodyParser<'a> {
    xml: &'a str,
    stack: Vec<String>,
    body: ParsedBody,
    table: Option<Vec<Row>>,
    row: Option<Vec<Cell>>,
    cell: Option<Vec<Paragraph>>,
    paragraph: Option<ParagraphBuilder>,
    run: Option<RunBuilder>,
}

const BODY: &[&str] = &["w:body"];
const BODY_TABLE: &[&str] = &["w:body", "w:tbl"];
const BODY_ROW: &[&str] = &["w:body", "w:tbl", "w:tr"];
const BODY_CELL: &[&str] = &["w:body", "w:tbl", "w:tr", "w:tc"];

fn position(reader: &Reader<&[u8]>) -> usize {
    reader.buffer_position() as usize
}

fn element_name(element: &BytesStart) -> String {
    String::from_utf8_lossy(element.name().as_ref()).into_owned()
}

fn attribute(element: &BytesStart, name: &str) -> Option<String> {
    element
        .try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|attr| attr.unescape_value().ok())
        .map(|value| value.into_owned())
}

impl<'a> BodyParser<'a> {
    fn new(xml: &'a str) -> Self {
        Self {
            xml,
            stack: Vec::new(),
            body: ParsedBody::default(),
            table: None,
            row: None,
            cell: None,
            paragraph: None,
            run: None,
        }
    }

    fn parse(mut self) -> Result<ParsedBody, String> {
        let mut reader = Reader::from_str(self.xml);
        loop {
            // Text is not trimmed, so every event starts where the last ended.
            let start = position(&reader);
            let event = reader
                .read_event()
                .map_err(|e| format!("{} near byte {}", e, start))?;
            let end = position(&reader);
            match event {
                Event::Start(element) => {
                    let name = element_name(&element);
                    self.open(&name, &element, start, end, false);
                    self.stack.push(name);
                }
                Event::Empty(element) => {
                    let name = element_name(&element);
                    self.open(&name, &element, start, end, true);
                    self.close(&name, start, end, true)?;
                }
                Event::End(element) => {
                    let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
                    match self.stack.pop() {
                        Some(open) if open == name => {}
                        Some(open) => {
                            return Err(format!(
                                "expected </{}>, found </{}> at byte {}",
                                open, name, start
                            ))
                        }
                        None => return Err(format!("unexpected </{}> at byte {}", name, start)),
                    }
                    self.close(&name, start, end, false)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }
        if let Some(open) = self.stack.last() {
            return Err(format!("<{}> is never closed", open));
        }
        Ok(self.body)
    }

    /// Whether the open elements end with `path`.
    fn inside(&self, path: &[&str]) -> bool {
        self.stack.len() >= path.len()
            && self.stack[self.stack.len() - path.len()..]
                .iter()
                .zip(path)
                .all(|(open, name)| open.as_str() == *name)
    }

    /// Called for every start tag, with the stack holding its ancestors.
    fn open(&mut self, name: &str, element: &BytesStart, start: usize, end: usize, empty: bool) {
        let depth = self.stack.len();
        match name {
            "w:tbl" if self.inside(BODY) => self.table = Some(Vec::new()),
            "w:tr" if self.inside(BODY_TABLE) && self.table.is_some() => {
                self.row = Some(Vec::new())
            }
            "w:tc" if self.inside(BODY_ROW) && self.row.is_some() => self.cell = Some(Vec::new()),
            "w:p" if self.inside(BODY) => {
                self.paragraph = Some(ParagraphBuilder {
                    depth,
                    in_cell: false,
                    runs: Vec::new(),
                })
            }
            "w:p" if self.inside(BODY_CELL) && self.cell.is_some() => {
                self.paragraph = Some(ParagraphBuilder {
                    depth,
                    in_cell: true,
                    runs: Vec::new(),
                })
            }
            "w:r" if self.starts_run(depth) => {
                self.run = Some(RunBuilder {
                    depth,
                    start,
                    child: None,
                    text_spans: Vec::new(),
                    run: Run::new(""),
                })
            }
            _ => self.run_child(name, element, start, end, empty, depth),
        }
    }

    /// A run is a `w:r` directly inside the current paragraph, or inside a
    /// hyperlink that is.
    fn starts_run(&self, depth: usize) -> bool {
        let Some(paragraph) = &self.paragraph else {
            return false;
        };
        self.run.is_none()
            && (depth == paragraph.depth + 1
                || (depth == paragraph.depth + 2
                    && self.stack.last().map(String::as_str) == Some("w:hyperlink")))
    }

    fn run_child(
        &mut self,
        name: &str,
        element: &BytesStart,
        start: usize,
        end: usize,
        empty: bool,
        depth: usize,
    ) {
        let Some(builder) = self.run.as_mut() else {
            return;
        };
        if depth == builder.depth + 1 {
            let marker = match name {
                "w:t" => None,
                "w:tab" => Some('\t'),
                "w:cr" => Some('\n'),
                "w:br" if is_line_break(element) => Some('\n'),
                _ => return,
            };
            builder.run.text.extend(marker);
            if empty {
                builder.text_spans.push((start, end));
            } else {
                builder.child = Some((start, end));
            }
        } else if depth == builder.depth + 2
            && self.stack.get(builder.depth + 1).map(String::as_str) == Some("w:rPr")
        {
            apply_property(&mut builder.run.format, name, element);
        }
    }

    /// Called for every end tag (and after `open` for self-closing tags),
    /// with the stack holding the element's ancestors.
    fn close(&mut self, name: &str, start: usize, end: usize, empty: bool) -> Result<(), String> {
        let depth = self.stack.len();
        match name {
            "w:r" if self.run.as_ref().is_some_and(|r| r.depth == depth) => {
                let content_end = if empty { None } else { Some(start) };
                self.finish_run(end, content_end)
            }
            "w:p" if self.paragraph.as_ref().is_some_and(|p| p.depth == depth) => {
                self.finish_paragraph()
            }
            "w:tc" if self.inside(BODY_ROW) => {
                if let (Some(cell), Some(row)) = (self.cell.take(), self.row.as_mut()) {
                    row.push(Cell::new(cell));
                }
            }
            "w:tr" if self.inside(BODY_TABLE) => {
                if let (Some(row), Some(table)) = (self.row.take(), self.table.as_mut()) {
                    table.push(Row::new(row));
                }
            }
            "w:tbl" if self.inside(BODY) => {
                if let Some(table) = self.table.take() {
                    self.body.tables.push(Table::new(table));
                }
            }
            _ => {
                let xml = self.xml;
                let Some(builder) = self.run.as_mut() else {
                    return Ok(());
                };
                if depth != builder.depth + 1 {
                    return Ok(());
                }
                if let Some((element_start, content_start)) = builder.child.take() {
                    if name == "w:t" {
                        let text = unescape(&xml[content_start..start])
                            .map_err(|e| format!("{} in text at byte {}", e, content_start))?;
                        builder.run.text.push_str(&text);
                    }
                    builder.text_spans.push((element_start, end));
                }
            }
        }
        Ok(())
    }

    fn finish_run(&mut self, end: usize, content_end: Option<usize>) {
        let (Some(builder), Some(paragraph)) = (self.run.take(), self.paragraph.as_mut()) else {
            return;
        };
        let location = if paragraph.in_cell {
            RunLocation::Cell {
                table: self.body.tables.len(),
                row: self.table.as_ref().map_or(0, Vec::len),
                cell: self.row.as_ref().map_or(0, Vec::len),
                paragraph: self.cell.as_ref().map_or(0, Vec::len),
                run: paragraph.runs.len(),
            }
        } else {
            RunLocation::Body {
                paragraph: self.body.paragraphs.len(),
                run: paragraph.runs.len(),
            }
        };
        self.body.slots.push(RunSlot {
            location,
            start: builder.start,
            end,
            content_end,
            text_spans: builder.text_spans,
            original: builder.run.text.clone(),
        });
        paragraph.runs.push(builder.run);
    }

    fn finish_paragraph(&mut self) {
        let Some(builder) = self.paragraph.take() else {
            return;
        };
        let paragraph = Paragraph::new(builder.runs);
        if builder.in_cell {
            if let Some(cell) = self.cell.as_mut() {
                cell.push(paragraph);
            }
        } else {
            self.body.paragraphs.push(paragraph);
        }
    }
}

/// Only text-wrapping breaks are text; page and column breaks are layout.
fn is_line_break(element: &BytesStart) -> bool {
    attribute(element, "w:type").map_or(true, |kind| kind == "textWrapping")
}

/// WordprocessingML toggle: present without `w:val`, or with any value
/// other than false/0/off, means on.
fn toggle_on(element: &BytesStart) -> bool {
    attribute(element, "w:val").map_or(true, |v| !matches!(v.as_str(), "0" | "false" | "off"))
}

fn apply_property(format: &mut RunFormat, name: &str, element: &BytesStart) {
    match name {
        "w:b" => format.bold = Some(toggle_on(element)),
        "w:i" => format.italic = Some(toggle_on(element)),
        "w:u" => {
            format.underline = Some(attribute(element, "w:val").map_or(true, |v| v != "none"))
        }
        "w:rFonts" => format.font_name = attribute(element, "w:ascii"),
        "w:sz" => {
            format.font_size = attribute(element, "w:val")
                .and_then(|v| v.parse::<u32>().ok())
                .map(FontSize)
        }
        _ => {}
    }
}

// ─── model → markup ─────────────────────────────────────────────────────────

/// Replace the run's text-bearing children with `text`, keeping every
/// other child (properties, page breaks, drawings, field chars) in place.
fn rewrite_run_text(xml: &str, slot: &RunSlot, text: &str) -> String {
    let new_text = text_elements(text);
    let Some(content_end) = slot.content_end else {
        let open = xml[slot.start..slot.end].trim_end_matches("/>").trim_end();
        return format!("{}>{}</w:r>", open, new_text);
    };

    let insert_at = slot
        .text_spans
        .first()
        .map_or(content_end, |&(start, _)| start);
    let mut out = String::with_capacity(slot.end - slot.start + new_text.len());
    out.push_str(&xml[slot.start..insert_at]);
    out.push_str(&new_text);
    let mut cursor = insert_at;
    for &(start, end) in &slot.text_spans {
        out.push_str(&xml[cursor..start]);
        cursor = end;
    }
    out.push_str(&xml[cursor..slot.end]);
    out
}

/// A fresh `<w:rPr>` for a format; empty when every property is inherited.
fn run_properties(format: &RunFormat) -> String {
    let mut body = String::new();
    if let Some(font) = &format.font_name {
        let font = escape(font.as_str());
        body.push_str(&format!(r#"<w:rFonts w:ascii="{0}" w:hAnsi="{0}"/>"#, font));
    }
    if let Some(bold) = format.bold {
        body.push_str(&toggle_element("w:b", bold));
    }
    if let Some(italic) = format.italic {
        body.push_str(&toggle_element("w:i", italic));
    }
    if let Some(size) = format.font_size {
        body.push_str(&format!(r#"<w:sz w:val="{}"/>"#, size.half_points()));
    }
    if let Some(underline) = format.underline {
        let val = if underline { "single" } else { "none" };
        body.push_str(&format!(r#"<w:u w:val="{}"/>"#, val));
    }
    if body.is_empty() {
        return body;
    }
    format!("<w:rPr>{}</w:rPr>", body)
}

fn toggle_element(name: &str, on: bool) -> String {
    if on {
        format!("<{}/>", name)
    } else {
        format!(r#"<{} w:val="0"/>"#, name)
    }
}

/// Text as `w:t`/`w:tab`/`w:br` elements.
fn text_elements(text: &str) -> String {
    fn flush(out: &mut String, pending: &mut String) {
        if !pending.is_empty() {
            out.push_str(r#"<w:t xml:space="preserve">"#);
            out.push_str(&partial_escape(pending.as_str()));
            out.push_str("</w:t>");
            pending.clear();
        }
    }

    let mut out = String::new();
    let mut pending = String::new();
    for ch in text.chars() {
        match ch {
            '\t' => {
                flush(&mut out, &mut pending);
                out.push_str("<w:tab/>");
            }
            '\n' => {
                flush(&mut out, &mut pending);
                out.push_str("<w:br/>");
            }
            _ => pending.push(ch),
        }
    }
    flush(&mut out, &mut pending);
    out
}

// ─── Fresh packages ─────────────────────────────────────────────────────────

const CONTENT_TYPES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    r#"</Types>"#
);

const PACKAGE_RELS_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
    r#"</Relationships>"#
);

/// Render paragraphs and tables as a complete `word/document.xml`.
pub fn render_document_xml(paragraphs: &[Paragraph], tables: &[Table]) -> String {
    let mut xml = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
        "<w:body>"
    ));
    for paragraph in paragraphs {
        render_paragraph(&mut xml, paragraph);
    }
    for table in tables {
        render_table(&mut xml, table);
    }
    xml.push_str("<w:sectPr/></w:body></w:document>");
    xml
}

fn render_paragraph(xml: &mut String, paragraph: &Paragraph) {
    xml.push_str("<w:p>");
    for run in paragraph.runs() {
        xml.push_str("<w:r>");
        xml.push_str(&run_properties(&run.format));
        xml.push_str(&text_elements(&run.text));
        xml.push_str("</w:r>");
    }
    xml.push_str("</w:p>");
}

fn render_table(xml: &mut String, table: &Table) {
    let columns = table
        .rows()
        .iter()
        .map(|row| row.cells().len())
        .max()
        .unwrap_or(0);
    xml.push_str(r#"<w:tbl><w:tblPr><w:tblW w:w="0" w:type="auto"/></w:tblPr><w:tblGrid>"#);
    for _ in 0..columns {
        xml.push_str(r#"<w:gridCol w:w="2000"/>"#);
    }
    xml.push_str("</w:tblGrid>");
    for row in table.rows() {
        xml.push_str("<w:tr>");
        for cell in row.cells() {
            xml.push_str("<w:tc>");
            // Word requires at least one paragraph per cell.
            if cell.paragraphs().is_empty() {
                xml.push_str("<w:p/>");
            }
            for paragraph in cell.paragraphs() {
                render_paragraph(xml, paragraph);
            }
            xml.push_str("</w:tc>");
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
}

/// Write a minimal DOCX package holding the given content.
pub fn write_new_package(
    path: &Path,
    paragraphs: &[Paragraph],
    tables: &[Table],
) -> Result<(), SaveError> {
    let entries = vec![
        (
            "[Content_Types].xml".to_string(),
            CONTENT_TYPES_XML.as_bytes().to_vec(),
        ),
        ("_rels/.rels".to_string(), PACKAGE_RELS_XML.as_bytes().to_vec()),
        (
            DOCUMENT_PART.to_string(),
            render_document_xml(paragraphs, tables).into_bytes(),
        ),
    ];
    write_docx(path, &entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr/></w:body></w:document>"#,
            body
        )
    }

    fn parse(body: &str) -> ParsedBody {
        BodyParser::new(&wrap(body)).parse().expect("parse failed")
    }

    fn document(body: &str) -> DocxDocument {
        let xml = wrap(body);
        let parsed = BodyParser::new(&xml).parse().expect("parse failed");
        DocxDocument {
            entries: Vec::new(),
            xml,
            paragraphs: parsed.paragraphs,
            tables: parsed.tables,
            slots: parsed.slots,
        }
    }

    #[test]
    fn test_parse_runs_and_formatting() {
        let body = parse(concat!(
            r#"<w:p><w:pPr><w:jc w:val="both"/></w:pPr>"#,
            r#"<w:r><w:t xml:space="preserve">Dear </w:t></w:r>"#,
            r#"<w:r><w:rPr><w:rFonts w:ascii="Times New Roman" w:hAnsi="Times New Roman"/><w:b/><w:i w:val="0"/><w:sz w:val="28"/><w:u w:val="single"/></w:rPr><w:t>___</w:t></w:r>"#,
            r#"</w:p>"#
        ));
        assert_eq!(body.paragraphs.len(), 1);
        let runs = body.paragraphs[0].runs();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "Dear ");
        assert_eq!(runs[0].format, RunFormat::default());
        assert_eq!(runs[1].text, "___");
        assert_eq!(
            runs[1].format,
            RunFormat {
                bold: Some(true),
                italic: Some(false),
                underline: Some(true),
                font_name: Some("Times New Roman".to_string()),
                font_size: Some(FontSize(28)),
            }
        );
    }

    #[test]
    fn test_parse_run_text_children() {
        let body = parse(concat!(
            r#"<w:p><w:r><w:t>a</w:t><w:tab/><w:t>b &amp; c</w:t><w:br/><w:t/></w:r>"#,
            r#"<w:hyperlink w:history="1"><w:r><w:t>link</w:t></w:r></w:hyperlink>"#,
            r#"<w:del><w:r><w:delText>gone</w:delText></w:r></w:del></w:p>"#
        ));
        let p = &body.paragraphs[0];
        assert_eq!(p.runs().len(), 2);
        assert_eq!(p.text(), "a\tb & c\nlink");
    }

    #[test]
    fn test_parse_only_text_wrapping_breaks() {
        let body = parse(concat!(
            r#"<w:p><w:r><w:t>a</w:t><w:br w:type="textWrapping"/><w:t>b</w:t>"#,
            r#"<w:br w:type="page"/><w:br w:type="column"/><w:cr/><w:t>c</w:t></w:r></w:p>"#
        ));
        assert_eq!(body.paragraphs[0].text(), "a\nb\nc");
    }

    #[test]
    fn test_parse_entities() {
        let body = parse(concat!(
            r#"<w:p><w:r><w:t>a &lt;b&gt; &amp; "#,
            r#"&#1048;&#x41; &quot;x&apos;</w:t></w:r></w:p>"#
        ));
        assert_eq!(body.paragraphs[0].text(), "a <b> & ИA \"x'");
    }

    #[test]
    fn test_parse_underline_none_and_missing() {
        let body = parse(concat!(
            r#"<w:p><w:r><w:rPr><w:u w:val="none"/></w:rPr><w:t>x</w:t></w:r>"#,
            r#"<w:r><w:rPr><w:bCs/><w:szCs w:val="20"/></w:rPr><w:t>y</w:t></w:r></w:p>"#
        ));
        let runs = body.paragraphs[0].runs();
        assert_eq!(runs[0].format.underline, Some(false));
        assert_eq!(runs[1].format, RunFormat::default());
    }

    #[test]
    fn test_parse_tables_top_level_only() {
        let body = parse(concat!(
            r#"<w:p><w:r><w:t>before</w:t></w:r></w:p>"#,
            r#"<w:tbl><w:tblPr/><w:tr><w:tc><w:p><w:r><w:t>A1</w:t></w:r></w:p></w:tc>"#,
            r#"<w:tc><w:tbl><w:tr><w:tc><w:p><w:r><w:t>nested</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
            r#"<w:p><w:r><w:t>B1</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
            r#"<w:p/>"#
        ));
        assert_eq!(body.paragraphs.len(), 2);
        assert_eq!(body.paragraphs[0].text(), "before");
        assert_eq!(body.paragraphs[1].text(), "");
        assert_eq!(body.tables.len(), 1);
        let cells = body.tables[0].rows()[0].cells();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].paragraphs()[0].text(), "A1");
        assert_eq!(cells[1].paragraphs().len(), 1);
        assert_eq!(cells[1].paragraphs()[0].text(), "B1");

        let locations: Vec<RunLocation> = body.slots.iter().map(|s| s.location).collect();
        assert_eq!(
            locations,
            vec![
                RunLocation::Body {
                    paragraph: 0,
                    run: 0
                },
                RunLocation::Cell {
                    table: 0,
                    row: 0,
                    cell: 0,
                    paragraph: 0,
                    run: 0
                },
                RunLocation::Cell {
                    table: 0,
                    row: 0,
                    cell: 1,
                    paragraph: 0,
                    run: 0
                },
            ]
        );
    }

    #[test]
    fn test_parse_rejects_unbalanced_markup() {
        assert!(BodyParser::new("<w:document><w:body><w:p></w:body></w:document>")
            .parse()
            .is_err());
        assert!(BodyParser::new("<w:document><w:body>").parse().is_err());
    }

    #[test]
    fn test_rewrite_keeps_properties_and_other_children() {
        let mut doc = document(concat!(
            r#"<w:p><w:r w:rsidR="00AB"><w:rPr><w:b/></w:rPr><w:t>a</w:t><w:tab/>"#,
            r#"<w:t>___</w:t><w:lastRenderedPageBreak/></w:r></w:p>"#
        ));
        doc.paragraphs_mut()[0].runs_mut()[0].text = "John & <Co>".to_string();
        let expected = wrap(concat!(
            r#"<w:p><w:r w:rsidR="00AB"><w:rPr><w:b/></w:rPr>"#,
            r#"<w:t xml:space="preserve">John &amp; &lt;Co&gt;</w:t>"#,
            r#"<w:lastRenderedPageBreak/></w:r></w:p>"#
        ));
        assert_eq!(doc.document_xml(), expected);
    }

    #[test]
    fn test_rewrite_keeps_page_break() {
        let mut doc = document(concat!(
            r#"<w:p><w:r><w:t>Приказ №___</w:t>"#,
            r#"<w:br w:type="page"/></w:r></w:p>"#
        ));
        assert_eq!(doc.paragraphs()[0].text(), "Приказ №___");

        doc.paragraphs_mut()[0].runs_mut()[0].text = "Приказ №123".to_string();
        assert_eq!(
            doc.document_xml(),
            wrap(concat!(
                r#"<w:p><w:r><w:t xml:space="preserve">Приказ №123</w:t>"#,
                r#"<w:br w:type="page"/></w:r></w:p>"#
            ))
        );
    }

    #[test]
    fn test_rewrite_empty_runs() {
        let mut doc = document(concat!(
            r#"<w:p><w:r/><w:r w:rsidR="01" />"#,
            r#"<w:r><w:rPr><w:i/></w:rPr></w:r></w:p>"#
        ));
        for run in doc.paragraphs_mut()[0].runs_mut() {
            run.text = "x\ty".to_string();
        }
        let text = r#"<w:t xml:space="preserve">x</w:t><w:tab/><w:t xml:space="preserve">y</w:t>"#;
        let expected = wrap(&format!(
            concat!(
                r#"<w:p><w:r>{0}</w:r><w:r w:rsidR="01">{0}</w:r>"#,
                r#"<w:r><w:rPr><w:i/></w:rPr>{0}</w:r></w:p>"#
            ),
            text
        ));
        assert_eq!(doc.document_xml(), expected);
    }

    #[test]
    fn test_document_xml_only_touches_changed_runs() {
        let mut doc = document(concat!(
            r#"<w:p><w:r><w:t xml:space="preserve">Dear </w:t></w:r>"#,
            r#"<w:r><w:rPr><w:b/></w:rPr><w:t>___</w:t></w:r></w:p>"#
        ));
        let original = doc.xml.clone();
        assert_eq!(doc.document_xml(), original);

        doc.paragraphs_mut()[0].runs_mut()[1].text = "John".to_string();
        let expected = original.replace(
            "<w:t>___</w:t>",
            r#"<w:t xml:space="preserve">John</w:t>"#,
        );
        assert_eq!(doc.document_xml(), expected);
    }

    #[test]
    fn test_run_properties_from_format() {
        let format = RunFormat {
            bold: Some(true),
            italic: Some(false),
            underline: Some(true),
            font_name: Some("A&B".to_string()),
            font_size: Some(FontSize(24)),
        };
        assert_eq!(
            run_properties(&format),
            concat!(
                r#"<w:rPr><w:rFonts w:ascii="A&amp;B" w:hAnsi="A&amp;B"/><w:b/>"#,
                r#"<w:i w:val="0"/><w:sz w:val="24"/><w:u w:val="single"/></w:rPr>"#
            )
        );
        assert_eq!(run_properties(&RunFormat::default()), "");
    }

    #[test]
    fn test_rendered_document_parses_back() {
        let paragraphs = vec![Paragraph::new(vec![
            Run::new("line\tone\ntwo"),
            Run::with_format(
                "«X»",
                RunFormat {
                    italic: Some(true),
                    underline: Some(false),
                    ..Default::default()
                },
            ),
        ])];
        let tables = vec![Table::new(vec![Row::new(vec![Cell::new(vec![])])])];
        let xml = render_document_xml(&paragraphs, &tables);
        let parsed = BodyParser::new(&xml).parse().unwrap();
        assert_eq!(parsed.paragraphs, paragraphs);
        assert_eq!(parsed.tables.len(), 1);
        assert_eq!(parsed.tables[0].rows()[0].cells()[0].paragraphs().len(), 1);
    }
}
