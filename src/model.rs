//! Structured document object model.
//!
//! A document is an ordered list of top-level paragraphs plus an ordered
//! list of tables. Every paragraph, wherever it lives, is a sequence of
//! formatted runs; its text is always derived from the runs.

use crate::error::SaveError;
use std::path::Path;

/// Font size in half-points, the unit `w:sz` is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontSize(pub u32);

impl FontSize {
    pub fn from_points(points: f32) -> Self {
        FontSize((points * 2.0).round() as u32)
    }

    pub fn half_points(self) -> u32 {
        self.0
    }
}

/// Character formatting carried by a run. `None` means "inherited".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunFormat {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub font_name: Option<String>,
    pub font_size: Option<FontSize>,
}

/// A span of text sharing one formatting attribute set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub format: RunFormat,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: RunFormat::default(),
        }
    }

    pub fn with_format(text: impl Into<String>, format: RunFormat) -> Self {
        Self {
            text: text.into(),
            format,
        }
    }

    /// Length in characters, the unit paragraph offsets are measured in.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    runs: Vec<Run>,
}

impl Paragraph {
    pub fn new(runs: Vec<Run>) -> Self {
        Self { runs }
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Runs can be edited but not added or removed, so backends that map
    /// runs back to markup by position stay consistent.
    pub fn runs_mut(&mut self) -> &mut [Run] {
        &mut self.runs
    }

    /// Concatenated run text, recomputed on every call.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// `(start, end)` character offsets of each run within `text()`.
    ///
    /// Offsets accumulate run lengths in order, so the last end always
    /// equals the paragraph's character length.
    pub fn run_offsets(&self) -> Vec<(usize, usize)> {
        let mut pos = 0usize;
        self.runs
            .iter()
            .map(|run| {
                let start = pos;
                pos += run.char_len();
                (start, pos)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    paragraphs: Vec<Paragraph>,
}

impl Cell {
    pub fn new(paragraphs: Vec<Paragraph>) -> Self {
        Self { paragraphs }
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn paragraphs_mut(&mut self) -> &mut [Paragraph] {
        &mut self.paragraphs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }
}

/// The capability set the locator and replacer rely on.
///
/// Any backend exposing top-level paragraphs, tables and a way to persist
/// itself can be filled; `DocxDocument` reads real packages and
/// `MemoryDocument` is built directly in code.
pub trait StructuredDocument {
    fn paragraphs(&self) -> &[Paragraph];
    fn paragraphs_mut(&mut self) -> &mut [Paragraph];
    fn tables(&self) -> &[Table];
    fn tables_mut(&mut self) -> &mut [Table];
    fn save(&self, path: &Path) -> Result<(), SaveError>;
}

/// A document that lives only in memory. Saving renders a fresh DOCX
/// package with all paragraphs first, then all tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryDocument {
    pub paragraphs: Vec<Paragraph>,
    pub tables: Vec<Table>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_paragraph(mut self, runs: Vec<Run>) -> Self {
        self.paragraphs.push(Paragraph::new(runs));
        self
    }

    pub fn with_table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }
}

impl StructuredDocument for MemoryDocument {
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
        crate::docx::write_new_package(path, &self.paragraphs, &self.tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold() -> RunFormat {
        RunFormat {
            bold: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn test_paragraph_text_tracks_runs() {
        let mut p = Paragraph::new(vec![Run::new("Dear "), Run::with_format("___", bold())]);
        assert_eq!(p.text(), "Dear ___");
        p.runs_mut()[1].text = "John".to_string();
        assert_eq!(p.text(), "Dear John");
    }

    #[test]
    fn test_run_offsets_cover_text_in_chars() {
        let p = Paragraph::new(vec![
            Run::new("ИНН: "),
            Run::new("____"),
            Run::new(""),
            Run::new(" от"),
        ]);
        let offsets = p.run_offsets();
        assert_eq!(offsets, vec![(0, 5), (5, 9), (9, 9), (9, 12)]);
        assert_eq!(offsets.last().unwrap().1, p.text().chars().count());
    }

    #[test]
    fn test_empty_paragraph_has_no_offsets() {
        let p = Paragraph::default();
        assert_eq!(p.text(), "");
        assert!(p.run_offsets().is_empty());
    }

    #[test]
    fn test_font_size_units() {
        let size = FontSize::from_points(14.0);
        assert_eq!(size.half_points(), 28);
    }
}
