//! Placeholder Replacer.
//!
//! Literal, run-local substitution: a marker is replaced only where it lies
//! entirely inside one run, so the run keeps its formatting. A marker whose
//! characters are split across runs is left as it is.

use crate::error::SaveError;
use crate::mapping::Mapping;
use crate::model::{Paragraph, Run, StructuredDocument};
use std::path::Path;

/// Apply `mapping` to every run of every top-level paragraph and every
/// table-cell paragraph. Returns the number of marker occurrences replaced.
pub fn replace_in_place<D: StructuredDocument + ?Sized>(
    document: &mut D,
    mapping: &Mapping,
) -> usize {
    let mut replaced = 0usize;
    for paragraph in document.paragraphs_mut() {
        replaced += replace_in_paragraph(paragraph, mapping);
    }
    for table in document.tables_mut() {
        for row in table.rows_mut() {
            for cell in row.cells_mut() {
                for paragraph in cell.paragraphs_mut() {
                    replaced += replace_in_paragraph(paragraph, mapping);
                }
            }
        }
    }
    replaced
}

/// Replace markers and save the document to `output`.
///
/// Finding nothing to replace is not an error; the document is saved
/// either way.
pub fn replace<D: StructuredDocument + ?Sized>(
    document: &mut D,
    output: &Path,
    mapping: &Mapping,
) -> Result<usize, SaveError> {
    let replaced = replace_in_place(document, mapping);
    log::info!(
        "Replaced {} marker occurrences using {} mapping pairs",
        replaced,
        mapping.len()
    );
    document.save(output)?;
    Ok(replaced)
}

fn replace_in_paragraph(paragraph: &mut Paragraph, mapping: &Mapping) -> usize {
    paragraph
        .runs_mut()
        .iter_mut()
        .map(|run| replace_in_run(run, mapping))
        .sum()
}

/// Pairs apply in order, each to the text left by the previous one. The
/// run's format is never touched.
fn replace_in_run(run: &mut Run, mapping: &Mapping) -> usize {
    let mut replaced = 0usize;
    for (marker, replacement) in mapping.iter() {
        if marker.is_empty() {
            continue;
        }
        let count = run.text.matches(marker).count();
        if count == 0 {
            continue;
        }
        log::debug!("Run {:?}: {:?} -> {:?} x{}", run.text, marker, replacement, count);
        run.text = run.text.replace(marker, replacement);
        replaced += count;
    }
    replaced
}
