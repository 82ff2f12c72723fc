//! Pipeline functions for programmatic use by the CLI and tests.
//!
//! Each function opens the template read-only, does its work in memory and
//! writes at most one new file.

use crate::docx::DocxDocument;
use crate::error::{DocumentOpenError, FillError};
use crate::locator::{locate, MatchRecord};
use crate::mapping::Mapping;
use crate::replacer::replace;
use std::path::{Path, PathBuf};

/// Everything a fill run needs: where to read, where to write, and what
/// to substitute.
#[derive(Debug, Clone)]
pub struct FillConfig {
    /// Template DOCX, never modified
    pub template: PathBuf,
    /// Output DOCX
    pub output: PathBuf,
    /// Ordered marker → replacement pairs
    pub mapping: Mapping,
}

/// Summary of a fill run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillSummary {
    /// Placeholder matches reported by the locator
    pub matches: usize,
    /// Marker occurrences replaced
    pub replaced: usize,
}

/// Open a template and locate its placeholders.
pub fn locate_template(template: &Path) -> Result<Vec<MatchRecord>, DocumentOpenError> {
    let document = DocxDocument::open(template)?;
    Ok(locate(&document))
}

/// Open the template, replace markers and save the output.
pub fn replace_template(config: &FillConfig) -> Result<usize, FillError> {
    check_output(config)?;
    let mut document = DocxDocument::open(&config.template)?;
    Ok(replace(&mut document, &config.output, &config.mapping)?)
}

/// Locate placeholders, hand them to `on_located`, then replace and save.
///
/// The callback runs before anything is written, so a report is available
/// even when the save fails.
pub fn fill_template(
    config: &FillConfig,
    mut on_located: impl FnMut(&[MatchRecord]),
) -> Result<FillSummary, FillError> {
    check_output(config)?;
    let mut document = DocxDocument::open(&config.template)?;
    let records = locate(&document);
    on_located(&records);
    let replaced = replace(&mut document, &config.output, &config.mapping)?;
    Ok(FillSummary {
        matches: records.len(),
        replaced,
    })
}

fn check_output(config: &FillConfig) -> Result<(), FillError> {
    let same = match (
        std::fs::canonicalize(&config.template),
        std::fs::canonicalize(&config.output),
    ) {
        (Ok(template), Ok(output)) => template == output,
        _ => config.template == config.output,
    };
    if same {
        return Err(FillError::OutputIsTemplate(config.output.clone()));
    }
    Ok(())
}
