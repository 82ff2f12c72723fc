//! Human-readable and CSV renderings of locator results.

use crate::locator::MatchRecord;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

fn flag(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "true",
        Some(false) => "false",
        None => "unset",
    }
}

/// Render the console report: every match with its paragraph and the
/// formatting of the runs it overlaps.
pub fn format_report(records: &[MatchRecord]) -> String {
    let mut out = String::new();
    if records.is_empty() {
        out.push_str("No places to fill were found.\n");
        return out;
    }
    let _ = writeln!(out, "Found {} places to fill:", records.len());
    for (idx, record) in records.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", idx + 1, record.paragraph_text);
        let _ = writeln!(out, "   Found: {} [{}]", record.matched, record.pattern_name);
        if !record.runs.is_empty() {
            out.push_str("   Formatting:\n");
            for run in &record.runs {
                let _ = writeln!(
                    out,
                    "      - {}: bold={}, italic={}, underline={}",
                    run.text,
                    flag(run.bold),
                    flag(run.italic),
                    flag(run.underline)
                );
            }
        }
        out.push('\n');
    }
    out
}

/// One CSV row per (match, overlapping run).
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    #[serde(rename = "Match")]
    match_index: usize,
    #[serde(rename = "Paragraph")]
    paragraph_index: usize,
    #[serde(rename = "Pattern")]
    pattern_name: &'a str,
    #[serde(rename = "Matched")]
    matched: &'a str,
    #[serde(rename = "Match_Start")]
    start: usize,
    #[serde(rename = "Match_End")]
    end: usize,
    #[serde(rename = "Run_Text")]
    run_text: Option<&'a str>,
    #[serde(rename = "Run_Start")]
    run_start: Option<usize>,
    #[serde(rename = "Run_End")]
    run_end: Option<usize>,
    #[serde(rename = "Bold")]
    bold: Option<bool>,
    #[serde(rename = "Italic")]
    italic: Option<bool>,
    #[serde(rename = "Underline")]
    underline: Option<bool>,
    #[serde(rename = "Paragraph_Text")]
    paragraph_text: &'a str,
}

fn report_rows(records: &[MatchRecord]) -> Vec<ReportRow<'_>> {
    let mut rows = Vec::new();
    for (idx, record) in records.iter().enumerate() {
        let base = ReportRow {
            match_index: idx + 1,
            paragraph_index: record.paragraph_index,
            pattern_name: &record.pattern_name,
            matched: &record.matched,
            start: record.start,
            end: record.end,
            run_text: None,
            run_start: None,
            run_end: None,
            bold: None,
            italic: None,
            underline: None,
            paragraph_text: &record.paragraph_text,
        };
        if record.runs.is_empty() {
            rows.push(base);
            continue;
        }
        for run in &record.runs {
            rows.push(ReportRow {
                run_text: Some(&run.text),
                run_start: Some(run.start),
                run_end: Some(run.end),
                bold: run.bold,
                italic: run.italic,
                underline: run.underline,
                ..base
            });
        }
    }
    rows
}

/// Write the report as CSV.
pub fn write_csv_report(path: &Path, records: &[MatchRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create report CSV: {}", path.display()))?;
    for row in report_rows(records) {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
