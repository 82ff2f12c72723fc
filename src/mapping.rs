//! Ordered marker → replacement mappings.
//!
//! Pairs are applied in the order they were added, so a short marker listed
//! before a longer one that contains it wins. Nothing here reorders pairs.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    pairs: Vec<(String, String)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn push(&mut self, marker: impl Into<String>, replacement: impl Into<String>) {
        self.pairs.push((marker.into(), replacement.into()));
    }

    /// Append another mapping's pairs after this one's.
    pub fn extend(&mut self, other: Mapping) {
        self.pairs.extend(other.pairs);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Parse a `marker=replacement` pair, splitting at the first `=`.
pub fn parse_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((marker, replacement)) if !marker.is_empty() => {
            Ok((marker.to_string(), replacement.to_string()))
        }
        _ => Err(format!("expected MARKER=REPLACEMENT, got '{}'", s)),
    }
}

/// Load a text map (one `marker=replacement` per line). Blank lines and
/// lines starting with `#` are skipped; file order is kept.
pub fn load_text_map(path: &Path) -> Result<Mapping> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read text map: {}", path.display()))?;
    let mut mapping = Mapping::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let (marker, replacement) = parse_pair(line)
            .map_err(|e| anyhow::anyhow!("{}:{}: {}", path.display(), line_no + 1, e))?;
        mapping.push(marker, replacement);
    }
    Ok(mapping)
}

#[derive(Debug, Deserialize)]
struct MappingRow {
    marker: String,
    replacement: String,
}

/// Load a CSV map with `marker` and `replacement` columns.
pub fn load_csv_map(path: &Path) -> Result<Mapping> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV map: {}", path.display()))?;
    let mut mapping = Mapping::new();
    for (row_num, result) in reader.deserialize::<MappingRow>().enumerate() {
        let row = result.with_context(|| {
            format!("{}: bad mapping row {}", path.display(), row_num + 1)
        })?;
        if row.marker.is_empty() {
            log::warn!(
                "{}: row {} has an empty marker, skipping",
                path.display(),
                row_num + 1
            );
            continue;
        }
        mapping.push(row.marker, row.replacement);
    }
    Ok(mapping)
}
