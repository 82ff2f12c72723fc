//! Placeholder Locator.
//!
//! Scans every top-level paragraph against a fixed, ordered set of regular
//! expressions describing blank fields in Russian legal templates and
//! reports each match together with the formatted runs it overlaps. Table
//! content is not scanned.

use crate::model::{Paragraph, StructuredDocument};
use regex::Regex;

/// A named regular expression for one category of blank field.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub name: String,
    pub regex: Regex,
}

impl Pattern {
    pub fn new(name: impl Into<String>, regex: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            regex: Regex::new(regex)?,
        })
    }
}

/// An ordered list of patterns. Order decides match order within a
/// paragraph.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

/// Category names and expressions of the standard set, in scan order.
const STANDARD_PATTERNS: &[(&str, &str)] = &[
    ("underscores", r#"[«"]?_+[»"]?"#),
    (
        "party_name",
        r#"именуем\w{1,3}\s+(?:в\s+дальнейшем\s+)?[«"]([^»"]+)[»"]"#,
    ),
    ("representative", r"лице\s+([^,]+),"),
    ("authority_basis", r"основании\s+([^,\.]+)"),
    ("address", r"местонахожден\w+:\s*([^,\.]+)"),
    ("registration_id", r"(?:ОГРН|ИНН|КПП)\s*:?\s*(\d*_*\d*)"),
    (
        "document_reference",
        r#"№\s*[\d_]*\s*от\s*[«"]?[\d\._]*[»"]?"#,
    ),
    (
        "defined_term",
        r#"[«"]([^»"]+)[»"]\s*\(далее\s*[-—]\s*[^)]+\)"#,
    ),
    ("amount", r"стоимост\w+\s+[\d\s_,]+\s*(?:руб\.|₽)?"),
    ("date", r"\d{2}[\.]\d{2}[\.]\d{4}"),
];

lazy_static::lazy_static! {
    static ref STANDARD: PatternSet = PatternSet {
        patterns: STANDARD_PATTERNS
            .iter()
            .map(|(name, re)| Pattern::new(*name, re).unwrap())
            .collect(),
    };
}

impl PatternSet {
    pub fn new(patterns: Vec<Pattern>) -> Self {
        Self { patterns }
    }

    /// The built-in set used by [`locate`].
    pub fn standard() -> &'static PatternSet {
        &STANDARD
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }
}

/// Whole-run formatting of a run overlapping a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSnapshot {
    pub text: String,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    /// Character offsets of the run within the paragraph text.
    pub start: usize,
    pub end: usize,
}

/// One pattern match in one paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub paragraph_index: usize,
    pub pattern_index: usize,
    pub pattern_name: String,
    /// Source of the regular expression that matched.
    pub pattern: String,
    pub matched: String,
    /// Paragraph text at the time of the scan.
    pub paragraph_text: String,
    /// Character offsets of the match within `paragraph_text`.
    pub start: usize,
    pub end: usize,
    pub runs: Vec<RunSnapshot>,
}

/// Locate placeholders with the standard pattern set.
pub fn locate<D: StructuredDocument + ?Sized>(document: &D) -> Vec<MatchRecord> {
    locate_with(document, PatternSet::standard())
}

/// Locate placeholders in top-level paragraphs.
///
/// Results are ordered by paragraph, then pattern, then match position.
/// Different patterns may match overlapping text; every match is kept.
pub fn locate_with<D: StructuredDocument + ?Sized>(
    document: &D,
    patterns: &PatternSet,
) -> Vec<MatchRecord> {
    let mut records = Vec::new();
    for (paragraph_index, paragraph) in document.paragraphs().iter().enumerate() {
        scan_paragraph(paragraph_index, paragraph, patterns, &mut records);
    }
    log::info!(
        "Located {} placeholder matches in {} paragraphs",
        records.len(),
        document.paragraphs().len()
    );
    records
}

fn scan_paragraph(
    paragraph_index: usize,
    paragraph: &Paragraph,
    patterns: &PatternSet,
    records: &mut Vec<MatchRecord>,
) {
    let text = paragraph.text();
    if text.is_empty() {
        return;
    }
    let offsets = paragraph.run_offsets();

    for (pattern_index, pattern) in patterns.patterns().iter().enumerate() {
        for m in pattern.regex.find_iter(&text) {
            // Regex offsets are bytes; runs are measured in characters.
            let start = text[..m.start()].chars().count();
            let end = start + m.as_str().chars().count();

            let runs: Vec<RunSnapshot> = paragraph
                .runs()
                .iter()
                .zip(offsets.iter())
                .filter(|(_, span)| span.1 > start && span.0 < end)
                .map(|(run, &(run_start, run_end))| RunSnapshot {
                    text: run.text.clone(),
                    bold: run.format.bold,
                    italic: run.format.italic,
                    underline: run.format.underline,
                    start: run_start,
                    end: run_end,
                })
                .collect();

            log::debug!(
                "Paragraph {}: {} matched {:?} at {}..{} ({} runs)",
                paragraph_index,
                pattern.name,
                m.as_str(),
                start,
                end,
                runs.len()
            );

            records.push(MatchRecord {
                paragraph_index,
                pattern_index,
                pattern_name: pattern.name.clone(),
                pattern: pattern.regex.as_str().to_string(),
                matched: m.as_str().to_string(),
                paragraph_text: text.clone(),
                start,
                end,
                runs,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cell, MemoryDocument, Row, Run, RunFormat, Table};

    fn bold() -> RunFormat {
        RunFormat {
            bold: Some(true),
            ..Default::default()
        }
    }

    fn single(text: &str) -> MemoryDocument {
        MemoryDocument::new().with_paragraph(vec![Run::new(text)])
    }

    fn matches_of(doc: &MemoryDocument, name: &str) -> Vec<String> {
        locate(doc)
            .into_iter()
            .filter(|r| r.pattern_name == name)
            .map(|r| r.matched)
            .collect()
    }

    #[test]
    fn test_standard_set_order() {
        let names: Vec<&str> = PatternSet::standard()
            .patterns()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "underscores",
                "party_name",
                "representative",
                "authority_basis",
                "address",
                "registration_id",
                "document_reference",
                "defined_term",
                "amount",
                "date",
            ]
        );
    }

    #[test]
    fn test_underscores_with_quotes() {
        let doc = single("Договор № ___ от «__» ______ 2024 г.");
        assert_eq!(matches_of(&doc, "underscores"), vec!["___", "«__»", "______"]);
        assert_eq!(matches_of(&doc, "document_reference"), vec!["№ ___ от «__»"]);
    }

    #[test]
    fn test_party_and_authority_clauses() {
        let doc = single(
            "ООО «Ромашка», именуемое в дальнейшем «Заказчик», в лице директора Иванова И.И., \
             действующего на основании Устава, с одной стороны",
        );
        assert_eq!(
            matches_of(&doc, "party_name"),
            vec!["именуемое в дальнейшем «Заказчик»"]
        );
        assert_eq!(
            matches_of(&doc, "representative"),
            vec!["лице директора Иванова И.И.,"]
        );
        assert_eq!(matches_of(&doc, "authority_basis"), vec!["основании Устава"]);
    }

    #[test]
    fn test_address_stops_at_punctuation() {
        let doc = single("Адрес местонахождения: Москва, ул. Ленина");
        assert_eq!(matches_of(&doc, "address"), vec!["местонахождения: Москва"]);
    }

    #[test]
    fn test_partially_blank_registration_id() {
        let doc = single("ИНН: ____");
        assert_eq!(matches_of(&doc, "registration_id"), vec!["ИНН: ____"]);

        let doc = single("ОГРН 1027700132195, КПП 77__");
        assert_eq!(
            matches_of(&doc, "registration_id"),
            vec!["ОГРН 1027700132195", "КПП 77__"]
        );
    }

    #[test]
    fn test_defined_term_amount_and_date() {
        let doc = single(
            "«Соглашение» (далее — Договор) стоимостью 100 000,00 руб. от 01.02.2024",
        );
        assert_eq!(
            matches_of(&doc, "defined_term"),
            vec!["«Соглашение» (далее — Договор)"]
        );
        assert_eq!(matches_of(&doc, "amount"), vec!["стоимостью 100 000,00 руб."]);
        assert_eq!(matches_of(&doc, "date"), vec!["01.02.2024"]);
    }

    #[test]
    fn test_matches_ordered_by_pattern_then_position() {
        let doc = single("Дата __.__.____ и 01.02.2024, ИНН: ____");
        let records = locate(&doc);
        let found: Vec<(&str, &str)> = records
            .iter()
            .map(|r| (r.pattern_name.as_str(), r.matched.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("underscores", "__"),
                ("underscores", "__"),
                ("underscores", "____"),
                ("underscores", "____"),
                ("registration_id", "ИНН: ____"),
                ("date", "01.02.2024"),
            ]
        );
        for pair in records.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(
                (a.paragraph_index, a.pattern_index, a.start)
                    < (b.paragraph_index, b.pattern_index, b.start)
            );
        }
    }

    #[test]
    fn test_paragraph_order_comes_first() {
        let doc = MemoryDocument::new()
            .with_paragraph(vec![Run::new("01.01.2024")])
            .with_paragraph(vec![Run::new("___")]);
        let records = locate(&doc);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].paragraph_index, 0);
        assert_eq!(records[0].pattern_name, "date");
        assert_eq!(records[1].paragraph_index, 1);
        assert_eq!(records[1].pattern_name, "underscores");
    }

    #[test]
    fn test_overlapping_runs_in_char_offsets() {
        let doc = MemoryDocument::new().with_paragraph(vec![
            Run::new("ИНН: "),
            Run::with_format("____", bold()),
            Run::new(" от "),
        ]);
        let records = locate(&doc);
        let reg = records
            .iter()
            .find(|r| r.pattern_name == "registration_id")
            .unwrap();
        assert_eq!((reg.start, reg.end), (0, 9));
        assert_eq!(reg.paragraph_text, "ИНН: ____ от ");
        assert_eq!(
            reg.runs,
            vec![
                RunSnapshot {
                    text: "ИНН: ".to_string(),
                    bold: None,
                    italic: None,
                    underline: None,
                    start: 0,
                    end: 5,
                },
                RunSnapshot {
                    text: "____".to_string(),
                    bold: Some(true),
                    italic: None,
                    underline: None,
                    start: 5,
                    end: 9,
                },
            ]
        );

        let underscores = records
            .iter()
            .find(|r| r.pattern_name == "underscores")
            .unwrap();
        assert_eq!(underscores.runs.len(), 1);
        assert_eq!(underscores.runs[0].bold, Some(true));
    }

    #[test]
    fn test_runs_cover_match_span() {
        let doc = MemoryDocument::new().with_paragraph(vec![
            Run::new("в ли"),
            Run::new("це Петрова"),
            Run::with_format(" П.П.", bold()),
            Run::new(", действующего"),
        ]);
        for record in locate(&doc) {
            let first = record.runs.first().unwrap();
            let last = record.runs.last().unwrap();
            assert!(first.start <= record.start, "{:?}", record);
            assert!(last.end >= record.end, "{:?}", record);
            for pair in record.runs.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
            }
        }
    }

    #[test]
    fn test_tables_are_not_scanned() {
        let table = Table::new(vec![Row::new(vec![Cell::new(vec![
            crate::model::Paragraph::new(vec![Run::new("ИНН: ____")]),
        ])])]);
        let doc = MemoryDocument::new().with_table(table);
        assert!(locate(&doc).is_empty());
    }

    #[test]
    fn test_empty_document() {
        assert!(locate(&MemoryDocument::new()).is_empty());
    }

    #[test]
    fn test_custom_pattern_set() {
        let set = PatternSet::new(vec![Pattern::new("digits", r"\d+").unwrap()]);
        let doc = single("a 12 b 345");
        let records = locate_with(&doc, &set);
        let found: Vec<&str> = records.iter().map(|r| r.matched.as_str()).collect();
        assert_eq!(found, vec!["12", "345"]);
        assert_eq!(records[1].pattern, r"\d+");
        assert_eq!((records[1].start, records[1].end), (7, 10));
    }
}
