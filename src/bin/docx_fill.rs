//! Fill blank fields in a DOCX legal template.
//!
//! Reports every place that looks like an unfilled field (underscores,
//! party clauses, registration numbers, dates, ...) together with the
//! formatting of the runs it sits in, then substitutes literal values
//! run by run so bold/italic/underline/font survive.
//!
//! Usage:
//!   docx-fill locate --template template.docx [--csv report.csv]
//!   docx-fill replace --template template.docx -o filled.docx \
//!     [--text-map map.txt] [--csv-map map.csv] [--map '___=John']...
//!   docx-fill fill --template template.docx -o filled.docx --text-map map.txt

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use docx_placeholders::locator::MatchRecord;
use docx_placeholders::mapping::{load_csv_map, load_text_map, parse_pair, Mapping};
use docx_placeholders::pipeline::{fill_template, locate_template, replace_template, FillConfig};
use docx_placeholders::report::{format_report, write_csv_report};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "docx-fill")]
#[command(about = "Locate and fill placeholders in DOCX templates, preserving run formatting")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report places to fill without writing anything
    Locate {
        /// Template DOCX file
        #[arg(short, long, env = "DOCX_FILL_TEMPLATE")]
        template: PathBuf,

        /// Also write the report as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Replace markers and save a new document
    Replace {
        /// Template DOCX file (never modified)
        #[arg(short, long, env = "DOCX_FILL_TEMPLATE")]
        template: PathBuf,

        /// Output DOCX file
        #[arg(short, long, env = "DOCX_FILL_OUTPUT")]
        output: PathBuf,

        #[command(flatten)]
        mapping: MappingArgs,
    },

    /// Report places to fill, then replace markers and save
    Fill {
        /// Template DOCX file (never modified)
        #[arg(short, long, env = "DOCX_FILL_TEMPLATE")]
        template: PathBuf,

        /// Output DOCX file
        #[arg(short, long, env = "DOCX_FILL_OUTPUT")]
        output: PathBuf,

        #[command(flatten)]
        mapping: MappingArgs,

        /// Also write the report as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

/// Where the marker → replacement pairs come from. File pairs are applied
/// first (text map, then CSV map), then `--map` pairs in command-line order.
#[derive(Args)]
struct MappingArgs {
    /// Text map file, one "marker=replacement" per line
    #[arg(long)]
    text_map: Option<PathBuf>,

    /// CSV map file with "marker" and "replacement" columns
    #[arg(long)]
    csv_map: Option<PathBuf>,

    /// Inline pair, e.g. --map '№___=№123' (repeatable)
    #[arg(short = 'm', long = "map", value_parser = parse_pair)]
    pairs: Vec<(String, String)>,
}

impl MappingArgs {
    fn build(&self) -> Result<Mapping> {
        let mut mapping = Mapping::new();
        if let Some(ref path) = self.text_map {
            let pairs = load_text_map(path)?;
            println!("Loaded {} replacement rules from {}", pairs.len(), path.display());
            mapping.extend(pairs);
        }
        if let Some(ref path) = self.csv_map {
            let pairs = load_csv_map(path)?;
            println!("Loaded {} replacement rules from {}", pairs.len(), path.display());
            mapping.extend(pairs);
        }
        mapping.extend(Mapping::from_pairs(self.pairs.iter().cloned()));
        if mapping.is_empty() {
            log::warn!("Replacement mapping is empty; the output will match the template");
        }
        Ok(mapping)
    }
}

fn print_report(records: &[MatchRecord], csv: Option<&Path>) -> Result<()> {
    print!("{}", format_report(records));
    if let Some(path) = csv {
        write_csv_report(path, records)?;
        println!("Report written to: {}", path.display());
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Locate { template, csv } => {
            let records = locate_template(&template)
                .with_context(|| format!("Failed to analyze template {}", template.display()))?;
            print_report(&records, csv.as_deref())?;
        }
        Commands::Replace {
            template,
            output,
            mapping,
        } => {
            let config = FillConfig {
                template,
                output,
                mapping: mapping.build()?,
            };
            let replaced = replace_template(&config).context("Failed to fill template")?;
            println!("Replaced {} marker occurrences", replaced);
            println!("Document saved: {}", config.output.display());
        }
        Commands::Fill {
            template,
            output,
            mapping,
            csv,
        } => {
            let config = FillConfig {
                template,
                output,
                mapping: mapping.build()?,
            };
            let mut report_result = Ok(());
            let summary = fill_template(&config, |records| {
                report_result = print_report(records, csv.as_deref());
            })
            .context("Failed to fill template")?;
            report_result?;
            println!(
                "Replaced {} marker occurrences ({} places found)",
                summary.replaced, summary.matches
            );
            println!("Document saved: {}", config.output.display());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    run(cli)
}
