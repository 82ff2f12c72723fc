//! DOCX placeholder tools
//!
//! Finds unfilled fields in Russian legal/administrative templates and fills
//! them with literal values while keeping each run's formatting.
//!
//! This library provides:
//! - `model`: paragraphs, runs and tables, and the `StructuredDocument` trait
//! - `docx`: the DOCX package backend
//! - `locator`: regex scan of top-level paragraphs for blank fields
//! - `replacer`: run-local literal substitution
//! - `mapping`, `report`, `pipeline`: configuration, output and end-to-end runs
//!
//! Binaries:
//! - `docx-fill`: locate / replace / fill from the command line

pub mod docx;
pub mod error;
pub mod locator;
pub mod mapping;
pub mod model;
pub mod pipeline;
pub mod replacer;
pub mod report;

pub use docx::DocxDocument;
pub use error::{DocumentOpenError, FillError, SaveError};
pub use locator::{locate, MatchRecord};
pub use mapping::Mapping;
pub use model::{MemoryDocument, StructuredDocument};
pub use replacer::replace;
