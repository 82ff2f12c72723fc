//! Error kinds for opening and saving documents.
//!
//! Locating and replacing never fail; only the two ends of a run touch
//! the filesystem.

use std::path::PathBuf;

/// The template could not be opened as a structured document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentOpenError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a DOCX package: {source}", path.display())]
    Package {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("{} has no word/document.xml part", path.display())]
    MissingDocumentPart { path: PathBuf },

    #[error("word/document.xml in {} is not valid UTF-8", path.display())]
    Encoding { path: PathBuf },

    #[error("malformed WordprocessingML in {}: {reason}", path.display())]
    Markup { path: PathBuf, reason: String },
}

/// The filled document could not be written.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build DOCX package {}: {source}", path.display())]
    Package {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

/// Failure of a complete open → fill → save run.
#[derive(Debug, thiserror::Error)]
pub enum FillError {
    #[error(transparent)]
    Open(#[from] DocumentOpenError),

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error("output path {} is the template itself; the template is never overwritten", .0.display())]
    OutputIsTemplate(PathBuf),
}
