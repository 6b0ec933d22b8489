//! Crate-wide error taxonomy.

use thiserror::Error;

/// Errors surfaced by sources and the library aggregator.
///
/// Per-file extraction failures are deliberately absent: they are
/// recovered into the scan progress error list and never abort a scan.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("resource not found")]
    NotFound,

    #[error("resource already exists")]
    AlreadyExists,

    #[error("source not found: {0}")]
    SourceNotFound(String),

    #[error("scan already in progress")]
    ScanInProgress,

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to extract metadata from {path}: {source}")]
    MetadataExtraction {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("scan cancelled")]
    Cancelled,

    #[error("source does not support {0}")]
    CapabilityUnsupported(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
