use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationReport;

/// The main error type for birka operations.
#[derive(Debug, Error)]
pub enum BirkaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse record JSON from {path}: {source}")]
    RecordsJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write record JSON to {path}: {source}")]
    RecordsJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Index {index} out of range for collection of {len} record(s)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid filter pattern '{pattern}': {source}")]
    InvalidFilterPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to extract metadata from {path}: {message}")]
    MetadataExtraction { path: PathBuf, message: String },

    #[error("Failed to read image header of {path}: {source}")]
    ImageHeader {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("Failed to convert {path} to TIFF: {source}")]
    Conversion {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to read {path} for archiving: {source}")]
    ArchiveSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write archive {path}: {source}")]
    ArchiveWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write manifest: {source}")]
    ManifestWrite {
        #[source]
        source: csv::Error,
    },

    #[error("Failed to parse manifest: {source}")]
    ManifestParse {
        #[source]
        source: csv::Error,
    },

    #[error("Invalid compression level {0} (expected 1..=9)")]
    InvalidCompressionLevel(u32),

    #[error("Export failed: {0}")]
    ExportFailed(String),

    #[error("An export is already running")]
    ExportInProgress,

    #[error("Batch of {record_count} record(s) is not eligible for export ({duplicate_count} duplicate path(s))")]
    NotExportEligible {
        record_count: usize,
        duplicate_count: usize,
    },

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}
