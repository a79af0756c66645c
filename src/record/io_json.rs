//! JSON serialization for record lists.
//!
//! A record list is a top-level JSON array of [`ImageRecord`] objects. This
//! is useful for:
//! - Feeding pre-extracted metadata to the CLI (`--format json`)
//! - Inspecting what the extractor produced
//! - Tests and fuzzing without any image files on disk

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use super::model::ImageRecord;
use crate::error::BirkaError;

/// Reads a record list from a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn read_records_json(path: &Path) -> Result<Vec<ImageRecord>, BirkaError> {
    let file = File::open(path).map_err(BirkaError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| BirkaError::RecordsJsonParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes a record list to a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_records_json(path: &Path, records: &[ImageRecord]) -> Result<(), BirkaError> {
    let file = File::create(path).map_err(BirkaError::Io)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, records).map_err(|source| BirkaError::RecordsJsonWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a record list from a JSON string.
pub fn from_json_str(json: &str) -> Result<Vec<ImageRecord>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Reads a record list from raw JSON bytes.
///
/// Useful for fuzzing without requiring UTF-8 upfront.
pub fn from_json_slice(bytes: &[u8]) -> Result<Vec<ImageRecord>, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Writes a record list to a pretty-printed JSON string.
pub fn to_json_string(records: &[ImageRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(records)
}
