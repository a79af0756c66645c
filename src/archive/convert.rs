//! Re-encoding archived images as TIFF.

use image::ImageFormat;
use std::io::Cursor;
use std::path::Path;

use crate::error::BirkaError;

/// Decodes `source` and re-encodes it as an in-memory TIFF.
///
/// Only the first image of multi-page files is kept.
pub fn convert_to_tiff(source: &Path) -> Result<Vec<u8>, BirkaError> {
    let conversion_error = |err| BirkaError::Conversion {
        path: source.to_path_buf(),
        source: err,
    };

    let decoded = image::open(source).map_err(conversion_error)?;
    let mut encoded = Cursor::new(Vec::new());
    decoded
        .write_to(&mut encoded, ImageFormat::Tiff)
        .map_err(conversion_error)?;

    Ok(encoded.into_inner())
}

/// The archive entry name for a converted image: `identity` with its
/// extension replaced by `.tiff`.
pub fn tiff_entry_name(identity: &str) -> String {
    let file_start = identity.rfind('/').map_or(0, |i| i + 1);
    match identity[file_start..].rfind('.') {
        Some(dot) if dot > 0 => format!("{}.tiff", &identity[..file_start + dot]),
        _ => format!("{identity}.tiff"),
    }
}
