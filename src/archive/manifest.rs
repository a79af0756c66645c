//! The `images.csv` manifest stored alongside the archived images.

use serde::{Deserialize, Serialize};

use crate::error::BirkaError;
use crate::record::ImageRecord;

/// Manifest columns, in file order.
pub const MANIFEST_COLUMNS: [&str; 13] = [
    "image",
    "dtype",
    "n_scenes",
    "n_timepoints",
    "n_channels",
    "size_z_px",
    "size_y_px",
    "size_x_px",
    "dimension_order",
    "pixel_size_x",
    "pixel_size_y",
    "pixel_size_z",
    "channel_names",
];

/// A single manifest row. Unknown pixel sizes are empty cells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ManifestRow {
    /// Name of the image entry inside the archive.
    pub image: String,
    pub dtype: String,
    pub n_scenes: u32,
    pub n_timepoints: u32,
    pub n_channels: u32,
    pub size_z_px: u32,
    pub size_y_px: u32,
    pub size_x_px: u32,
    pub dimension_order: String,
    pub pixel_size_x: Option<f64>,
    pub pixel_size_y: Option<f64>,
    pub pixel_size_z: Option<f64>,
    /// Channel names joined with `,`.
    pub channel_names: String,
}

impl ManifestRow {
    /// Describes `record`, archived under `image`.
    pub fn from_record(record: &ImageRecord, image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            dtype: record.dtype.clone(),
            n_scenes: record.n_scenes,
            n_timepoints: record.n_timepoints,
            n_channels: record.n_channels,
            size_z_px: record.size_z_px,
            size_y_px: record.size_y_px,
            size_x_px: record.size_x_px,
            dimension_order: record.dimension_order.clone(),
            pixel_size_x: record.pixel_size_x,
            pixel_size_y: record.pixel_size_y,
            pixel_size_z: record.pixel_size_z,
            channel_names: record.channel_names.join(","),
        }
    }

    /// Splits the joined channel names back into a list.
    pub fn channel_names(&self) -> Vec<String> {
        if self.channel_names.is_empty() {
            return Vec::new();
        }
        self.channel_names.split(',').map(str::to_string).collect()
    }
}

/// Serializes manifest rows to CSV bytes. The header is written even when
/// there are no rows.
pub fn to_manifest_csv_bytes(rows: &[ManifestRow]) -> Result<Vec<u8>, BirkaError> {
    let mut csv_writer = csv::Writer::from_writer(Vec::new());

    if rows.is_empty() {
        csv_writer
            .write_record(MANIFEST_COLUMNS)
            .map_err(|source| BirkaError::ManifestWrite { source })?;
    }
    for row in rows {
        csv_writer
            .serialize(row)
            .map_err(|source| BirkaError::ManifestWrite { source })?;
    }

    csv_writer
        .into_inner()
        .map_err(|e| BirkaError::Io(e.into_error()))
}

/// Reads manifest rows from CSV bytes.
pub fn read_manifest_csv_slice(bytes: &[u8]) -> Result<Vec<ManifestRow>, BirkaError> {
    let mut csv_reader = csv::Reader::from_reader(bytes);
    let mut rows = Vec::new();

    for result in csv_reader.deserialize() {
        let row: ManifestRow = result.map_err(|source| BirkaError::ManifestParse { source })?;
        rows.push(row);
    }

    Ok(rows)
}
