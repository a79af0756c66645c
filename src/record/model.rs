//! The image record value type.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::calibration::format_pixel_size;

/// Sample type assumed when nothing else is known.
pub const DEFAULT_DTYPE: &str = "uint16";

/// Axis order used to interpret the geometry fields.
pub const DEFAULT_DIMENSION_ORDER: &str = "TCZYX";

/// Metadata describing one image of a batch.
///
/// `path` is the record's identity. It is usually the archive-relative POSIX
/// path of the image; the file itself is read from [`source`](Self::source)
/// when that is set. Uniqueness of `path` is a property of the whole batch
/// and is checked by validation, not on construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Identity of the record (archive-relative path).
    pub path: String,

    /// On-disk location of the image, if different from `path`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,

    /// Sample type tag (e.g. "uint8", "uint16", "float32").
    pub dtype: String,

    /// Number of scenes in the file. Informational only.
    pub n_scenes: u32,

    /// Number of timepoints.
    pub n_timepoints: u32,

    /// Number of channels.
    pub n_channels: u32,

    /// Depth in pixels.
    pub size_z_px: u32,

    /// Height in pixels.
    pub size_y_px: u32,

    /// Width in pixels.
    pub size_x_px: u32,

    /// Axis order (e.g. "TCZYX").
    pub dimension_order: String,

    /// Physical pixel size along X, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_size_x: Option<f64>,

    /// Physical pixel size along Y, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_size_y: Option<f64>,

    /// Physical pixel size along Z, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_size_z: Option<f64>,

    /// Channel names in channel order.
    #[serde(default)]
    pub channel_names: Vec<String>,
}

impl ImageRecord {
    /// Creates a single-plane, single-channel record with baseline metadata.
    pub fn new(path: impl Into<String>, size_x_px: u32, size_y_px: u32) -> Self {
        Self {
            path: path.into(),
            source: None,
            dtype: DEFAULT_DTYPE.to_string(),
            n_scenes: 1,
            n_timepoints: 1,
            n_channels: 1,
            size_z_px: 1,
            size_y_px,
            size_x_px,
            dimension_order: DEFAULT_DIMENSION_ORDER.to_string(),
            pixel_size_x: None,
            pixel_size_y: None,
            pixel_size_z: None,
            channel_names: Vec::new(),
        }
    }

    /// Sets the on-disk location of the image.
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the sample type.
    pub fn with_dtype(mut self, dtype: impl Into<String>) -> Self {
        self.dtype = dtype.into();
        self
    }

    /// Sets the number of scenes.
    pub fn with_scenes(mut self, n_scenes: u32) -> Self {
        self.n_scenes = n_scenes;
        self
    }

    /// Sets the number of timepoints.
    pub fn with_timepoints(mut self, n_timepoints: u32) -> Self {
        self.n_timepoints = n_timepoints;
        self
    }

    /// Sets the number of channels.
    pub fn with_channels(mut self, n_channels: u32) -> Self {
        self.n_channels = n_channels;
        self
    }

    /// Sets the channel names. The channel count is left untouched.
    pub fn with_channel_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channel_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the depth in pixels.
    pub fn with_depth(mut self, size_z_px: u32) -> Self {
        self.size_z_px = size_z_px;
        self
    }

    /// Sets the axis order.
    pub fn with_dimension_order(mut self, order: impl Into<String>) -> Self {
        self.dimension_order = order.into();
        self
    }

    pub fn with_pixel_size_x(mut self, size: f64) -> Self {
        self.pixel_size_x = Some(size);
        self
    }

    pub fn with_pixel_size_y(mut self, size: f64) -> Self {
        self.pixel_size_y = Some(size);
        self
    }

    pub fn with_pixel_size_z(mut self, size: f64) -> Self {
        self.pixel_size_z = Some(size);
        self
    }

    /// Returns where the image file lives on disk.
    pub fn source_path(&self) -> &Path {
        match &self.source {
            Some(source) => source.as_path(),
            None => Path::new(&self.path),
        }
    }

    /// True if the image has more than one timepoint.
    pub fn is_timeseries(&self) -> bool {
        self.n_timepoints > 1
    }

    /// True if the image has more than one Z plane.
    pub fn is_zstack(&self) -> bool {
        self.size_z_px > 1
    }

    pub fn pixel_size_x_str(&self) -> Option<String> {
        format_pixel_size(self.pixel_size_x)
    }

    pub fn pixel_size_y_str(&self) -> Option<String> {
        format_pixel_size(self.pixel_size_y)
    }

    pub fn pixel_size_z_str(&self) -> Option<String> {
        format_pixel_size(self.pixel_size_z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_record() {
        let record = ImageRecord::new("a.tif", 640, 480);

        assert_eq!(record.dtype, "uint16");
        assert_eq!(record.dimension_order, "TCZYX");
        assert_eq!(record.n_channels, 1);
        assert!(!record.is_timeseries());
        assert!(!record.is_zstack());
        assert_eq!(record.pixel_size_x_str(), None);
        assert!(record.channel_names.is_empty());
    }

    #[test]
    fn test_derived_flags() {
        let record = ImageRecord::new("a.tif", 64, 64)
            .with_timepoints(5)
            .with_depth(3);

        assert!(record.is_timeseries());
        assert!(record.is_zstack());
    }

    #[test]
    fn test_source_path_falls_back_to_identity() {
        let plain = ImageRecord::new("dir/a.tif", 1, 1);
        assert_eq!(plain.source_path(), Path::new("dir/a.tif"));

        let sourced = ImageRecord::new("a.tif", 1, 1).with_source("/data/dir/a.tif");
        assert_eq!(sourced.source_path(), Path::new("/data/dir/a.tif"));
    }

    #[test]
    fn test_channel_names_builder_keeps_count() {
        let record = ImageRecord::new("a.tif", 1, 1)
            .with_channels(2)
            .with_channel_names(["DAPI"]);

        assert_eq!(record.n_channels, 2);
        assert_eq!(record.channel_names, vec!["DAPI".to_string()]);
    }
}
