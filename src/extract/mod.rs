//! Building image records from files on disk.
//!
//! Record construction sits outside the consensus core: a front end hands
//! dropped files or directories to [`load_records`], which walks them and
//! asks a [`MetadataExtractor`] for one [`ImageRecord`] per supported file.
//!
//! The default [`HeaderExtractor`] only reads file headers. Geometry comes
//! from `imagesize`, the sample layout from the `image` decoder, and TIFFs
//! written by ImageJ additionally contribute their hyperstack layout and
//! calibration.

mod imagej;

use image::{ColorType, ImageDecoder, ImageFormat, ImageReader};
use log::{debug, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::error::BirkaError;
use crate::record::ImageRecord;

/// Turns one image file into an [`ImageRecord`].
pub trait MetadataExtractor {
    /// Cheap check: true if `path` looks like a file this extractor reads.
    fn can_extract(&self, path: &Path) -> bool;

    /// Reads the metadata of `path`. The record identity is the path of the
    /// file relative to `base`, with `/` separators.
    fn extract(&self, path: &Path, base: &Path) -> Result<ImageRecord, BirkaError>;
}

/// Header-only extractor for the raster formats the `image` crate decodes.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeaderExtractor;

impl MetadataExtractor for HeaderExtractor {
    fn can_extract(&self, path: &Path) -> bool {
        path.is_file() && imagesize::size(path).is_ok()
    }

    fn extract(&self, path: &Path, base: &Path) -> Result<ImageRecord, BirkaError> {
        let (width, height) = read_image_dimensions(path)?;
        let (format, dtype, samples) = read_sample_layout(path)?;

        let mut record = ImageRecord::new(record_identity(path, base), width, height)
            .with_source(path)
            .with_dtype(dtype)
            .with_channels(samples);

        let imagej = if format == Some(ImageFormat::Tiff) {
            read_imagej(path)?
        } else {
            None
        };
        if let Some(info) = imagej {
            if let Some(channels) = info.channels {
                record.n_channels = channels;
            }
            if let Some(slices) = info.slices {
                record.size_z_px = slices;
            }
            if let Some(frames) = info.frames {
                record.n_timepoints = frames;
            }
            record.pixel_size_x = info.pixel_size_x();
            record.pixel_size_y = info.pixel_size_y();
            record.pixel_size_z = info.pixel_size_z();
        }

        record.channel_names = default_channel_names(record.n_channels);
        Ok(record)
    }
}

/// A file that could not be turned into a record.
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: BirkaError,
}

/// Records loaded from a file or directory, plus the files that failed.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub records: Vec<ImageRecord>,
    pub failures: Vec<LoadFailure>,
}

/// Loads records from a file or, recursively, from a directory.
///
/// Identities are relative to the parent of `path`, so dropping
/// `/data/plate1` yields identities like `plate1/a1.tif`. Directory entries
/// are visited in file-name order; unsupported files are skipped and
/// failing files are collected in [`LoadOutcome::failures`] without
/// stopping the walk.
///
/// # Errors
/// A single file that is unsupported or fails to extract is an error.
pub fn load_records(
    path: &Path,
    extractor: &dyn MetadataExtractor,
) -> Result<LoadOutcome, BirkaError> {
    let base = path.parent().unwrap_or_else(|| Path::new(""));

    if !path.is_dir() {
        if !extractor.can_extract(path) {
            return Err(BirkaError::UnsupportedFormat(path.display().to_string()));
        }
        let record = extractor.extract(path, base)?;
        return Ok(LoadOutcome {
            records: vec![record],
            failures: Vec::new(),
        });
    }

    let mut outcome = LoadOutcome::default();

    for entry in WalkDir::new(path).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let failed = err.path().unwrap_or(path).to_path_buf();
                warn!("Skipping {}: {}", failed.display(), err);
                outcome.failures.push(LoadFailure {
                    error: BirkaError::MetadataExtraction {
                        path: failed.clone(),
                        message: format!("failed while traversing directory: {err}"),
                    },
                    path: failed,
                });
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        if !extractor.can_extract(entry.path()) {
            debug!("Skipping unsupported file {}", entry.path().display());
            continue;
        }

        match extractor.extract(entry.path(), base) {
            Ok(record) => outcome.records.push(record),
            Err(error) => {
                warn!("Failed to load {}: {}", entry.path().display(), error);
                outcome.failures.push(LoadFailure {
                    path: entry.path().to_path_buf(),
                    error,
                });
            }
        }
    }

    debug!(
        "Loaded {} record(s) from {} ({} failure(s))",
        outcome.records.len(),
        path.display(),
        outcome.failures.len()
    );
    Ok(outcome)
}

/// True if `path` is a directory or a file the extractor supports.
pub fn can_load(path: &Path, extractor: &dyn MetadataExtractor) -> bool {
    path.is_dir() || extractor.can_extract(path)
}

/// `path` relative to `base`, joined with `/`.
pub fn record_identity(path: &Path, base: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Channel names used when a file carries none.
pub fn default_channel_names(n_channels: u32) -> Vec<String> {
    (0..n_channels).map(|i| format!("Channel:0:{i}")).collect()
}

/// Fuzz-only entrypoint for the ImageJ TIFF metadata reader.
#[cfg(feature = "fuzzing")]
pub fn fuzz_read_imagej_header(bytes: &[u8]) {
    let _ = imagej::read_imagej_info(std::io::Cursor::new(bytes));
}

fn read_image_dimensions(path: &Path) -> Result<(u32, u32), BirkaError> {
    let size = imagesize::size(path).map_err(|source| BirkaError::ImageHeader {
        path: path.to_path_buf(),
        source,
    })?;

    let width: u32 = size
        .width
        .try_into()
        .map_err(|_| BirkaError::MetadataExtraction {
            path: path.to_path_buf(),
            message: format!("image width {} does not fit in u32", size.width),
        })?;

    let height: u32 = size
        .height
        .try_into()
        .map_err(|_| BirkaError::MetadataExtraction {
            path: path.to_path_buf(),
            message: format!("image height {} does not fit in u32", size.height),
        })?;

    Ok((width, height))
}

fn read_sample_layout(path: &Path) -> Result<(Option<ImageFormat>, &'static str, u32), BirkaError> {
    let failed = |message: String| BirkaError::MetadataExtraction {
        path: path.to_path_buf(),
        message,
    };

    let reader = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|err| failed(err.to_string()))?;
    let format = reader.format();
    let decoder = reader
        .into_decoder()
        .map_err(|err| failed(err.to_string()))?;

    let color = decoder.color_type();
    Ok((format, dtype_of(color), u32::from(color.channel_count())))
}

fn dtype_of(color: ColorType) -> &'static str {
    match color {
        ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16 => "uint16",
        ColorType::Rgb32F | ColorType::Rgba32F => "float32",
        _ => "uint8",
    }
}

fn read_imagej(path: &Path) -> Result<Option<imagej::ImageJInfo>, BirkaError> {
    let file = File::open(path).map_err(|err| BirkaError::MetadataExtraction {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    imagej::read_imagej_info(BufReader::new(file)).map_err(|err| {
        BirkaError::MetadataExtraction {
            path: path.to_path_buf(),
            message: format!("malformed TIFF header: {err}"),
        }
    })
}
