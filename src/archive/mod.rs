//! Writing a batch to a gzip-compressed tar archive.
//!
//! The archive holds one entry per record, named after the record identity,
//! followed by a CSV manifest describing every image. [`write_archive`]
//! returns a lazy [`ArchiveWriter`]: each call to `next()` adds one image,
//! so callers can report progress or stop between images. The manifest is
//! appended and the stream finished once every record has been written.
//!
//! ```no_run
//! use std::path::Path;
//! use birka::archive::{write_archive, ArchiveOptions};
//! use birka::record::read_records_json;
//!
//! let records = read_records_json(Path::new("batch.json"))?;
//! for archived in write_archive(Path::new("batch.tar.gz"), records, ArchiveOptions::default())? {
//!     println!("archived {}", archived?.path);
//! }
//! # Ok::<(), birka::BirkaError>(())
//! ```

mod convert;
mod manifest;
mod task;

pub use convert::{convert_to_tiff, tiff_entry_name};
pub use manifest::{read_manifest_csv_slice, to_manifest_csv_bytes, ManifestRow, MANIFEST_COLUMNS};
pub use task::{ExportEvent, ExportHandle};

use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, info};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::BirkaError;
use crate::record::ImageRecord;

/// Default gzip level.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 5;

/// Default manifest entry name.
pub const DEFAULT_MANIFEST_NAME: &str = "images.csv";

/// Options for writing an archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveOptions {
    /// Re-encode every image as TIFF.
    pub convert_to_tiff: bool,
    /// Gzip level, 1 (fastest) to 9 (smallest).
    pub compression_level: u32,
    /// Name of the manifest entry.
    pub manifest_name: String,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            convert_to_tiff: false,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
        }
    }
}

impl ArchiveOptions {
    /// Checks that the compression level is in range.
    pub fn validate(&self) -> Result<(), BirkaError> {
        if (1..=9).contains(&self.compression_level) {
            Ok(())
        } else {
            Err(BirkaError::InvalidCompressionLevel(self.compression_level))
        }
    }

    /// Name of the archive entry for `record`.
    pub fn entry_name(&self, record: &ImageRecord) -> String {
        if self.convert_to_tiff {
            tiff_entry_name(&record.path)
        } else {
            record.path.clone()
        }
    }
}

type ArchiveBuilder = tar::Builder<GzEncoder<BufWriter<File>>>;

/// Lazily writes records into an archive, one per `next()`.
///
/// Yields each record once it has been added. After the last record the
/// manifest is written and the iterator ends. The first error ends the
/// iteration; whatever was written so far stays on disk.
pub struct ArchiveWriter {
    destination: PathBuf,
    options: ArchiveOptions,
    builder: Option<ArchiveBuilder>,
    records: std::vec::IntoIter<ImageRecord>,
    rows: Vec<ManifestRow>,
    total: usize,
}

/// Creates `destination` and returns a writer over `records`.
///
/// # Errors
/// Fails if the options are invalid or the destination cannot be created.
pub fn write_archive(
    destination: &Path,
    records: Vec<ImageRecord>,
    options: ArchiveOptions,
) -> Result<ArchiveWriter, BirkaError> {
    options.validate()?;

    let file = File::create(destination).map_err(|source| BirkaError::ArchiveWrite {
        path: destination.to_path_buf(),
        source,
    })?;
    let encoder = GzEncoder::new(
        BufWriter::new(file),
        Compression::new(options.compression_level),
    );

    info!(
        "Writing {} image(s) to {} (level {}{})",
        records.len(),
        destination.display(),
        options.compression_level,
        if options.convert_to_tiff { ", converting to TIFF" } else { "" }
    );

    Ok(ArchiveWriter {
        destination: destination.to_path_buf(),
        total: records.len(),
        rows: Vec::with_capacity(records.len()),
        records: records.into_iter(),
        builder: Some(tar::Builder::new(encoder)),
        options,
    })
}

impl ArchiveWriter {
    /// Number of records the writer was created with.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of records written so far.
    pub fn archived(&self) -> usize {
        self.rows.len()
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    fn write_error(&self, source: std::io::Error) -> BirkaError {
        BirkaError::ArchiveWrite {
            path: self.destination.clone(),
            source,
        }
    }

    fn finish(&self, mut builder: ArchiveBuilder) -> Result<(), BirkaError> {
        let manifest = to_manifest_csv_bytes(&self.rows)?;
        let mut header = entry_header(manifest.len() as u64);
        builder
            .append_data(&mut header, &self.options.manifest_name, manifest.as_slice())
            .map_err(|e| self.write_error(e))?;

        let encoder = builder.into_inner().map_err(|e| self.write_error(e))?;
        let mut writer = encoder.finish().map_err(|e| self.write_error(e))?;
        writer.flush().map_err(|e| self.write_error(e))?;

        info!(
            "Archive {} complete ({} image(s))",
            self.destination.display(),
            self.rows.len()
        );
        Ok(())
    }
}

impl Iterator for ArchiveWriter {
    type Item = Result<ImageRecord, BirkaError>;

    fn next(&mut self) -> Option<Self::Item> {
        let builder = self.builder.as_mut()?;

        let Some(record) = self.records.next() else {
            let builder = self.builder.take()?;
            return self.finish(builder).err().map(Err);
        };

        let entry_name = self.options.entry_name(&record);
        match append_record(builder, &record, &entry_name, self.options.convert_to_tiff) {
            Ok(()) => {
                debug!("Archived {} as {}", record.source_path().display(), entry_name);
                self.rows.push(ManifestRow::from_record(&record, entry_name));
                Some(Ok(record))
            }
            Err(err) => {
                self.builder = None;
                self.records = Vec::new().into_iter();
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.records.len();
        (0, Some(remaining + 1))
    }
}

fn append_record(
    builder: &mut ArchiveBuilder,
    record: &ImageRecord,
    entry_name: &str,
    convert: bool,
) -> Result<(), BirkaError> {
    let source = record.source_path();
    let write_error = |err| BirkaError::ArchiveWrite {
        path: source.to_path_buf(),
        source: err,
    };

    if convert {
        let bytes = convert_to_tiff(source)?;
        let mut header = entry_header(bytes.len() as u64);
        builder
            .append_data(&mut header, entry_name, bytes.as_slice())
            .map_err(write_error)
    } else {
        let mut file = File::open(source).map_err(|err| BirkaError::ArchiveSource {
            path: source.to_path_buf(),
            source: err,
        })?;
        builder.append_file(entry_name, &mut file).map_err(write_error)
    }
}

fn entry_header(size: u64) -> tar::Header {
    let mut header = tar::Header::new_gnu();
    header.set_size(size);
    header.set_mode(0o644);
    header.set_mtime(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0),
    );
    header
}
