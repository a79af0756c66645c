//! ImageJ hyperstack metadata from TIFF headers.
//!
//! ImageJ writes the stack layout (`channels=`, `slices=`, `frames=`) and
//! the Z spacing into the ImageDescription tag of the first IFD, and the XY
//! calibration into XResolution/YResolution. Only the first IFD is read.

use std::io::{Read, Seek};

use tiff::decoder::Decoder;
use tiff::tags::Tag;
use tiff::TiffResult;

/// Stack layout and calibration recorded by ImageJ.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ImageJInfo {
    pub channels: Option<u32>,
    pub slices: Option<u32>,
    pub frames: Option<u32>,
    pub spacing: Option<f64>,
    pub unit: Option<String>,
    pub x_resolution: Option<f64>,
    pub y_resolution: Option<f64>,
}

impl ImageJInfo {
    /// True when the resolutions carry a physical unit rather than DPI.
    pub fn is_calibrated(&self) -> bool {
        matches!(self.unit.as_deref(), Some(unit) if unit != "pixel" && unit != "inch")
    }

    /// Physical width of a pixel, the inverse of the X resolution.
    pub fn pixel_size_x(&self) -> Option<f64> {
        self.calibrated(self.x_resolution)
    }

    /// Physical height of a pixel, the inverse of the Y resolution.
    pub fn pixel_size_y(&self) -> Option<f64> {
        self.calibrated(self.y_resolution)
    }

    pub fn pixel_size_z(&self) -> Option<f64> {
        if self.is_calibrated() {
            self.spacing
        } else {
            None
        }
    }

    fn calibrated(&self, resolution: Option<f64>) -> Option<f64> {
        match resolution {
            Some(r) if self.is_calibrated() && r > 0.0 => Some(1.0 / r),
            _ => None,
        }
    }
}

/// Reads ImageJ metadata from a TIFF stream.
///
/// Returns `Ok(None)` for TIFFs that were not written by ImageJ.
pub(crate) fn read_imagej_info<R: Read + Seek>(reader: R) -> TiffResult<Option<ImageJInfo>> {
    let mut decoder = Decoder::new(reader)?;

    let description = match decoder.find_tag(Tag::ImageDescription)? {
        Some(value) => value.into_string()?,
        None => return Ok(None),
    };
    let description = description.trim_end_matches('\0');
    if !description.starts_with("ImageJ=") {
        return Ok(None);
    }

    let mut info = ImageJInfo::default();
    parse_description(description, &mut info);
    info.x_resolution = read_resolution(&mut decoder, Tag::XResolution)?;
    info.y_resolution = read_resolution(&mut decoder, Tag::YResolution)?;

    Ok(Some(info))
}

/// A RATIONAL resolution tag as a float. Zero denominators read as unset.
fn read_resolution<R: Read + Seek>(decoder: &mut Decoder<R>, tag: Tag) -> TiffResult<Option<f64>> {
    let Some(parts) = decoder.find_tag_unsigned_vec::<u32>(tag)? else {
        return Ok(None);
    };
    Ok(match parts.as_slice() {
        [numerator, denominator, ..] if *denominator != 0 => {
            Some(f64::from(*numerator) / f64::from(*denominator))
        }
        _ => None,
    })
}

fn parse_description(description: &str, info: &mut ImageJInfo) {
    for line in description.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "channels" => info.channels = parse_count(value),
            "slices" => info.slices = parse_count(value),
            "frames" => info.frames = parse_count(value),
            "spacing" => info.spacing = value.parse().ok(),
            "unit" => info.unit = Some(unescape_unit(value)),
            _ => {}
        }
    }
}

/// Stack counts below one are treated as missing.
fn parse_count(value: &str) -> Option<u32> {
    value.parse::<u32>().ok().filter(|n| *n >= 1)
}

/// ImageJ writes "µm" as the escaped form "\u00B5m".
fn unescape_unit(unit: &str) -> String {
    unit.replace("\\u00B5", "\u{b5}")
}
