//! Image metadata records.
//!
//! An [`ImageRecord`] carries everything birka knows about one image: its
//! identity path, pixel geometry, sample type, channel layout and optional
//! physical calibration. Records are plain values; they are produced by the
//! [`extract`](crate::extract) step or read from a record-list JSON file and
//! consumed by the consensus, validation and archive stages.
//!
//! # Example
//!
//! ```
//! use birka::record::ImageRecord;
//!
//! let record = ImageRecord::new("plate1/well_a1.tif", 512, 512)
//!     .with_dtype("uint8")
//!     .with_depth(12)
//!     .with_pixel_size_x(0.325);
//!
//! assert!(record.is_zstack());
//! assert!(!record.is_timeseries());
//! assert_eq!(record.pixel_size_x_str().as_deref(), Some("0.325000"));
//! ```

mod calibration;
pub mod io_json;
mod model;

pub use calibration::{format_pixel_size, PIXEL_SIZE_DIGITS};
pub use io_json::{
    from_json_slice, from_json_str, read_records_json, to_json_string, write_records_json,
};
pub use model::{ImageRecord, DEFAULT_DIMENSION_ORDER, DEFAULT_DTYPE};
