//! Fixed-precision keys for physical pixel sizes.
//!
//! Calibration values are compared as decimal strings with a fixed number of
//! fractional digits, so two sizes that print identically group together
//! even if their binary representations differ in the last bits.

/// Number of fractional digits kept when keying a pixel size.
pub const PIXEL_SIZE_DIGITS: usize = 6;

/// Formats an optional pixel size as a fixed-precision key.
///
/// Returns `None` for an unknown size so that two unknowns compare equal and
/// a known size never equals an unknown one.
pub fn format_pixel_size(value: Option<f64>) -> Option<String> {
    value.map(|v| format!("{:.*}", PIXEL_SIZE_DIGITS, v))
}
