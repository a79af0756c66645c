//! Fuzz target for the ImageJ TIFF metadata reader.
//!
//! This fuzzer feeds arbitrary byte sequences to the ImageJ metadata reader,
//! checking for panics, crashes, or oversized allocations.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    birka::extract::fuzz_read_imagej_header(data);
});
