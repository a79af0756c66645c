//! Fuzz target for manifest CSV parsing.

#![no_main]

use birka::archive::read_manifest_csv_slice;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = read_manifest_csv_slice(data);
});
