//! Fuzz target for record-list JSON parsing.
//!
//! Parsed batches are also run through consensus and validation, which must
//! accept any record the parser produces.

#![no_main]

use birka::consensus::compute_consensus;
use birka::record::from_json_slice;
use birka::validation::validate_collection;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(records) = from_json_slice(data) {
        let consensus = compute_consensus(&records);
        let _ = validate_collection(&records, &consensus, None);
    }
});
