//! Fuzz target for identity filter compilation.
//!
//! The first line is the pattern, the rest is matched against it.

#![no_main]

use birka::validation::IdentityFilter;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 64 * 1024 {
        return;
    }

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let (pattern, subject) = text.split_once('\n').unwrap_or((text, ""));

    if let Ok(filter) = IdentityFilter::new(pattern) {
        let _ = filter.matches(subject);
    }
});
