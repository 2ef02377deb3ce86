//! Fuzz target for Darwin JSON parsing.
//!
//! Feeds arbitrary bytes to the Darwin reader, then runs validation and
//! conversion on whatever parses, checking for panics and runaway
//! allocations.
//!
//! Run with:
//!   cargo +nightly fuzz run darwin_json_parse

#![no_main]

use labelvox::config::ConvertConfig;
use labelvox::conversion::convert_item;
use labelvox::darwin::io_darwin_json::from_darwin_slice;
use labelvox::validation::{validate_item, ValidateOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // 10MB is generous for one exported item.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(item) = from_darwin_slice(data) else {
        return;
    };
    let _ = validate_item(&item, &ValidateOptions::default());

    // Keep the decoded volume small; the slot size comes straight from input.
    if item.frame_count > 4096
        || item.frame_pixels().saturating_mul(item.frame_count as u64) > 1 << 20
    {
        return;
    }
    let _ = convert_item(&item, &ConvertConfig::default());
});
