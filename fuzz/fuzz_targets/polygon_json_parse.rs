//! Fuzz target for polygon JSON parsing and rasterization.
//!
//! Run with:
//!   cargo +nightly fuzz run polygon_json_parse

#![no_main]

use labelvox::darwin::io_polygon_json::from_polygon_str;
use labelvox::mask::rasterize::rasterize_paths;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(paths) = from_polygon_str(text) else {
        return;
    };
    let _ = rasterize_paths(&paths, 64, 64);
});
