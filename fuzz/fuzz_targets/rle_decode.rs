//! Fuzz target for RLE decoding.
//!
//! Interprets the input as little-endian u32 pairs of `[value, count]` and
//! decodes them into a small frame. Decoding must either fail cleanly or
//! re-encode to a stream covering the same pixels.
//!
//! Run with:
//!   cargo +nightly fuzz run rle_decode

#![no_main]

use labelvox::mask::{rle, RunLengthStream};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let width = u32::from(data[0] % 32) + 1;
    let height = u32::from(data[1] % 32) + 1;

    let flat: Vec<u64> = data[2..]
        .chunks_exact(4)
        .map(|c| u64::from(u32::from_le_bytes([c[0], c[1], c[2], c[3]])))
        .collect();

    let Ok(stream) = RunLengthStream::from_flat(&flat) else {
        return;
    };
    if let Ok(mask) = rle::decode(&stream, width, height) {
        let again = rle::encode(&mask);
        assert_eq!(again.total_count(), u64::from(width) * u64::from(height));
    }
});
