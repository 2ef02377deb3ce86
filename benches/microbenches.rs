//! Criterion microbenches for the labelvox codec paths.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure the performance of:
//! - Darwin JSON parsing (from_darwin_str)
//! - RLE decoding and encoding of a full frame
//! - Contour tracing and polygon rasterization
//! - Item conversion (remap, assemble, legend)

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use labelvox::config::ConvertConfig;
use labelvox::conversion::convert_item;
use labelvox::darwin::io_darwin_json::from_darwin_str;
use labelvox::mask::{contour, rasterize, rle, LabelMask, Polygon};

// Include test fixtures at compile time (no file I/O during benchmark)
const DARWIN_FIXTURE: &str = include_str!("../tests/fixtures/sample_valid.darwin.json");

const FRAME_SIZE: u32 = 512;

/// A frame with a few filled discs, roughly what an organ slice looks like.
fn synthetic_frame() -> LabelMask {
    let mut mask = LabelMask::new(FRAME_SIZE, FRAME_SIZE);
    let discs = [(160i64, 200i64, 90i64, 1u32), (340, 260, 70, 2), (250, 400, 40, 3)];
    for (cx, cy, r, label) in discs {
        for y in cy - r..=cy + r {
            for x in cx - r..=cx + r {
                if (x - cx).pow(2) + (y - cy).pow(2) <= r * r {
                    mask.set(x, y, label);
                }
            }
        }
    }
    mask
}

/// Benchmark Darwin JSON parsing from string.
fn bench_darwin_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("darwin_parse");
    group.throughput(Throughput::Bytes(DARWIN_FIXTURE.len() as u64));

    group.bench_function("from_darwin_str", |b| {
        b.iter(|| {
            let item = from_darwin_str(black_box(DARWIN_FIXTURE)).unwrap();
            black_box(item)
        })
    });

    group.finish();
}

/// Benchmark RLE encode and decode of one 512×512 frame.
fn bench_rle(c: &mut Criterion) {
    let mask = synthetic_frame();
    let stream = rle::encode(&mask);

    let mut group = c.benchmark_group("rle");
    group.throughput(Throughput::Elements(mask.len() as u64));

    group.bench_function("decode", |b| {
        b.iter(|| {
            let decoded = rle::decode(black_box(&stream), FRAME_SIZE, FRAME_SIZE).unwrap();
            black_box(decoded)
        })
    });

    group.bench_function("encode", |b| {
        b.iter(|| black_box(rle::encode(black_box(&mask))))
    });

    group.finish();
}

/// Benchmark contour tracing and refilling the traced paths.
fn bench_contours(c: &mut Criterion) {
    let mask = synthetic_frame();
    let paths = contour::trace(&mask).into_paths();
    let triangle = Polygon::from_xy(&[(10.0, 10.0), (500.0, 60.0), (200.0, 480.0)]);

    let mut group = c.benchmark_group("contours");
    group.throughput(Throughput::Elements(mask.len() as u64));

    group.bench_function("trace", |b| {
        b.iter(|| black_box(contour::trace(black_box(&mask))))
    });

    group.bench_function("rasterize_paths", |b| {
        b.iter(|| {
            let filled =
                rasterize::rasterize_paths(black_box(&paths), FRAME_SIZE, FRAME_SIZE).unwrap();
            black_box(filled)
        })
    });

    group.bench_function("rasterize_triangle", |b| {
        b.iter(|| {
            let filled = rasterize::rasterize(black_box(&triangle), FRAME_SIZE, FRAME_SIZE).unwrap();
            black_box(filled)
        })
    });

    group.finish();
}

/// Benchmark the in-memory conversion of the fixture item.
fn bench_convert(c: &mut Criterion) {
    // Parse once (outside the timed region)
    let item = from_darwin_str(DARWIN_FIXTURE).expect("Failed to parse Darwin fixture");
    let config = ConvertConfig::default();

    let mut group = c.benchmark_group("convert");
    group.throughput(Throughput::Elements(item.frame_count as u64));

    group.bench_function("convert_item", |b| {
        b.iter(|| {
            let output = convert_item(black_box(&item), &config).unwrap();
            black_box(output)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_darwin_parse,
    bench_rle,
    bench_contours,
    bench_convert,
);
criterion_main!(benches);
