#![allow(dead_code)]

use labelvox::mask::{LabelMask, Polygon};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Masks up to `max_w × max_h` whose labels are drawn from `0..=max_label`.
/// Values are biased towards long runs so the encoder has something to merge.
pub fn arb_mask(max_w: u32, max_h: u32, max_label: u32) -> BoxedStrategy<LabelMask> {
    (1u32..=max_w, 1u32..=max_h)
        .prop_flat_map(move |(w, h)| {
            let len = (w * h) as usize;
            proptest::collection::vec((0u32..=max_label, 1usize..=6), 1..=len).prop_map(
                move |runs| {
                    let mut data = Vec::with_capacity(len);
                    for (value, count) in runs.into_iter().cycle() {
                        if data.len() >= len {
                            break;
                        }
                        data.extend(std::iter::repeat(value).take(count));
                    }
                    data.truncate(len);
                    LabelMask::from_vec(w, h, data).expect("data sized to mask")
                },
            )
        })
        .boxed()
}

/// An axis-aligned filled block of at least 2×2 pixels on a canvas with a
/// one pixel margin, as `(canvas_w, canvas_h, x0, y0, x1, y1)` inclusive.
pub fn arb_block() -> BoxedStrategy<(u32, u32, u32, u32, u32, u32)> {
    (4u32..=24, 4u32..=24)
        .prop_flat_map(|(w, h)| {
            (Just(w), Just(h), 1..w - 2, 1..h - 2).prop_flat_map(|(w, h, x0, y0)| {
                (
                    Just(w),
                    Just(h),
                    Just(x0),
                    Just(y0),
                    x0 + 1..w - 1,
                    y0 + 1..h - 1,
                )
            })
        })
        .boxed()
}

pub fn block_mask(w: u32, h: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> LabelMask {
    let mut mask = LabelMask::new(w, h);
    for y in y0..=y1 {
        for x in x0..=x1 {
            mask.set(i64::from(x), i64::from(y), 1);
        }
    }
    mask
}

/// Pixels within Manhattan distance `radius` of `(cx, cy)`.
pub fn diamond_mask(w: u32, h: u32, cx: i64, cy: i64, radius: i64) -> LabelMask {
    let mut mask = LabelMask::new(w, h);
    for y in 0..i64::from(h) {
        for x in 0..i64::from(w) {
            if (x - cx).abs() + (y - cy).abs() <= radius {
                mask.set(x, y, 1);
            }
        }
    }
    mask
}

/// Convex polygons inside a 21×21 canvas: arbitrary triangles (slivers and
/// collinear ones included) and rotated ellipse-inscribed n-gons.
pub fn arb_convex_polygon() -> BoxedStrategy<Polygon> {
    let coord = || 0.0f64..20.0;
    let triangle = ((coord(), coord()), (coord(), coord()), (coord(), coord()))
        .prop_map(|(a, b, c)| Polygon::from_xy(&[a, b, c]));

    let ngon = (
        3usize..=8,
        (6.0f64..14.0, 6.0f64..14.0),
        (0.5f64..6.0, 0.5f64..6.0),
        0.0f64..std::f64::consts::TAU,
    )
        .prop_map(|(n, (cx, cy), (rx, ry), rot)| {
            let points: Vec<(f64, f64)> = (0..n)
                .map(|i| {
                    let t = std::f64::consts::TAU * i as f64 / n as f64;
                    let (ex, ey) = (rx * t.cos(), ry * t.sin());
                    (
                        cx + ex * rot.cos() - ey * rot.sin(),
                        cy + ex * rot.sin() + ey * rot.cos(),
                    )
                })
                .collect();
            Polygon::from_xy(&points)
        });

    prop_oneof![triangle, ngon].boxed()
}

/// 8-connected foreground components, each as a list of pixel coordinates.
pub fn components(mask: &LabelMask) -> Vec<Vec<(i64, i64)>> {
    let (w, h) = (i64::from(mask.width()), i64::from(mask.height()));
    let mut seen = vec![false; mask.len()];
    let mut out = Vec::new();
    for y in 0..h {
        for x in 0..w {
            if seen[(y * w + x) as usize] || !mask.is_foreground(x, y) {
                continue;
            }
            seen[(y * w + x) as usize] = true;
            let mut stack = vec![(x, y)];
            let mut pixels = Vec::new();
            while let Some((cx, cy)) = stack.pop() {
                pixels.push((cx, cy));
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        let (nx, ny) = (cx + dx, cy + dy);
                        if mask.is_foreground(nx, ny) && !seen[(ny * w + nx) as usize] {
                            seen[(ny * w + nx) as usize] = true;
                            stack.push((nx, ny));
                        }
                    }
                }
            }
            out.push(pixels);
        }
    }
    out
}

/// True if some 2×2 block of the pixel set is fully present.
pub fn has_full_2x2(pixels: &[(i64, i64)]) -> bool {
    pixels.iter().any(|&(x, y)| {
        [(x + 1, y), (x, y + 1), (x + 1, y + 1)]
            .iter()
            .all(|p| pixels.contains(p))
    })
}
