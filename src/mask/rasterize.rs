//! Scanline polygon filling.
//!
//! Pixel centres sit on integer coordinates. A pixel is filled when its
//! centre is inside the polygon under the even-odd rule, or when it lies
//! exactly on one of the polygon's edges. The inclusive edge rule means a
//! square from `(0, 0)` to `(4, 4)` covers 5×5 pixels.

use super::geometry::{Point, Polygon};
use super::LabelMask;
use crate::error::LabelvoxError;

/// Tolerance used when deciding whether a pixel centre lies on an edge.
const EDGE_EPS: f64 = 1e-9;

/// Fills a single closed polygon into a binary (`0`/`1`) mask.
///
/// # Errors
/// Returns [`LabelvoxError::DegeneratePolygon`] for polygons with fewer
/// than three points.
pub fn rasterize(polygon: &Polygon, width: u32, height: u32) -> Result<LabelMask, LabelvoxError> {
    polygon.ensure_valid()?;
    Ok(fill_rings(std::slice::from_ref(polygon), width, height))
}

/// Fills a multi-ring polygon (outer boundaries plus holes) into a binary mask.
///
/// All rings take part in a single even-odd test, so a ring nested inside
/// another carves a hole. Edge pixels of every ring, holes included, are
/// filled.
///
/// # Errors
/// Returns [`LabelvoxError::DegeneratePolygon`] if there are no rings or any
/// ring has fewer than three points.
pub fn rasterize_paths(
    paths: &[Polygon],
    width: u32,
    height: u32,
) -> Result<LabelMask, LabelvoxError> {
    if paths.is_empty() {
        return Err(LabelvoxError::DegeneratePolygon { points: 0 });
    }
    for path in paths {
        path.ensure_valid()?;
    }
    Ok(fill_rings(paths, width, height))
}

fn fill_rings(rings: &[Polygon], width: u32, height: u32) -> LabelMask {
    let mut mask = LabelMask::new(width, height);
    let mut crossings: Vec<f64> = Vec::new();

    for row in 0..height {
        let y = f64::from(row);
        crossings.clear();
        for (a, b) in rings.iter().flat_map(|r| r.edges()) {
            if !(a.is_finite() && b.is_finite()) {
                continue;
            }
            let (lo, hi) = if a.y <= b.y { (a, b) } else { (b, a) };
            // Half-open in y so shared vertices are counted once and
            // horizontal edges never count.
            if lo.y <= y && y < hi.y {
                let t = (y - lo.y) / (hi.y - lo.y);
                crossings.push(lo.x + t * (hi.x - lo.x));
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));
        for pair in crossings.chunks_exact(2) {
            fill_span(&mut mask, i64::from(row), pair[0], pair[1]);
        }
    }

    for (a, b) in rings.iter().flat_map(|r| r.edges()) {
        mark_edge(&mut mask, a, b);
    }
    mask
}

/// Sets every pixel of `row` whose centre lies in `[x0, x1]`.
fn fill_span(mask: &mut LabelMask, row: i64, x0: f64, x1: f64) {
    if row < 0 || row >= i64::from(mask.height()) {
        return;
    }
    let start = (x0 - EDGE_EPS).ceil().max(0.0);
    let end = (x1 + EDGE_EPS)
        .floor()
        .min(f64::from(mask.width()) - 1.0);
    if !(start <= end) {
        return;
    }
    for x in start as i64..=end as i64 {
        mask.set(x, row, 1);
    }
}

/// Sets every pixel whose centre lies exactly on the segment `a`–`b`.
fn mark_edge(mask: &mut LabelMask, a: Point, b: Point) {
    if !(a.is_finite() && b.is_finite()) {
        return;
    }

    if (a.y - b.y).abs() <= EDGE_EPS {
        let row = a.y.round();
        if (a.y - row).abs() <= EDGE_EPS {
            fill_span(mask, row as i64, a.x.min(b.x), a.x.max(b.x));
        }
        return;
    }

    let (lo, hi) = if a.y <= b.y { (a, b) } else { (b, a) };
    let first = (lo.y - EDGE_EPS).ceil().max(0.0);
    let last = (hi.y + EDGE_EPS)
        .floor()
        .min(f64::from(mask.height()) - 1.0);
    if !(first <= last) {
        return;
    }
    for row in first as i64..=last as i64 {
        let y = row as f64;
        let x = lo.x + (y - lo.y) / (hi.y - lo.y) * (hi.x - lo.x);
        let col = x.round();
        if (x - col).abs() <= EDGE_EPS {
            mask.set(col as i64, row, 1);
        }
    }
}
