//! Boundary extraction from label masks.
//!
//! Foreground (`value != 0`) is treated as 8-connected and background as
//! 4-connected, the usual dual pair that keeps every border a single closed
//! path. Borders are followed with Moore-neighbour tracing using Jacob's
//! stopping criterion; contour vertices are the centres of the foreground
//! pixels on the border, so filling a traced contour with the inclusive
//! rasterizer gives back the same pixels.

use std::collections::VecDeque;

use super::geometry::{Point, Polygon, Winding};
use super::LabelMask;

/// Moore neighbourhood in clockwise order on screen, starting west.
const MOORE: [(i64, i64); 8] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
];

const FOUR: [(i64, i64); 4] = [(-1, 0), (0, -1), (1, 0), (0, 1)];

/// Index of `S` in [`MOORE`].
const SOUTH: usize = 6;

/// Index of `W` in [`MOORE`].
const WEST: usize = 0;

/// Traced borders of a mask.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contours {
    /// Outer borders of foreground regions, clockwise on screen.
    pub external: Vec<Polygon>,
    /// Borders of holes inside foreground regions, counter-clockwise.
    pub internal: Vec<Polygon>,
}

impl Contours {
    pub fn is_empty(&self) -> bool {
        self.external.is_empty() && self.internal.is_empty()
    }

    /// All paths, external first, in the order the export format expects.
    pub fn into_paths(self) -> Vec<Polygon> {
        let mut paths = self.external;
        paths.extend(self.internal);
        paths
    }
}

/// Extracts external and hole contours from a mask.
///
/// Paths with two points or fewer (single pixels and two-pixel slivers)
/// are dropped, as are paths that enclose no area, such as one-pixel-wide
/// lines traced out and back. Every kept path therefore has a definite
/// winding. Holes nested inside islands inside holes are not kept as a
/// hierarchy: every hole lands in `internal` and every island in `external`.
pub fn trace(mask: &LabelMask) -> Contours {
    let width = i64::from(mask.width());
    let height = i64::from(mask.height());
    let mut contours = Contours::default();
    if width == 0 || height == 0 {
        return contours;
    }

    let fg = Components::label(mask, true, &MOORE);
    let bg = Components::label(mask, false, &FOUR);

    let mut fg_started = vec![false; fg.count];
    let mut bg_started = vec![false; bg.count];

    for y in 0..height {
        for x in 0..width {
            let idx = (y * width + x) as usize;

            if let Some(label) = fg.label_at(idx) {
                if !fg_started[label] {
                    fg_started[label] = true;
                    // Raster-first pixel of the component: its west
                    // neighbour is background or outside the mask.
                    let path = follow_border(mask, (x, y), WEST);
                    push_path(&mut contours.external, path, Winding::Clockwise);
                }
            } else if let Some(label) = bg.label_at(idx) {
                if !bg_started[label] && !bg.touches_border[label] {
                    bg_started[label] = true;
                    // Raster-first pixel of a hole: the pixel above it must
                    // be foreground, otherwise it would belong to the hole.
                    let path = follow_border(mask, (x, y - 1), SOUTH);
                    push_path(&mut contours.internal, path, Winding::CounterClockwise);
                }
            }
        }
    }

    contours
}

fn push_path(out: &mut Vec<Polygon>, path: Vec<(i64, i64)>, winding: Winding) {
    if path.len() <= 2 {
        return;
    }
    let mut polygon = Polygon::new(
        path.into_iter()
            .map(|(x, y)| Point::new(x as f64, y as f64))
            .collect(),
    );
    if polygon.winding() == Winding::Degenerate {
        return;
    }
    polygon.orient(winding);
    out.push(polygon);
}

/// Follows the border that separates the foreground component containing
/// `start` from the background pixel in direction `back_dir`.
///
/// Returns the border pixels in visiting order without repeating `start`
/// at the end.
fn follow_border(mask: &LabelMask, start: (i64, i64), back_dir: usize) -> Vec<(i64, i64)> {
    let mut path = vec![start];
    let Some((second, mut back)) = moore_step(mask, start, back_dir) else {
        return path;
    };

    // Every border pixel can be entered from at most 8 directions.
    let limit = mask.len() * 8 + 8;
    let mut current = second;
    path.push(second);

    while path.len() <= limit {
        let Some((next, next_back)) = moore_step(mask, current, back) else {
            break;
        };
        if current == start && next == second {
            break;
        }
        path.push(next);
        current = next;
        back = next_back;
    }

    if path.len() > 1 && path.last() == Some(&start) {
        path.pop();
    }
    path
}

/// Searches the neighbours of `pos` clockwise, starting just after the
/// background neighbour in direction `back_dir`.
///
/// Returns the first foreground neighbour and the direction, seen from that
/// neighbour, of the last background pixel examined.
fn moore_step(mask: &LabelMask, pos: (i64, i64), back_dir: usize) -> Option<((i64, i64), usize)> {
    for i in 1..=8 {
        let dir = (back_dir + i) % 8;
        let (dx, dy) = MOORE[dir];
        let next = (pos.0 + dx, pos.1 + dy);
        if mask.is_foreground(next.0, next.1) {
            let (bx, by) = MOORE[(back_dir + i - 1) % 8];
            let backtrack = (pos.0 + bx, pos.1 + by);
            let offset = (backtrack.0 - next.0, backtrack.1 - next.1);
            let next_back = MOORE.iter().position(|&d| d == offset)?;
            return Some((next, next_back));
        }
    }
    None
}

/// Connected-component labelling of either the foreground or the background.
struct Components {
    /// `labels[idx] == 0` means the pixel is not part of the labelled set.
    labels: Vec<usize>,
    count: usize,
    touches_border: Vec<bool>,
}

impl Components {
    fn label(mask: &LabelMask, foreground: bool, neighbourhood: &[(i64, i64)]) -> Self {
        let width = i64::from(mask.width());
        let height = i64::from(mask.height());
        let member = |x: i64, y: i64| {
            x >= 0 && y >= 0 && x < width && y < height && mask.is_foreground(x, y) == foreground
        };

        let mut labels = vec![0usize; mask.len()];
        let mut touches_border = Vec::new();
        let mut queue = VecDeque::new();

        for y in 0..height {
            for x in 0..width {
                let idx = (y * width + x) as usize;
                if labels[idx] != 0 || !member(x, y) {
                    continue;
                }
                touches_border.push(false);
                let label = touches_border.len();
                labels[idx] = label;
                queue.push_back((x, y));

                while let Some((cx, cy)) = queue.pop_front() {
                    if cx == 0 || cy == 0 || cx == width - 1 || cy == height - 1 {
                        touches_border[label - 1] = true;
                    }
                    for &(dx, dy) in neighbourhood {
                        let (nx, ny) = (cx + dx, cy + dy);
                        if !member(nx, ny) {
                            continue;
                        }
                        let nidx = (ny * width + nx) as usize;
                        if labels[nidx] == 0 {
                            labels[nidx] = label;
                            queue.push_back((nx, ny));
                        }
                    }
                }
            }
        }

        Self {
            labels,
            count: touches_border.len(),
            touches_border,
        }
    }

    /// Zero-based component index of the pixel, if it belongs to one.
    fn label_at(&self, idx: usize) -> Option<usize> {
        match self.labels[idx] {
            0 => None,
            label => Some(label - 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::rasterize::{rasterize, rasterize_paths};

    fn block(width: u32, height: u32, x0: i64, y0: i64, x1: i64, y1: i64) -> LabelMask {
        let mut mask = LabelMask::new(width, height);
        for y in y0..=y1 {
            for x in x0..=x1 {
                mask.set(x, y, 1);
            }
        }
        mask
    }

    #[test]
    fn background_mask_has_no_contours() {
        let contours = trace(&LabelMask::new(5, 5));
        assert!(contours.is_empty());
    }

    #[test]
    fn two_by_two_block_traces_four_corners_clockwise() {
        let mask = block(4, 4, 1, 1, 2, 2);
        let contours = trace(&mask);
        assert_eq!(contours.external.len(), 1);
        assert!(contours.internal.is_empty());

        let outer = &contours.external[0];
        assert_eq!(
            outer.points(),
            Polygon::from_xy(&[(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 2.0)]).points()
        );
        assert_eq!(outer.winding(), Winding::Clockwise);
    }

    #[test]
    fn single_pixels_and_slivers_are_dropped() {
        let mut mask = LabelMask::new(6, 6);
        mask.set(0, 0, 1);
        mask.set(3, 3, 1);
        mask.set(4, 3, 1);
        let contours = trace(&mask);
        assert!(contours.is_empty());
    }

    #[test]
    fn one_pixel_wide_lines_are_dropped() {
        let row = LabelMask::from_rows(&[&[0, 0, 0, 0, 0], &[0, 1, 1, 1, 0], &[0, 0, 0, 0, 0]])
            .unwrap();
        assert!(trace(&row).is_empty());

        let mut diagonal = LabelMask::new(6, 6);
        for i in 1..=4 {
            diagonal.set(i, i, 1);
        }
        assert!(trace(&diagonal).is_empty());
    }

    #[test]
    fn kept_paths_always_have_a_winding() {
        // A block with a one-pixel tail: the tail is traced out and back
        // inside a path that still encloses the block.
        let mut mask = block(8, 6, 1, 1, 3, 3);
        mask.set(4, 2, 1);
        mask.set(5, 2, 1);
        mask.set(6, 2, 1);
        let contours = trace(&mask);
        assert_eq!(contours.external.len(), 1);
        assert_eq!(contours.external[0].winding(), Winding::Clockwise);
        assert_eq!(rasterize(&contours.external[0], 8, 6).unwrap(), mask);
    }

    #[test]
    fn ring_yields_external_and_internal_contours() {
        let mut mask = block(5, 5, 0, 0, 4, 4);
        mask.set(2, 2, 0);
        let contours = trace(&mask);

        assert_eq!(contours.external.len(), 1);
        assert_eq!(contours.internal.len(), 1);
        assert_eq!(contours.external[0].winding(), Winding::Clockwise);
        assert_eq!(contours.internal[0].winding(), Winding::CounterClockwise);

        let hole = &contours.internal[0];
        assert_eq!(hole.len(), 4);
        for p in hole.points() {
            assert!(mask.is_foreground(p.x as i64, p.y as i64));
        }
    }

    #[test]
    fn hole_contours_refill_to_the_same_mask() {
        let mut mask = block(8, 8, 1, 1, 6, 6);
        for y in 3..=4 {
            for x in 3..=4 {
                mask.set(x, y, 0);
            }
        }
        let paths = trace(&mask).into_paths();
        assert_eq!(paths.len(), 2);
        assert_eq!(rasterize_paths(&paths, 8, 8).unwrap(), mask);
    }

    #[test]
    fn separate_regions_get_separate_contours() {
        let mut mask = block(10, 4, 0, 0, 2, 2);
        for y in 0..=2 {
            for x in 6..=8 {
                mask.set(x, y, 3);
            }
        }
        let contours = trace(&mask);
        assert_eq!(contours.external.len(), 2);
    }

    #[test]
    fn diagonal_touch_is_one_component() {
        let mut mask = block(6, 6, 0, 0, 1, 1);
        for y in 2..=3 {
            for x in 2..=3 {
                mask.set(x, y, 1);
            }
        }
        let contours = trace(&mask);
        assert_eq!(contours.external.len(), 1);
        assert_eq!(rasterize(&contours.external[0], 6, 6).unwrap(), mask);
    }

    #[test]
    fn concave_shape_refills_exactly() {
        // A "U": the notch must stay background after refilling.
        let mask = LabelMask::from_rows(&[
            &[1, 1, 0, 0, 1, 1],
            &[1, 1, 0, 0, 1, 1],
            &[1, 1, 1, 1, 1, 1],
            &[1, 1, 1, 1, 1, 1],
        ])
        .unwrap();
        let contours = trace(&mask);
        assert_eq!(contours.external.len(), 1);
        assert!(contours.internal.is_empty());
        assert_eq!(rasterize(&contours.external[0], 6, 4).unwrap(), mask);
    }
}
