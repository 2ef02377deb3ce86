//! Points and polygons in pixel space.
//!
//! Coordinates follow image conventions: `x` grows to the right, `y` grows
//! downwards, and the pixel at column `c`, row `r` has its centre at
//! `(c, r)`.

use serde::{Deserialize, Serialize};

use crate::error::LabelvoxError;

/// A 2D point in pixel coordinates.
#[derive(Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns true if both coordinates are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::fmt::Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The orientation of a closed path as seen on screen (y pointing down).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Winding {
    Clockwise,
    CounterClockwise,
    /// Zero signed area: collinear or self-cancelling paths.
    Degenerate,
}

/// An implicitly closed polygon: the last point connects back to the first.
///
/// Construction does not enforce the 3-point minimum so that traced or
/// parsed paths can be inspected before being rejected; operations that
/// need a proper polygon call [`Polygon::ensure_valid`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Builds a polygon from `(x, y)` tuples.
    pub fn from_xy(points: &[(f64, f64)]) -> Self {
        Self {
            points: points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Rejects polygons with fewer than three points.
    ///
    /// # Errors
    /// Returns [`LabelvoxError::DegeneratePolygon`].
    pub fn ensure_valid(&self) -> Result<(), LabelvoxError> {
        if self.points.len() < 3 {
            return Err(LabelvoxError::DegeneratePolygon {
                points: self.points.len(),
            });
        }
        Ok(())
    }

    /// Iterates over the closed edges `(p[i], p[i+1])`, including the
    /// closing edge from the last point back to the first.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Shoelace area in image coordinates.
    ///
    /// Positive for paths that run clockwise on screen.
    pub fn signed_area(&self) -> f64 {
        self.edges().map(|(a, b)| a.x * b.y - b.x * a.y).sum::<f64>() / 2.0
    }

    pub fn winding(&self) -> Winding {
        let area = self.signed_area();
        if area > 0.0 {
            Winding::Clockwise
        } else if area < 0.0 {
            Winding::CounterClockwise
        } else {
            Winding::Degenerate
        }
    }

    /// Reverses the point order in place.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Reorients the path to run in the requested direction.
    ///
    /// Degenerate paths are left untouched.
    pub fn orient(&mut self, winding: Winding) {
        let current = self.winding();
        if current != Winding::Degenerate && winding != Winding::Degenerate && current != winding
        {
            self.reverse();
        }
    }

    /// Clips the polygon to the axis-aligned rectangle `min..=max`
    /// (Sutherland-Hodgman).
    ///
    /// Exact for convex polygons. A concave polygon that leaves and re-enters
    /// the rectangle comes back as one ring joined by zero-width runs along
    /// the rectangle's border. The result may have fewer than three points
    /// when nothing of the polygon lies inside.
    pub fn clip_to_rect(&self, min: Point, max: Point) -> Polygon {
        let mut points = self.points.clone();
        for side in [Side::Left, Side::Right, Side::Top, Side::Bottom] {
            if points.is_empty() {
                break;
            }
            let input = std::mem::take(&mut points);
            let inside = |p: Point| side.inside(p, min, max);
            for (i, &current) in input.iter().enumerate() {
                let previous = input[(i + input.len() - 1) % input.len()];
                match (inside(previous), inside(current)) {
                    (true, true) => points.push(current),
                    (true, false) => points.push(side.crossing(previous, current, min, max)),
                    (false, true) => {
                        points.push(side.crossing(previous, current, min, max));
                        points.push(current);
                    }
                    (false, false) => {}
                }
            }
        }
        points.dedup();
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        Polygon { points }
    }
}

/// Rectangle side used by [`Polygon::clip_to_rect`].
#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    fn inside(self, p: Point, min: Point, max: Point) -> bool {
        match self {
            Side::Left => p.x >= min.x,
            Side::Right => p.x <= max.x,
            Side::Top => p.y >= min.y,
            Side::Bottom => p.y <= max.y,
        }
    }

    /// Where `a`–`b` crosses this side. Only called when exactly one end is
    /// inside, so the edge is never parallel to the side.
    fn crossing(self, a: Point, b: Point, min: Point, max: Point) -> Point {
        match self {
            Side::Left | Side::Right => {
                let x = if matches!(self, Side::Left) { min.x } else { max.x };
                let t = (x - a.x) / (b.x - a.x);
                Point::new(x, a.y + t * (b.y - a.y))
            }
            Side::Top | Side::Bottom => {
                let y = if matches!(self, Side::Top) { min.y } else { max.y };
                let t = (y - a.y) / (b.y - a.y);
                Point::new(a.x + t * (b.x - a.x), y)
            }
        }
    }
}

/// Clips paths to the pixel centres of a `width × height` image,
/// `[0, width-1] × [0, height-1]`, dropping paths left with fewer than three
/// points.
pub fn clip_to_image(paths: &[Polygon], width: u32, height: u32) -> Vec<Polygon> {
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let min = Point::new(0.0, 0.0);
    let max = Point::new(f64::from(width - 1), f64::from(height - 1));
    paths
        .iter()
        .map(|path| path.clip_to_rect(min, max))
        .filter(|clipped| clipped.ensure_valid().is_ok())
        .collect()
}
