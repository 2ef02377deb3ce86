//! Boolean set algebra over masks and the IoU overlap score.
//!
//! Every operation reads masks as binary: any non-zero label is "set".

use std::fmt;

use serde::Serialize;

use super::geometry::Polygon;
use super::rasterize::rasterize;
use super::LabelMask;
use crate::error::LabelvoxError;

/// Intersection over union of two masks.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Iou {
    /// `intersection / union`, in `[0, 1]`.
    Defined(f64),
    /// Both masks are entirely background, so the union is empty.
    Undefined,
}

impl Iou {
    /// The score, or `None` when undefined.
    pub fn value(&self) -> Option<f64> {
        match self {
            Iou::Defined(v) => Some(*v),
            Iou::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Iou::Defined(_))
    }
}

impl fmt::Display for Iou {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Iou::Defined(v) => write!(f, "{v}"),
            Iou::Undefined => write!(f, "undefined"),
        }
    }
}

fn check_shape(a: &LabelMask, b: &LabelMask) -> Result<(), LabelvoxError> {
    if a.same_shape(b) {
        Ok(())
    } else {
        Err(LabelvoxError::ShapeMismatch {
            left_width: a.width(),
            left_height: a.height(),
            right_width: b.width(),
            right_height: b.height(),
        })
    }
}

fn count_where(a: &LabelMask, b: &LabelMask, op: impl Fn(bool, bool) -> bool) -> usize {
    a.as_slice()
        .iter()
        .zip(b.as_slice())
        .filter(|&(&x, &y)| op(x != 0, y != 0))
        .count()
}

/// Element-wise AND of two masks as a binary mask.
///
/// # Errors
/// Returns [`LabelvoxError::ShapeMismatch`] if the dimensions differ.
pub fn and(a: &LabelMask, b: &LabelMask) -> Result<LabelMask, LabelvoxError> {
    combine(a, b, |x, y| x && y)
}

/// Element-wise OR of two masks as a binary mask.
///
/// # Errors
/// Returns [`LabelvoxError::ShapeMismatch`] if the dimensions differ.
pub fn or(a: &LabelMask, b: &LabelMask) -> Result<LabelMask, LabelvoxError> {
    combine(a, b, |x, y| x || y)
}

fn combine(
    a: &LabelMask,
    b: &LabelMask,
    op: impl Fn(bool, bool) -> bool,
) -> Result<LabelMask, LabelvoxError> {
    check_shape(a, b)?;
    let data = a
        .as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(&x, &y)| u32::from(op(x != 0, y != 0)))
        .collect();
    LabelMask::from_vec(a.width(), a.height(), data).ok_or(LabelvoxError::ShapeMismatch {
        left_width: a.width(),
        left_height: a.height(),
        right_width: b.width(),
        right_height: b.height(),
    })
}

/// Number of pixels set in both masks.
///
/// # Errors
/// Returns [`LabelvoxError::ShapeMismatch`] if the dimensions differ.
pub fn intersection_count(a: &LabelMask, b: &LabelMask) -> Result<usize, LabelvoxError> {
    check_shape(a, b)?;
    Ok(count_where(a, b, |x, y| x && y))
}

/// Number of pixels set in either mask.
///
/// # Errors
/// Returns [`LabelvoxError::ShapeMismatch`] if the dimensions differ.
pub fn union_count(a: &LabelMask, b: &LabelMask) -> Result<usize, LabelvoxError> {
    check_shape(a, b)?;
    Ok(count_where(a, b, |x, y| x || y))
}

/// Intersection over union of two masks.
///
/// Returns [`Iou::Undefined`] instead of dividing by zero when both masks
/// are entirely background; callers usually leave those pairs out of
/// aggregate statistics.
///
/// # Errors
/// Returns [`LabelvoxError::ShapeMismatch`] if the dimensions differ.
pub fn iou(a: &LabelMask, b: &LabelMask) -> Result<Iou, LabelvoxError> {
    check_shape(a, b)?;
    let mut inter = 0usize;
    let mut union = 0usize;
    for (&x, &y) in a.as_slice().iter().zip(b.as_slice()) {
        let (x, y) = (x != 0, y != 0);
        inter += usize::from(x && y);
        union += usize::from(x || y);
    }
    if union == 0 {
        return Ok(Iou::Undefined);
    }
    Ok(Iou::Defined(inter as f64 / union as f64))
}

/// Rasterizes two polygons onto a `width × height` canvas and scores their
/// overlap.
///
/// # Errors
/// Returns [`LabelvoxError::DegeneratePolygon`] if either polygon has fewer
/// than three points.
pub fn polygon_iou(
    a: &Polygon,
    b: &Polygon,
    width: u32,
    height: u32,
) -> Result<Iou, LabelvoxError> {
    let mask_a = rasterize(a, width, height)?;
    let mask_b = rasterize(b, width, height)?;
    iou(&mask_a, &mask_b)
}
