//! Axis orientation algebra for voxel volumes.
//!
//! An [`Orientation`] says, for each voxel axis, which world axis it runs
//! along and whether it runs in the negative direction. These are the same
//! semantics as the orientation arrays used by the common neuroimaging
//! toolkits, so volumes reoriented here line up in viewers that rely on
//! them.

use super::affine::{invert3, Affine};
use crate::error::LabelvoxError;

/// Where one voxel axis points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisOrientation {
    /// Output (world) axis this voxel axis maps to.
    pub axis: usize,
    /// True if increasing the voxel index moves in the negative direction.
    pub flipped: bool,
}

/// Per-axis orientation of a 3D volume. The three `axis` values always form
/// a permutation of `0..3`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Orientation([AxisOrientation; 3]);

impl Orientation {
    /// The orientation that leaves a volume unchanged.
    pub const fn identity() -> Self {
        Orientation([
            AxisOrientation { axis: 0, flipped: false },
            AxisOrientation { axis: 1, flipped: false },
            AxisOrientation { axis: 2, flipped: false },
        ])
    }

    /// Builds an orientation from `(axis, flipped)` pairs.
    ///
    /// Returns `None` unless the axes are a permutation of `0..3`.
    pub fn new(axes: [(usize, bool); 3]) -> Option<Self> {
        let mut seen = [false; 3];
        for &(axis, _) in &axes {
            if axis >= 3 || seen[axis] {
                return None;
            }
            seen[axis] = true;
        }
        Some(Orientation(axes.map(|(axis, flipped)| AxisOrientation { axis, flipped })))
    }

    pub fn axes(&self) -> &[AxisOrientation; 3] {
        &self.0
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }
}

/// Orientation of the voxel axes of `affine` relative to world axes.
///
/// Voxel sizes and shears are factored out first: the columns of the linear
/// block are normalized and replaced by their closest orthogonal matrix
/// (the polar factor). Voxel axes are then taken in order `i, j, k`: each
/// claims the unclaimed world axis with the largest absolute component in
/// its column.
///
/// # Errors
/// Returns [`LabelvoxError::InvalidAffine`] if the linear block is singular
/// or not finite.
pub fn io_orientation(affine: &Affine) -> Result<Orientation, LabelvoxError> {
    let mut rs = affine.linear();
    let sizes = affine.voxel_sizes();
    for (c, &size) in sizes.iter().enumerate() {
        if !size.is_finite() || size == 0.0 {
            return Err(LabelvoxError::InvalidAffine(format!(
                "voxel axis {c} has zero or non-finite length"
            )));
        }
        for row in rs.iter_mut() {
            row[c] /= size;
        }
    }

    let mut r = polar_factor(&rs)?;

    let mut result = [AxisOrientation { axis: 0, flipped: false }; 3];
    for (in_ax, slot) in result.iter_mut().enumerate() {
        // r[out][in]: world axis `out`, voxel axis `in`. Rows claimed by an
        // earlier voxel axis are already zeroed.
        let mut best: Option<(usize, f64)> = None;
        for (out_ax, row) in r.iter().enumerate() {
            let v = row[in_ax];
            if v != 0.0 && best.map_or(true, |(_, b)| v.abs() > b.abs()) {
                best = Some((out_ax, v));
            }
        }
        let (out_ax, v) = best.ok_or_else(|| {
            LabelvoxError::InvalidAffine("affine does not span three axes".to_string())
        })?;
        *slot = AxisOrientation {
            axis: out_ax,
            flipped: v < 0.0,
        };
        r[out_ax] = [0.0; 3];
    }

    Ok(Orientation(result))
}

/// Orthogonal polar factor of `m` by Newton iteration `R ← (R + R⁻ᵀ) / 2`.
fn polar_factor(m: &[[f64; 3]; 3]) -> Result<[[f64; 3]; 3], LabelvoxError> {
    let singular = || LabelvoxError::InvalidAffine("affine is not invertible".to_string());
    let mut r = *m;
    for _ in 0..64 {
        let inv = invert3(&r).ok_or_else(singular)?;
        let mut next = [[0.0; 3]; 3];
        let mut delta: f64 = 0.0;
        for i in 0..3 {
            for j in 0..3 {
                // inv transposed: inv[j][i]
                next[i][j] = 0.5 * (r[i][j] + inv[j][i]);
                delta = delta.max((next[i][j] - r[i][j]).abs());
            }
        }
        r = next;
        if delta < 1e-12 {
            break;
        }
    }
    if r.iter().flatten().all(|v| v.is_finite()) {
        Ok(r)
    } else {
        Err(singular())
    }
}

/// The orientation change that takes a volume in `start` orientation to
/// `end` orientation.
///
/// Entry `i` of the result says where voxel axis `i` of the start volume
/// goes and whether it must be reversed.
pub fn ornt_transform(start: &Orientation, end: &Orientation) -> Orientation {
    let mut result = Orientation::identity();
    for (start_in, s) in start.0.iter().enumerate() {
        // Both orientations are permutations, so a match always exists.
        if let Some((end_in, e)) = end.0.iter().enumerate().find(|(_, e)| e.axis == s.axis) {
            result.0[start_in] = AxisOrientation {
                axis: end_in,
                flipped: s.flipped != e.flipped,
            };
        }
    }
    result
}

/// Reorders a column-major (`x` fastest) 3D array by `ornt`: axes marked
/// `flipped` are reversed, then voxel axis `i` is moved to position
/// `ornt[i].axis`.
///
/// Returns the new data and shape.
pub fn apply_orientation<T: Copy>(
    data: &[T],
    shape: [usize; 3],
    ornt: &Orientation,
) -> (Vec<T>, [usize; 3]) {
    let mut new_shape = [0usize; 3];
    for (i, a) in ornt.0.iter().enumerate() {
        new_shape[a.axis] = shape[i];
    }

    let mut out = Vec::with_capacity(data.len());
    // Walk the output in storage order and pull from the input.
    let mut src_of_dst = [0usize; 3];
    for (i, a) in ornt.0.iter().enumerate() {
        src_of_dst[a.axis] = i;
    }
    for n2 in 0..new_shape[2] {
        for n1 in 0..new_shape[1] {
            for n0 in 0..new_shape[0] {
                let n = [n0, n1, n2];
                let mut src = [0usize; 3];
                for (dst_axis, &idx) in n.iter().enumerate() {
                    let i = src_of_dst[dst_axis];
                    src[i] = if ornt.0[i].flipped {
                        shape[i] - 1 - idx
                    } else {
                        idx
                    };
                }
                out.push(data[src[0] + shape[0] * (src[1] + shape[1] * src[2])]);
            }
        }
    }
    (out, new_shape)
}

/// The affine that maps voxel indices of a reoriented volume back to voxel
/// indices of the original one.
///
/// `shape` is the shape before reorientation. Multiply the original affine
/// by this on the right to get the reoriented volume's affine.
pub fn inv_ornt_aff(ornt: &Orientation, shape: [usize; 3]) -> Affine {
    // Undo the transpose: row i of the permutation picks axis ornt[i].axis.
    let mut undo_reorder = [[0.0; 4]; 4];
    for (i, a) in ornt.0.iter().enumerate() {
        undo_reorder[i][a.axis] = 1.0;
    }
    undo_reorder[3][3] = 1.0;

    let mut undo_flip = *Affine::identity().rows();
    for (i, a) in ornt.0.iter().enumerate() {
        let flip = if a.flipped { -1.0 } else { 1.0 };
        let centre = -(shape[i] as f64 - 1.0) / 2.0;
        undo_flip[i][i] = flip;
        undo_flip[i][3] = flip * centre - centre;
    }

    Affine::from_rows(undo_flip) * Affine::from_rows(undo_reorder)
}
