//! 4×4 voxel-to-world transforms.

use std::fmt;
use std::ops::Mul;

use crate::error::LabelvoxError;

/// A homogeneous 4×4 affine mapping voxel indices `(i, j, k, 1)` to world
/// coordinates. Stored row-major.
#[derive(Clone, Copy, PartialEq)]
pub struct Affine {
    rows: [[f64; 4]; 4],
}

impl Affine {
    pub const fn identity() -> Self {
        Self {
            rows: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub const fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        Self { rows }
    }

    /// Builds an affine from 16 row-major values, or from 12 values (a 3×4
    /// matrix) completed with the homogeneous row `[0, 0, 0, 1]`.
    ///
    /// # Errors
    /// Returns [`LabelvoxError::InvalidAffine`] for any other count or for
    /// non-finite values.
    pub fn from_values(values: &[f64]) -> Result<Self, LabelvoxError> {
        if values.len() != 16 && values.len() != 12 {
            return Err(LabelvoxError::InvalidAffine(format!(
                "expected 16 values (or 12 for a 3x4 matrix), found {}",
                values.len()
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(LabelvoxError::InvalidAffine(
                "matrix contains non-finite values".to_string(),
            ));
        }
        let mut affine = Self::identity();
        for (idx, &v) in values.iter().enumerate() {
            affine.rows[idx / 4][idx % 4] = v;
        }
        Ok(affine)
    }

    /// A scaling affine with the given voxel spacing and no translation.
    pub fn from_voxel_sizes(sizes: [f64; 3]) -> Self {
        let mut affine = Self::identity();
        for (axis, size) in sizes.into_iter().enumerate() {
            affine.rows[axis][axis] = size;
        }
        affine
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.rows[row][col]
    }

    pub fn rows(&self) -> &[[f64; 4]; 4] {
        &self.rows
    }

    /// The upper-left 3×3 block (rotation, zoom and shear).
    pub fn linear(&self) -> [[f64; 3]; 3] {
        let mut m = [[0.0; 3]; 3];
        for (r, row) in m.iter_mut().enumerate() {
            row.copy_from_slice(&self.rows[r][..3]);
        }
        m
    }

    /// Length of each voxel axis in world units (column norms of the
    /// linear block).
    pub fn voxel_sizes(&self) -> [f64; 3] {
        let mut sizes = [0.0; 3];
        for (c, size) in sizes.iter_mut().enumerate() {
            *size = (0..3)
                .map(|r| self.rows[r][c] * self.rows[r][c])
                .sum::<f64>()
                .sqrt();
        }
        sizes
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Affine {
    type Output = Affine;

    fn mul(self, rhs: Affine) -> Affine {
        let mut out = [[0.0; 4]; 4];
        for (r, row) in out.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.rows[r][k] * rhs.rows[k][c]).sum();
            }
        }
        Affine { rows: out }
    }
}

impl fmt::Debug for Affine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rows.iter()).finish()
    }
}

/// Inverse of a 3×3 matrix, or `None` if it is (numerically) singular.
pub(crate) fn invert3(m: &[[f64; 3]; 3]) -> Option<[[f64; 3]; 3]> {
    let cofactor = |r0: usize, r1: usize, c0: usize, c1: usize| {
        m[r0][c0] * m[r1][c1] - m[r0][c1] * m[r1][c0]
    };
    let c00 = cofactor(1, 2, 1, 2);
    let c01 = -cofactor(1, 2, 0, 2);
    let c02 = cofactor(1, 2, 0, 1);
    let det = m[0][0] * c00 + m[0][1] * c01 + m[0][2] * c02;
    if !det.is_finite() || det.abs() < 1e-12 {
        return None;
    }

    let adjugate = [
        [c00, -cofactor(0, 2, 1, 2), cofactor(0, 1, 1, 2)],
        [c01, cofactor(0, 2, 0, 2), -cofactor(0, 1, 0, 2)],
        [c02, -cofactor(0, 2, 0, 1), cofactor(0, 1, 0, 1)],
    ];
    let mut inv = [[0.0; 3]; 3];
    for r in 0..3 {
        for c in 0..3 {
            inv[r][c] = adjugate[r][c] / det;
        }
    }
    Some(inv)
}
