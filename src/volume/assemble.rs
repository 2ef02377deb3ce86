//! Stacking reconciled frames into a labelled volume.

use std::collections::BTreeSet;

use super::affine::Affine;
use super::orient::{apply_orientation, inv_ornt_aff, io_orientation, ornt_transform, Orientation};
use crate::error::LabelvoxError;
use crate::mask::LabelMask;

/// A 3D label volume in column-major (`x` fastest) voxel order with its
/// voxel-to-world affine.
#[derive(Clone, Debug, PartialEq)]
pub struct VolumetricLabelImage {
    shape: [usize; 3],
    data: Vec<u32>,
    affine: Affine,
    original_affine: Option<Affine>,
    reorientation: Option<Orientation>,
}

impl VolumetricLabelImage {
    /// Creates a volume from raw voxels.
    ///
    /// Returns `None` if `data` does not hold exactly one value per voxel.
    pub fn from_raw(shape: [usize; 3], data: Vec<u32>, affine: Affine) -> Option<Self> {
        if shape.iter().product::<usize>() != data.len() {
            return None;
        }
        Some(Self {
            shape,
            data,
            affine,
            original_affine: None,
            reorientation: None,
        })
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn data(&self) -> &[u32] {
        &self.data
    }

    pub fn affine(&self) -> &Affine {
        &self.affine
    }

    pub fn original_affine(&self) -> Option<&Affine> {
        self.original_affine.as_ref()
    }

    /// The orientation change applied by [`assemble`], if any.
    pub fn reorientation(&self) -> Option<&Orientation> {
        self.reorientation.as_ref()
    }

    pub fn get(&self, i: usize, j: usize, k: usize) -> Option<u32> {
        let [nx, ny, nz] = self.shape;
        if i >= nx || j >= ny || k >= nz {
            return None;
        }
        self.data.get(i + nx * (j + ny * k)).copied()
    }

    /// The distinct non-zero labels present in the volume.
    pub fn labels(&self) -> BTreeSet<u32> {
        self.data.iter().copied().filter(|&v| v != 0).collect()
    }

    /// Re-expresses the volume in another voxel orientation. World positions
    /// of labels are unchanged: the affine is updated to match.
    pub fn reorient(self, ornt: &Orientation) -> Self {
        let (data, shape) = apply_orientation(&self.data, self.shape, ornt);
        let affine = self.affine * inv_ornt_aff(ornt, self.shape);
        Self {
            shape,
            data,
            affine,
            original_affine: self.original_affine,
            reorientation: Some(*ornt),
        }
    }
}

/// Stacks frames into a volume.
///
/// Frame `f` of a `width × height` stack becomes the volume with shape
/// `[width, height, frame_count]` where voxel `(i, j, k)` holds pixel
/// `(width-1-i, height-1-j)` of frame `frame_count-1-k`: the frame stack is
/// transposed to `x, y, frame` order and then reversed along all three axes.
/// This is a fixed convention independent of the affine.
///
/// When `original_affine` is given, the volume is then reoriented from the
/// orientation of `affine` to that of `original_affine`.
///
/// # Errors
/// Returns [`LabelvoxError::NoMasks`] for an empty stack,
/// [`LabelvoxError::ShapeMismatch`] if frames differ in size and
/// [`LabelvoxError::InvalidAffine`] if either affine has no well-defined
/// orientation.
pub fn assemble(
    frames: &[LabelMask],
    affine: Affine,
    original_affine: Option<Affine>,
) -> Result<VolumetricLabelImage, LabelvoxError> {
    let first = frames.first().ok_or_else(|| LabelvoxError::NoMasks {
        item: "empty frame stack".to_string(),
    })?;
    if let Some(other) = frames.iter().find(|f| !f.same_shape(first)) {
        return Err(LabelvoxError::ShapeMismatch {
            left_width: first.width(),
            left_height: first.height(),
            right_width: other.width(),
            right_height: other.height(),
        });
    }

    let width = first.width() as usize;
    let height = first.height() as usize;
    let depth = frames.len();

    let mut data = Vec::with_capacity(width * height * depth);
    for k in 0..depth {
        let frame = frames[depth - 1 - k].as_slice();
        for j in 0..height {
            let row = &frame[(height - 1 - j) * width..(height - j) * width];
            data.extend(row.iter().rev());
        }
    }

    let mut volume = VolumetricLabelImage {
        shape: [width, height, depth],
        data,
        affine,
        original_affine,
        reorientation: None,
    };

    if let Some(target) = original_affine {
        let current = io_orientation(&affine)?;
        let wanted = io_orientation(&target)?;
        let ornt = ornt_transform(&current, &wanted);
        if !ornt.is_identity() {
            volume = volume.reorient(&ornt);
        }
    }
    Ok(volume)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames() -> Vec<LabelMask> {
        // 3 wide, 2 high, 2 frames; value encodes (x, y, frame).
        (0..2u32)
            .map(|f| {
                let data = (0..2u32)
                    .flat_map(|y| (0..3u32).map(move |x| 100 * f + 10 * y + x + 1))
                    .collect();
                LabelMask::from_vec(3, 2, data).unwrap()
            })
            .collect()
    }

    #[test]
    fn stack_is_transposed_and_reversed() {
        let volume = assemble(&frames(), Affine::identity(), None).unwrap();
        assert_eq!(volume.shape(), [3, 2, 2]);
        for i in 0..3u32 {
            for j in 0..2u32 {
                for k in 0..2u32 {
                    let (x, y, f) = (2 - i, 1 - j, 1 - k);
                    assert_eq!(
                        volume.get(i as usize, j as usize, k as usize),
                        Some(100 * f + 10 * y + x + 1)
                    );
                }
            }
        }
        assert!(volume.reorientation().is_none());
    }

    #[test]
    fn same_orientation_is_not_reoriented() {
        let scaled = Affine::from_voxel_sizes([2.0, 2.0, 5.0]);
        let volume = assemble(&frames(), Affine::identity(), Some(scaled)).unwrap();
        assert!(volume.reorientation().is_none());
        assert_eq!(volume.affine(), &Affine::identity());
        assert_eq!(volume.original_affine(), Some(&scaled));
    }

    #[test]
    fn reorientation_keeps_world_positions() {
        let original = Affine::from_voxel_sizes([-1.0, 1.0, 1.0]);
        let plain = assemble(&frames(), Affine::identity(), None).unwrap();
        let volume = assemble(&frames(), Affine::identity(), Some(original)).unwrap();
        assert!(volume.reorientation().is_some());
        assert_eq!(volume.shape(), [3, 2, 2]);

        // Voxel i of the new volume is voxel 2 - i of the plain one, and the
        // new affine maps it to the same world x.
        assert_eq!(volume.affine().get(0, 0), -1.0);
        assert_eq!(volume.affine().get(0, 3), 2.0);
        for i in 0..3 {
            assert_eq!(volume.get(i, 1, 0), plain.get(2 - i, 1, 0));
        }
    }

    #[test]
    fn mismatched_frames_are_rejected() {
        let stack = vec![LabelMask::new(2, 2), LabelMask::new(3, 2)];
        assert!(matches!(
            assemble(&stack, Affine::identity(), None),
            Err(LabelvoxError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            assemble(&[], Affine::identity(), None),
            Err(LabelvoxError::NoMasks { .. })
        ));
    }

    #[test]
    fn singular_original_affine_is_invalid() {
        let singular = Affine::from_voxel_sizes([1.0, 0.0, 1.0]);
        assert!(matches!(
            assemble(&frames(), Affine::identity(), Some(singular)),
            Err(LabelvoxError::InvalidAffine(_))
        ));
    }

    #[test]
    fn labels_lists_non_zero_values() {
        let mut frame = LabelMask::new(2, 1);
        frame.set(1, 0, 4);
        let volume = assemble(&[frame, LabelMask::new(2, 1)], Affine::identity(), None).unwrap();
        assert_eq!(volume.labels().into_iter().collect::<Vec<_>>(), vec![4]);
    }
}
