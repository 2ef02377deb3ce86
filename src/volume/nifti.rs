//! Single-file NIfTI-1 (`.nii`) writer for label volumes.
//!
//! Layout: a 348-byte little-endian header, 4 zero bytes of extension flag,
//! then signed 16-bit voxels in column-major order starting at byte 352.
//! The affine goes into the sform (code 2, "aligned"); the qform is left
//! unset so viewers use the sform unchanged.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::assemble::VolumetricLabelImage;
use crate::error::LabelvoxError;

pub const HEADER_SIZE: usize = 348;
pub const VOX_OFFSET: usize = 352;

const DT_INT16: i16 = 4;
const NIFTI_UNITS_MM: u8 = 2;
const NIFTI_UNITS_SEC: u8 = 8;
const NIFTI_XFORM_ALIGNED_ANAT: i16 = 2;

/// Serializes a volume as a complete `.nii` file in memory.
///
/// # Errors
/// Returns [`LabelvoxError::VoxelOverflow`] if a label does not fit in
/// `i16`, and [`LabelvoxError::UnsupportedFormat`] if a dimension exceeds
/// the format's `i16` limit.
pub fn encode_nifti(volume: &VolumetricLabelImage) -> Result<Vec<u8>, LabelvoxError> {
    let mut bytes = Vec::with_capacity(VOX_OFFSET + volume.data().len() * 2);
    bytes.extend_from_slice(&header_bytes(volume)?);
    bytes.extend_from_slice(&[0u8; VOX_OFFSET - HEADER_SIZE]);
    for &label in volume.data() {
        let voxel = i16::try_from(label).map_err(|_| LabelvoxError::VoxelOverflow { label })?;
        bytes.extend_from_slice(&voxel.to_le_bytes());
    }
    Ok(bytes)
}

/// Writes a volume to a `.nii` file.
pub fn write_nifti(path: &Path, volume: &VolumetricLabelImage) -> Result<(), LabelvoxError> {
    let bytes = encode_nifti(volume)?;
    let file = File::create(path).map_err(LabelvoxError::Io)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

fn header_bytes(volume: &VolumetricLabelImage) -> Result<[u8; HEADER_SIZE], LabelvoxError> {
    let mut h = Header([0u8; HEADER_SIZE]);
    let affine = volume.affine();

    h.put_i32(0, HEADER_SIZE as i32);
    h.0[38] = b'r';

    let mut dim = [1i16; 8];
    dim[0] = 3;
    for (axis, &extent) in volume.shape().iter().enumerate() {
        dim[axis + 1] = i16::try_from(extent).map_err(|_| {
            LabelvoxError::UnsupportedFormat(format!(
                "NIfTI-1 dimension {extent} exceeds {}",
                i16::MAX
            ))
        })?;
    }
    for (i, &d) in dim.iter().enumerate() {
        h.put_i16(40 + 2 * i, d);
    }

    h.put_i16(70, DT_INT16);
    h.put_i16(72, 16);

    let sizes = affine.voxel_sizes();
    let pixdim = [1.0, sizes[0], sizes[1], sizes[2], 1.0, 1.0, 1.0, 1.0];
    for (i, &p) in pixdim.iter().enumerate() {
        h.put_f32(76 + 4 * i, p as f32);
    }

    h.put_f32(108, VOX_OFFSET as f32);
    h.put_f32(112, 1.0);
    h.0[123] = NIFTI_UNITS_MM | NIFTI_UNITS_SEC;

    let descrip = b"labelvox";
    h.0[148..148 + descrip.len()].copy_from_slice(descrip);

    h.put_i16(252, 0);
    h.put_i16(254, NIFTI_XFORM_ALIGNED_ANAT);
    for (row, offset) in [280, 296, 312].into_iter().enumerate() {
        for col in 0..4 {
            h.put_f32(offset + 4 * col, affine.get(row, col) as f32);
        }
    }

    h.0[344..348].copy_from_slice(b"n+1\0");
    Ok(h.0)
}

struct Header([u8; HEADER_SIZE]);

impl Header {
    fn put_i16(&mut self, at: usize, v: i16) {
        self.0[at..at + 2].copy_from_slice(&v.to_le_bytes());
    }

    fn put_i32(&mut self, at: usize, v: i32) {
        self.0[at..at + 4].copy_from_slice(&v.to_le_bytes());
    }

    fn put_f32(&mut self, at: usize, v: f32) {
        self.0[at..at + 4].copy_from_slice(&v.to_le_bytes());
    }
}
