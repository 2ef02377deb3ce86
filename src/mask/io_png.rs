//! Mask images on disk.
//!
//! Masks are read as 8-bit grayscale: the luma value of each pixel becomes
//! its label, so `0` is background and any other shade is foreground.
//! Written masks are binary, with foreground drawn at full intensity.
//! Class colour masks are already-rendered RGB images and are written as is.

use std::path::Path;

use image::{GrayImage, Luma, RgbImage};

use super::LabelMask;
use crate::error::LabelvoxError;

/// Reads an image file as a label mask. Colour images are converted to luma.
pub fn read_mask_image(path: &Path) -> Result<LabelMask, LabelvoxError> {
    let img = image::open(path).map_err(|source| LabelvoxError::ImageRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(from_gray_image(&img.to_luma8()))
}

/// Writes a mask as a binary 8-bit PNG (`0` or `255`).
pub fn write_mask_image(path: &Path, mask: &LabelMask) -> Result<(), LabelvoxError> {
    to_gray_image(mask)
        .save(path)
        .map_err(|source| LabelvoxError::ImageWrite {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes an RGB image, e.g. a per-class colour mask, as PNG.
pub fn write_rgb_image(path: &Path, img: &RgbImage) -> Result<(), LabelvoxError> {
    img.save(path).map_err(|source| LabelvoxError::ImageWrite {
        path: path.to_path_buf(),
        source,
    })
}

pub fn from_gray_image(img: &GrayImage) -> LabelMask {
    let mut mask = LabelMask::new(img.width(), img.height());
    for (dst, px) in mask.as_mut_slice().iter_mut().zip(img.pixels()) {
        *dst = u32::from(px.0[0]);
    }
    mask
}

pub fn to_gray_image(mask: &LabelMask) -> GrayImage {
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        let set = mask.is_foreground(i64::from(x), i64::from(y));
        Luma([if set { 255 } else { 0 }])
    })
}
