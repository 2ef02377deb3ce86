//! Per-class colour masks of single frames.
//!
//! A frame's dense RLE is decoded and every pixel takes the colour of the
//! object its value resolves to. Colours come from the same identity table
//! as the volume legend, so a mask PNG and the `.nii.label` of the same item
//! agree. Values that resolve to no object stay black.

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb as Pixel, RgbImage};

use crate::darwin::io_darwin_json::read_darwin_json;
use crate::darwin::{GlobalId, ItemRecord};
use crate::error::LabelvoxError;
use crate::mask::io_png::write_rgb_image;
use crate::mask::{rle, RunLengthStream};
use crate::volume::IdentityTable;

/// One rendered frame.
#[derive(Clone, Debug)]
pub struct SemanticMask {
    pub image: RgbImage,
    /// Non-zero mask values that resolved to no object, in first-seen order.
    pub unmapped_values: Vec<u32>,
    /// False when the frame carries no raster layer and the image is black.
    pub has_raster: bool,
}

/// Renders frame `frame` of `item` as an RGB class mask.
///
/// An item without any frames still has a frame `0`, rendered black.
///
/// # Errors
/// Returns [`LabelvoxError::FrameOutOfRange`] for a frame past the item's
/// frame count and the RLE errors of [`rle::decode`] for a bad stream.
pub fn semantic_mask(item: &ItemRecord, frame: usize) -> Result<SemanticMask, LabelvoxError> {
    if frame >= item.frame_count.max(1) {
        return Err(LabelvoxError::FrameOutOfRange {
            frame,
            frame_count: item.frame_count,
        });
    }

    let mut image = RgbImage::new(item.width, item.height);
    let Some(raster) = item.frames.get(&frame).and_then(|f| f.raster.as_ref()) else {
        tracing::warn!(item = %item.name, frame, "frame has no raster layer; mask is empty");
        return Ok(SemanticMask {
            image,
            unmapped_values: Vec::new(),
            has_raster: false,
        });
    };

    let stream = RunLengthStream::from_flat(&raster.dense_rle)?;
    let local = rle::decode(&stream, item.width, item.height)?;
    let table = IdentityTable::collect(&item.objects);
    let lookup = table.frame_lookup(&raster.local_mapping);

    let mut unmapped_values = Vec::new();
    for (pixel, &value) in image.pixels_mut().zip(local.as_slice()) {
        if value == 0 {
            continue;
        }
        let identity = lookup
            .get(&value)
            .and_then(|&global| table.get(GlobalId::new(global)));
        match identity {
            Some(identity) => {
                let c = identity.color;
                *pixel = Pixel([c.r, c.g, c.b]);
            }
            None if !unmapped_values.contains(&value) => unmapped_values.push(value),
            None => {}
        }
    }

    if !unmapped_values.is_empty() {
        tracing::warn!(
            item = %item.name,
            frame,
            values = ?unmapped_values,
            "mask values with no object were left black"
        );
    }

    Ok(SemanticMask {
        image,
        unmapped_values,
        has_raster: true,
    })
}

/// Output path for a class mask: `<stem>_mask.png` in `output_dir`, where
/// `<stem>` is the input file name without `.json`.
pub fn mask_output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_dir.join(format!("{stem}_mask.png"))
}

/// Reads one Darwin JSON file and writes the class mask of `frame`.
pub fn write_semantic_mask(
    input: &Path,
    output_dir: &Path,
    frame: usize,
) -> Result<PathBuf, LabelvoxError> {
    let item = read_darwin_json(input)?;
    let mask = semantic_mask(&item, frame)?;

    fs::create_dir_all(output_dir).map_err(LabelvoxError::Io)?;
    let output = mask_output_path(input, output_dir);
    write_rgb_image(&output, &mask.image)?;
    tracing::info!(input = %input.display(), output = %output.display(), "wrote class mask");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::darwin::io_darwin_json::from_darwin_str;
    use crate::volume::legend::PALETTE;
    use serde_json::json;

    fn item() -> ItemRecord {
        let doc = json!({
            "item": {"name": "frame.png", "slots": [{"width": 3, "height": 1}]},
            "annotations": [
                {"id": "liver", "name": "Liver"},
                {"id": "lesion", "name": "Lesion"},
                {"id": "r", "name": "__raster_layer__", "raster_layer": {
                    "dense_rle": [2, 1, 0, 1, 5, 1],
                    "mask_annotation_ids_mapping": {"lesion": 2}
                }}
            ]
        });
        from_darwin_str(&doc.to_string()).unwrap()
    }

    #[test]
    fn pixels_take_the_legend_colour_of_their_object() {
        let mask = semantic_mask(&item(), 0).unwrap();
        assert!(mask.has_raster);
        // Lesion is the second object, so global id 2.
        let c = PALETTE[2];
        assert_eq!(mask.image.get_pixel(0, 0).0, [c.r, c.g, c.b]);
        assert_eq!(mask.image.get_pixel(1, 0).0, [0, 0, 0]);
    }

    #[test]
    fn unmapped_values_stay_black() {
        let mask = semantic_mask(&item(), 0).unwrap();
        assert_eq!(mask.image.get_pixel(2, 0).0, [0, 0, 0]);
        assert_eq!(mask.unmapped_values, vec![5]);
    }

    #[test]
    fn frame_past_the_end_is_rejected() {
        let err = semantic_mask(&item(), 1).unwrap_err();
        assert!(matches!(
            err,
            LabelvoxError::FrameOutOfRange {
                frame: 1,
                frame_count: 1
            }
        ));
    }

    #[test]
    fn item_without_raster_renders_black() {
        let doc = json!({
            "item": {"name": "empty", "slots": [{"width": 2, "height": 2}]},
            "annotations": [{"id": "liver", "name": "Liver"}]
        });
        let item = from_darwin_str(&doc.to_string()).unwrap();
        let mask = semantic_mask(&item, 0).unwrap();
        assert!(!mask.has_raster);
        assert!(mask.image.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn output_path_keeps_inner_extensions() {
        let path = mask_output_path(Path::new("in/scan.nii.json"), Path::new("out"));
        assert_eq!(path, Path::new("out/scan.nii_mask.png"));
    }
}
