#![allow(dead_code)]

use std::fs;
use std::path::Path;

use image::{GrayImage, Luma};
use serde_json::{json, Value};

/// One raster frame: flat `[value, count, ...]` runs plus `annotation id → value`.
pub fn raster_frame(dense_rle: &[u64], mapping: &[(&str, u32)]) -> Value {
    let mapping: serde_json::Map<String, Value> = mapping
        .iter()
        .map(|(id, value)| ((*id).to_string(), json!(value)))
        .collect();
    json!({
        "raster_layer": {
            "dense_rle": dense_rle,
            "mask_annotation_ids_mapping": mapping
        }
    })
}

/// Builds a Darwin JSON export with one slot and a raster layer carrier
/// holding `frames` (frame index → frame value).
pub fn darwin_item(
    name: &str,
    width: u32,
    height: u32,
    frame_count: usize,
    objects: &[(&str, &str)],
    frames: &[(usize, Value)],
) -> Value {
    let mut annotations: Vec<Value> = objects
        .iter()
        .map(|(id, name)| json!({"id": id, "name": name}))
        .collect();
    let frames: serde_json::Map<String, Value> = frames
        .iter()
        .map(|(index, frame)| (index.to_string(), frame.clone()))
        .collect();
    annotations.push(json!({
        "id": "raster",
        "name": "__raster_layer__",
        "frames": frames
    }));

    json!({
        "item": {
            "name": name,
            "slots": [{"width": width, "height": height, "frame_count": frame_count}]
        },
        "annotations": annotations
    })
}

/// Three 2×2 frames: Liver on frame 0, nothing on frame 1, Lesion on frame 2.
pub fn gap_item(name: &str) -> Value {
    darwin_item(
        name,
        2,
        2,
        3,
        &[("liver", "Liver"), ("lesion", "Lesion")],
        &[
            (0, raster_frame(&[1, 1, 0, 3], &[("liver", 1)])),
            (2, raster_frame(&[0, 3, 2, 1], &[("lesion", 2)])),
        ],
    )
}

pub fn write_json(path: &Path, value: &Value) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, serde_json::to_vec_pretty(value).expect("serialize json"))
        .expect("write json file");
}

/// Writes rows of gray values as an 8-bit PNG.
pub fn write_png(path: &Path, rows: &[&[u8]]) {
    let height = rows.len() as u32;
    let width = rows.first().map_or(0, |r| r.len()) as u32;
    let img = GrayImage::from_fn(width, height, |x, y| Luma([rows[y as usize][x as usize]]));
    img.save(path).expect("write png file");
}

pub fn read_i16_le(bytes: &[u8], at: usize) -> i16 {
    i16::from_le_bytes([bytes[at], bytes[at + 1]])
}

pub fn read_f32_le(bytes: &[u8], at: usize) -> f32 {
    f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
