//! Darwin JSON (2.0) reader.
//!
//! Reads the annotation export of a single item and flattens it into an
//! [`ItemRecord`]. Only the parts the mask pipeline needs are modelled:
//! the first slot's dimensions and volume metadata, the annotation objects,
//! and the raster layer that carries one dense RLE per frame.
//!
//! # Raster carrier
//!
//! Mask annotations do not hold pixels themselves. A separate annotation
//! (named `__raster_layer__` by the platform) carries, per frame, a
//! `raster_layer` with the dense RLE and a `mask_annotation_ids_mapping`
//! table relating frame-local mask values to the mask annotations. Any
//! annotation carrying raster payloads is treated as a carrier and is not an
//! object itself. Single-image exports may put the raster layer directly on
//! the annotation; that is frame `0`.
//!
//! # Lenient metadata
//!
//! Slot metadata is written by several tools and arrives in several shapes.
//! `affine` may be a nested list, a flat list, or a newline-separated string
//! of row lists; a 3×4 matrix gets the homogeneous row appended. `pixdim`
//! may be a list or a string; a 4-element value drops its leading entry.
//! `shape` drops a leading singleton dimension.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::model::{AnnotationFrame, AnnotationObject, ItemRecord, RasterLayer, SlotGeometry};
use super::AnnotationId;
use crate::error::LabelvoxError;
use crate::volume::Affine;

/// Name the platform gives the raster-carrier annotation.
pub const RASTER_LAYER_NAME: &str = "__raster_layer__";

/// Largest frame accepted, in pixels (8192 × 8192).
pub const MAX_FRAME_PIXELS: u64 = 1 << 26;

/// Largest volume accepted, in voxels across all frames.
pub const MAX_VOLUME_VOXELS: u64 = 1 << 31;

/// Source label used in errors for documents that did not come from a file.
const IN_MEMORY: &str = "<memory>";

// ============================================================================
// Darwin schema types (internal to this module)
// ============================================================================

#[derive(Debug, Deserialize)]
struct DarwinFile {
    item: DarwinItem,
    #[serde(default)]
    annotations: Vec<DarwinAnnotation>,
}

#[derive(Debug, Deserialize)]
struct DarwinItem {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    slots: Vec<DarwinSlot>,
}

#[derive(Debug, Deserialize)]
struct DarwinSlot {
    width: u32,
    height: u32,
    #[serde(default)]
    frame_count: Value,
    #[serde(default)]
    metadata: DarwinSlotMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct DarwinSlotMetadata {
    #[serde(default)]
    affine: Value,
    #[serde(default)]
    original_affine: Value,
    #[serde(default)]
    shape: Value,
    #[serde(default)]
    pixdim: Value,
}

#[derive(Debug, Deserialize)]
struct DarwinAnnotation {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    frames: BTreeMap<String, DarwinFrame>,
    #[serde(default)]
    raster_layer: Option<DarwinRasterLayer>,
}

impl DarwinAnnotation {
    fn is_raster_carrier(&self) -> bool {
        self.name == RASTER_LAYER_NAME
            || self.raster_layer.is_some()
            || self.frames.values().any(|f| f.raster_layer.is_some())
    }
}

#[derive(Debug, Deserialize)]
struct DarwinFrame {
    #[serde(default)]
    raster_layer: Option<DarwinRasterLayer>,
}

#[derive(Debug, Deserialize)]
struct DarwinRasterLayer {
    dense_rle: Vec<u64>,
    #[serde(default)]
    mask_annotation_ids_mapping: BTreeMap<String, Value>,
    #[serde(default)]
    total_pixels: Option<u64>,
}

// ============================================================================
// Public API
// ============================================================================

/// Reads one item from a Darwin JSON file.
///
/// The item name falls back to the file stem when the JSON has none.
///
/// # Errors
/// Returns [`LabelvoxError::DarwinJsonParse`] for JSON that does not match
/// the schema, [`LabelvoxError::DarwinJsonInvalid`] for structural problems
/// (no slots, non-numeric frame keys, bad mapping entries) and
/// [`LabelvoxError::InvalidAffine`] for unparsable affine metadata.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use labelvox::darwin::io_darwin_json::read_darwin_json;
///
/// let item = read_darwin_json(Path::new("scan.nii.json"))?;
/// println!("{} frames", item.frame_count);
/// # Ok::<(), labelvox::LabelvoxError>(())
/// ```
pub fn read_darwin_json(path: &Path) -> Result<ItemRecord, LabelvoxError> {
    let file = File::open(path).map_err(LabelvoxError::Io)?;
    let reader = BufReader::new(file);

    let darwin: DarwinFile =
        serde_json::from_reader(reader).map_err(|source| LabelvoxError::DarwinJsonParse {
            path: path.to_path_buf(),
            source,
        })?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    darwin_to_record(darwin, &stem, path)
}

/// Reads one item from a Darwin JSON string.
///
/// Useful for testing without file I/O.
pub fn from_darwin_str(json: &str) -> Result<ItemRecord, LabelvoxError> {
    let darwin: DarwinFile =
        serde_json::from_str(json).map_err(|source| LabelvoxError::DarwinJsonParse {
            path: IN_MEMORY.into(),
            source,
        })?;
    darwin_to_record(darwin, "", Path::new(IN_MEMORY))
}

/// Reads one item from a Darwin JSON byte slice.
///
/// Useful for fuzzing and processing raw bytes without UTF-8 validation overhead.
pub fn from_darwin_slice(bytes: &[u8]) -> Result<ItemRecord, LabelvoxError> {
    let darwin: DarwinFile =
        serde_json::from_slice(bytes).map_err(|source| LabelvoxError::DarwinJsonParse {
            path: IN_MEMORY.into(),
            source,
        })?;
    darwin_to_record(darwin, "", Path::new(IN_MEMORY))
}

// ============================================================================
// Conversion: Darwin -> ItemRecord
// ============================================================================

fn darwin_to_record(
    darwin: DarwinFile,
    fallback_name: &str,
    path: &Path,
) -> Result<ItemRecord, LabelvoxError> {
    let invalid = |message: String| LabelvoxError::DarwinJsonInvalid {
        path: path.to_path_buf(),
        message,
    };

    let DarwinItem { name, slots } = darwin.item;
    let slot = slots
        .into_iter()
        .next()
        .ok_or_else(|| invalid("item has no slots".to_string()))?;

    let mut objects = Vec::new();
    let mut frames: BTreeMap<usize, AnnotationFrame> = BTreeMap::new();

    for annotation in darwin.annotations {
        if !annotation.is_raster_carrier() {
            objects.push(AnnotationObject::new(annotation.id, annotation.name));
            continue;
        }

        if let Some(layer) = annotation.raster_layer {
            let raster = convert_raster_layer(layer, 0).map_err(&invalid)?;
            merge_frame(&mut frames, 0, Some(raster));
        }
        for (key, frame) in annotation.frames {
            let index: usize = key
                .trim()
                .parse()
                .map_err(|_| invalid(format!("frame key '{key}' is not a frame index")))?;
            let raster = frame
                .raster_layer
                .map(|layer| convert_raster_layer(layer, index))
                .transpose()
                .map_err(&invalid)?;
            merge_frame(&mut frames, index, raster);
        }
    }

    let declared = parse_frame_count(&slot.frame_count).map_err(&invalid)?;
    let frame_count =
        declared.unwrap_or_else(|| frames.keys().next_back().map_or(0, |&last| last + 1));

    // Frames are allocated from these numbers before any RLE is checked.
    let frame_pixels = u64::from(slot.width) * u64::from(slot.height);
    if frame_pixels > MAX_FRAME_PIXELS {
        return Err(invalid(format!(
            "slot is {}x{} pixels, more than the {MAX_FRAME_PIXELS} pixel limit",
            slot.width, slot.height
        )));
    }
    let voxels = u64::try_from(frame_count)
        .ok()
        .and_then(|count| count.checked_mul(frame_pixels));
    if voxels.map_or(true, |v| v > MAX_VOLUME_VOXELS) {
        return Err(invalid(format!(
            "{frame_count} frame(s) of {frame_pixels} pixels exceed the {MAX_VOLUME_VOXELS} voxel limit"
        )));
    }

    let geometry = parse_geometry(&slot.metadata)?;

    Ok(ItemRecord {
        name: name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| fallback_name.to_string()),
        width: slot.width,
        height: slot.height,
        frame_count,
        objects,
        frames,
        geometry,
    })
}

/// Records a frame, keeping the first raster layer seen for each index.
fn merge_frame(
    frames: &mut BTreeMap<usize, AnnotationFrame>,
    index: usize,
    raster: Option<RasterLayer>,
) {
    let entry = frames
        .entry(index)
        .or_insert(AnnotationFrame { index, raster: None });
    if entry.raster.is_none() {
        entry.raster = raster;
    }
}

fn convert_raster_layer(layer: DarwinRasterLayer, frame: usize) -> Result<RasterLayer, String> {
    let mut local_mapping = BTreeMap::new();
    for (key, value) in layer.mask_annotation_ids_mapping {
        let (local, id) = match value {
            // Platform export: {annotation_id: local_value}
            Value::Number(n) => {
                let local = n
                    .as_u64()
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(|| {
                        format!("frame {frame}: mask value {n} for '{key}' is not a valid label")
                    })?;
                (local, key)
            }
            // Inverted form: {local_value: annotation_id}
            Value::String(id) => {
                let local: u32 = key.trim().parse().map_err(|_| {
                    format!("frame {frame}: mapping key '{key}' is not a mask value")
                })?;
                (local, id)
            }
            other => {
                return Err(format!(
                    "frame {frame}: unsupported mapping entry '{key}': {other}"
                ))
            }
        };
        local_mapping.insert(local, AnnotationId::new(id));
    }

    Ok(RasterLayer {
        dense_rle: layer.dense_rle,
        local_mapping,
        total_pixels: layer.total_pixels,
    })
}

fn parse_frame_count(value: &Value) -> Result<Option<usize>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .and_then(|v| usize::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| format!("frame_count {n} is not a frame count")),
        Value::String(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| format!("frame_count '{s}' is not a frame count")),
        other => Err(format!("frame_count {other} is not a frame count")),
    }
}

fn parse_geometry(metadata: &DarwinSlotMetadata) -> Result<SlotGeometry, LabelvoxError> {
    let shape = numbers_in(&metadata.shape).and_then(|values| {
        let mut dims = values
            .into_iter()
            .map(|v| (v >= 0.0 && v.fract() == 0.0).then_some(v as usize))
            .collect::<Option<Vec<usize>>>()?;
        if dims.first() == Some(&1) {
            dims.remove(0);
        }
        (!dims.is_empty()).then_some(dims)
    });

    let pixdim = numbers_in(&metadata.pixdim).and_then(|values| match values.as_slice() {
        [_, x, y, z] | [x, y, z] => Some([*x, *y, *z]),
        _ => None,
    });

    Ok(SlotGeometry {
        affine: parse_affine(&metadata.affine, "affine")?,
        original_affine: parse_affine(&metadata.original_affine, "original_affine")?,
        shape,
        pixdim,
    })
}

fn parse_affine(value: &Value, field: &str) -> Result<Option<Affine>, LabelvoxError> {
    if value.is_null() {
        return Ok(None);
    }
    let values = numbers_in(value)
        .ok_or_else(|| LabelvoxError::InvalidAffine(format!("{field} is not a numeric matrix")))?;
    Affine::from_values(&values).map(Some)
}

/// Flattens a metadata value into numbers.
///
/// Accepts numbers, (nested) arrays of numbers, and strings holding
/// bracketed, comma- or whitespace-separated numbers. Returns `None` if
/// anything else is found.
fn numbers_in(value: &Value) -> Option<Vec<f64>> {
    let mut out = Vec::new();
    collect_numbers(value, &mut out).then_some(out)
}

fn collect_numbers(value: &Value, out: &mut Vec<f64>) -> bool {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(v) => {
                out.push(v);
                true
            }
            None => false,
        },
        Value::Array(items) => items.iter().all(|item| collect_numbers(item, out)),
        Value::String(text) => text
            .split(|c: char| c.is_whitespace() || matches!(c, '[' | ']' | '(' | ')' | ','))
            .filter(|token| !token.is_empty())
            .all(|token| match token.parse::<f64>() {
                Ok(v) => {
                    out.push(v);
                    true
                }
                Err(_) => false,
            }),
        _ => false,
    }
}
