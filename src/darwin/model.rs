//! In-memory form of one annotated item.
//!
//! [`ItemRecord`] is what the Darwin JSON reader produces and what the
//! reconciler and validator consume. It is deliberately flatter than the
//! wire schema: the raster-carrier annotation is dissolved into per-frame
//! [`AnnotationFrame`]s, every other annotation becomes an
//! [`AnnotationObject`], and slot metadata has been parsed into typed
//! [`SlotGeometry`].

use std::collections::BTreeMap;

use super::ids::AnnotationId;
use crate::volume::Affine;

/// One item (a single- or multi-frame image) with its mask annotations.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemRecord {
    /// Item name, or the source file stem when the JSON has none.
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Number of frames on the frame axis. Taken from the slot when
    /// declared, otherwise one past the highest frame index seen.
    pub frame_count: usize,
    /// Annotation objects in file order. Duplicate IDs are kept here so the
    /// validator can report them; the reconciler keeps only the first.
    pub objects: Vec<AnnotationObject>,
    /// Frames that the raster carrier mentions, keyed by frame index.
    pub frames: BTreeMap<usize, AnnotationFrame>,
    pub geometry: SlotGeometry,
}

impl ItemRecord {
    /// Number of pixels in one frame.
    pub fn frame_pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Returns true if at least one frame carries a raster layer.
    pub fn has_raster(&self) -> bool {
        self.frames.values().any(|f| f.raster.is_some())
    }
}

/// An annotation object that mask values can refer to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotationObject {
    pub id: AnnotationId,
    pub name: String,
}

impl AnnotationObject {
    pub fn new(id: impl Into<AnnotationId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One frame of the item as recorded by the raster carrier.
///
/// A frame key can be present without a raster layer; such frames are
/// treated as background with a warning.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationFrame {
    pub index: usize,
    pub raster: Option<RasterLayer>,
}

/// Run-length data for one frame plus its frame-local value table.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterLayer {
    /// Flat `[value, count, value, count, ...]` array exactly as stored.
    pub dense_rle: Vec<u64>,
    /// `local mask value → annotation ID`. Only meaningful inside this frame.
    pub local_mapping: BTreeMap<u32, AnnotationId>,
    pub total_pixels: Option<u64>,
}

/// Voxel-to-world metadata carried on the slot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SlotGeometry {
    pub affine: Option<Affine>,
    pub original_affine: Option<Affine>,
    /// Volume shape with a leading singleton dimension removed.
    pub shape: Option<Vec<usize>>,
    /// Voxel spacing along the three volume axes.
    pub pixdim: Option<[f64; 3]>,
}
