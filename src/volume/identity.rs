//! Frame identity reconciliation.
//!
//! Mask values inside a frame are local: value `1` in frame 0 and value `1`
//! in frame 7 may be different objects. Reconciliation runs in two phases:
//!
//! 1. **Collect** ([`IdentityTable::collect`]): every distinct annotation
//!    object of the item gets a 1-based [`GlobalId`] in first-appearance
//!    order, plus a name and palette colour.
//! 2. **Remap** ([`remap_frames`]): each frame's RLE is decoded and its
//!    local values are rewritten into global labels through the frame's
//!    local mapping and the table. Frames without data become background so
//!    the frame axis stays dense.
//!
//! Per-frame problems never abort the item; the frame becomes background and
//! a [`FrameWarning`] is recorded.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;

use super::legend::{palette_color, Rgb};
use crate::darwin::{AnnotationId, AnnotationObject, GlobalId, ItemRecord, RasterLayer};
use crate::error::LabelvoxError;
use crate::mask::{rle, LabelMask, RunLengthStream};

/// A volume-wide object identity.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GlobalIdentity {
    pub id: GlobalId,
    pub annotation_id: AnnotationId,
    pub name: String,
    pub color: Rgb,
}

impl GlobalIdentity {
    pub fn new(id: GlobalId, annotation_id: AnnotationId, name: impl Into<String>) -> Self {
        Self {
            id,
            annotation_id,
            name: name.into(),
            color: palette_color(id),
        }
    }
}

/// The Collect-phase result: annotation ID → global identity.
#[derive(Clone, Debug, Default)]
pub struct IdentityTable {
    identities: Vec<GlobalIdentity>,
    by_annotation: HashMap<AnnotationId, GlobalId>,
}

impl IdentityTable {
    /// Assigns global labels `1..=n` to the distinct objects in order.
    ///
    /// A repeated annotation ID keeps the label (and name) of its first
    /// appearance.
    pub fn collect(objects: &[AnnotationObject]) -> Self {
        let mut table = Self::default();
        for object in objects {
            if table.by_annotation.contains_key(&object.id) {
                continue;
            }
            let id = GlobalId::new(table.identities.len() as u32 + 1);
            table.by_annotation.insert(object.id.clone(), id);
            table
                .identities
                .push(GlobalIdentity::new(id, object.id.clone(), object.name.clone()));
        }
        table
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GlobalIdentity> {
        self.identities.iter()
    }

    /// Looks up the identity with the given label.
    pub fn get(&self, id: GlobalId) -> Option<&GlobalIdentity> {
        let idx = (id.as_u32() as usize).checked_sub(1)?;
        self.identities.get(idx)
    }

    pub fn lookup(&self, annotation: &AnnotationId) -> Option<GlobalId> {
        self.by_annotation.get(annotation).copied()
    }

    /// Composes a frame's local mapping with the table.
    ///
    /// Local value `0` is always background. Local values whose annotation
    /// is unknown are left out, so they fail when encountered in the mask.
    pub fn frame_lookup(&self, mapping: &BTreeMap<u32, AnnotationId>) -> HashMap<u32, u32> {
        let mut lookup: HashMap<u32, u32> = mapping
            .iter()
            .filter_map(|(&local, annotation)| {
                self.lookup(annotation).map(|global| (local, global.as_u32()))
            })
            .collect();
        lookup.insert(0, 0);
        lookup
    }
}

/// Why a frame was replaced by background or skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameWarningKind {
    UnknownLocalValue,
    MalformedRle,
    MissingRasterLayer,
    FrameOutOfRange,
}

impl fmt::Display for FrameWarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FrameWarningKind::UnknownLocalValue => "unknown_local_value",
            FrameWarningKind::MalformedRle => "malformed_rle",
            FrameWarningKind::MissingRasterLayer => "missing_raster_layer",
            FrameWarningKind::FrameOutOfRange => "frame_out_of_range",
        };
        f.write_str(s)
    }
}

/// A recovered per-frame problem.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameWarning {
    pub frame: usize,
    pub kind: FrameWarningKind,
    pub message: String,
}

/// The Remap-phase result.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReconciledFrames {
    /// One mask per frame index `0..frame_count`, in global label space.
    pub masks: Vec<LabelMask>,
    pub warnings: Vec<FrameWarning>,
    /// Frames whose raster layer was decoded and remapped successfully.
    pub frames_with_raster: usize,
    /// Frames with no entry at all that were filled with background.
    pub frames_filled: usize,
}

/// Decodes one frame's raster layer into global label space.
///
/// # Errors
/// Returns [`LabelvoxError::MalformedRle`] (or
/// [`LabelvoxError::MalformedRleArray`]) for a bad stream and
/// [`LabelvoxError::UnknownLocalValue`] if the mask uses a value the local
/// mapping and table cannot resolve.
pub fn remap_frame(
    raster: &RasterLayer,
    frame: usize,
    width: u32,
    height: u32,
    table: &IdentityTable,
) -> Result<LabelMask, LabelvoxError> {
    let stream = RunLengthStream::from_flat(&raster.dense_rle)?;
    let local = rle::decode(&stream, width, height)?;
    let lookup = table.frame_lookup(&raster.local_mapping);
    local
        .try_map(|value| lookup.get(&value).copied())
        .map_err(|value| LabelvoxError::UnknownLocalValue { frame, value })
}

/// Remaps every frame of `item` through `table`.
///
/// The output always holds exactly `item.frame_count` masks.
pub fn remap_frames(item: &ItemRecord, table: &IdentityTable) -> ReconciledFrames {
    let mut out = ReconciledFrames::default();
    let background = LabelMask::new(item.width, item.height);

    for index in 0..item.frame_count {
        let mask = match item.frames.get(&index) {
            None => {
                out.frames_filled += 1;
                background.clone()
            }
            Some(frame) => match &frame.raster {
                None => {
                    push_warning(
                        &mut out.warnings,
                        index,
                        FrameWarningKind::MissingRasterLayer,
                        "frame has no raster layer; treated as background".to_string(),
                    );
                    background.clone()
                }
                Some(raster) => {
                    match remap_frame(raster, index, item.width, item.height, table) {
                        Ok(mask) => {
                            out.frames_with_raster += 1;
                            mask
                        }
                        Err(err) => {
                            let kind = match err {
                                LabelvoxError::UnknownLocalValue { .. } => {
                                    FrameWarningKind::UnknownLocalValue
                                }
                                _ => FrameWarningKind::MalformedRle,
                            };
                            push_warning(
                                &mut out.warnings,
                                index,
                                kind,
                                format!("{err}; treated as background"),
                            );
                            background.clone()
                        }
                    }
                }
            },
        };
        out.masks.push(mask);
    }

    for &index in item.frames.keys().filter(|&&i| i >= item.frame_count) {
        push_warning(
            &mut out.warnings,
            index,
            FrameWarningKind::FrameOutOfRange,
            format!(
                "frame index is beyond the declared frame count {}; ignored",
                item.frame_count
            ),
        );
    }

    out
}

fn push_warning(
    warnings: &mut Vec<FrameWarning>,
    frame: usize,
    kind: FrameWarningKind,
    message: String,
) {
    tracing::warn!(frame, %kind, "{message}");
    warnings.push(FrameWarning {
        frame,
        kind,
        message,
    });
}
