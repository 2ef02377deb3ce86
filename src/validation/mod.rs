//! Item validation for labelvox.
//!
//! This module checks an [`ItemRecord`] before conversion for:
//! - Structural integrity (unique annotation IDs, resolvable mappings)
//! - Frame consistency (indices within the frame count, raster layers present)
//! - RLE validity (even-length arrays, runs covering exactly one frame)
//!
//! Conversion recovers from most of these per frame; validation reports
//! them up front instead of as background frames in the output.

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use std::collections::{HashMap, HashSet};

use crate::darwin::{AnnotationId, ItemRecord, RasterLayer};
use crate::mask::RunLengthStream;

/// Options for validation behavior.
#[derive(Clone, Debug, Default)]
pub struct ValidateOptions {
    /// If true, treat warnings as errors.
    pub strict: bool,
}

/// Validates an item and returns a report of all issues found.
pub fn validate_item(item: &ItemRecord, _opts: &ValidateOptions) -> ValidationReport {
    let mut report = ValidationReport::default();

    if item.width == 0 || item.height == 0 {
        report.add(ValidationIssue::error(
            IssueCode::InvalidDimensions,
            format!("Invalid dimensions {}x{}", item.width, item.height),
            IssueContext::Item,
        ));
    }

    if !item.has_raster() || item.frame_count == 0 {
        report.add(ValidationIssue::error(
            IssueCode::NoRasterData,
            "No frame carries a raster layer",
            IssueContext::Item,
        ));
    }

    let known_ids = validate_annotations(item, &mut report);
    validate_frames(item, &known_ids, &mut report);

    report
}

/// Validates the annotation objects and returns the set of known IDs.
fn validate_annotations(item: &ItemRecord, report: &mut ValidationReport) -> HashSet<AnnotationId> {
    let mut seen_ids: HashMap<&AnnotationId, usize> = HashMap::new();

    for (idx, object) in item.objects.iter().enumerate() {
        let context = || IssueContext::Annotation {
            id: object.id.to_string(),
        };

        if let Some(first_idx) = seen_ids.get(&object.id) {
            report.add(ValidationIssue::warning(
                IssueCode::DuplicateAnnotationId,
                format!(
                    "Duplicate annotation ID {} (first seen at index {}); the first keeps its label",
                    object.id, first_idx
                ),
                context(),
            ));
        } else {
            seen_ids.insert(&object.id, idx);
        }

        if object.name.trim().is_empty() {
            report.add(ValidationIssue::warning(
                IssueCode::EmptyAnnotationName,
                "Empty annotation name; legend entry will be blank",
                context(),
            ));
        }
    }

    seen_ids.into_keys().cloned().collect()
}

/// Validates every frame recorded by the raster carrier.
fn validate_frames(
    item: &ItemRecord,
    known_ids: &HashSet<AnnotationId>,
    report: &mut ValidationReport,
) {
    let expected = item.frame_pixels();

    for (&index, frame) in &item.frames {
        let context = IssueContext::Frame { index };

        if index >= item.frame_count {
            report.add(ValidationIssue::warning(
                IssueCode::FrameOutOfRange,
                format!("Frame index {} is beyond frame count {}", index, item.frame_count),
                context.clone(),
            ));
        }

        let Some(raster) = &frame.raster else {
            report.add(ValidationIssue::warning(
                IssueCode::MissingRasterLayer,
                "Frame has no raster layer; it will be background",
                context,
            ));
            continue;
        };

        if let Some(total) = raster.total_pixels {
            if total != expected {
                report.add(ValidationIssue::warning(
                    IssueCode::TotalPixelsMismatch,
                    format!(
                        "total_pixels is {} but the slot is {}x{} ({} pixels)",
                        total, item.width, item.height, expected
                    ),
                    context.clone(),
                ));
            }
        }

        for (local, id) in &raster.local_mapping {
            if !known_ids.contains(id) {
                report.add(ValidationIssue::warning(
                    IssueCode::UnknownMappingTarget,
                    format!("Mask value {} maps to unknown annotation {}", local, id),
                    context.clone(),
                ));
            }
        }

        validate_rle(raster, expected, known_ids, &context, report);
    }
}

fn validate_rle(
    raster: &RasterLayer,
    expected: u64,
    known_ids: &HashSet<AnnotationId>,
    context: &IssueContext,
    report: &mut ValidationReport,
) {
    let stream = match RunLengthStream::from_flat(&raster.dense_rle) {
        Ok(stream) => stream,
        Err(err) => {
            report.add(ValidationIssue::error(
                IssueCode::OddRleLength,
                err.to_string(),
                context.clone(),
            ));
            return;
        }
    };

    let actual = stream.total_count();
    if actual != expected {
        report.add(ValidationIssue::error(
            IssueCode::RlePixelCountMismatch,
            format!("Runs cover {} pixel(s), expected {}", actual, expected),
            context.clone(),
        ));
    }

    for value in stream.labels() {
        let resolved = raster
            .local_mapping
            .get(&value)
            .is_some_and(|id| known_ids.contains(id));
        if value != 0 && !resolved {
            report.add(ValidationIssue::error(
                IssueCode::UnmappedMaskValue,
                format!("Mask value {} does not resolve to an annotation", value),
                context.clone(),
            ));
        }
    }
}
