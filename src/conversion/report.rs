//! Conversion report types for tracking recovered problems and policy
//! decisions.
//!
//! This module provides structured reporting for item conversions,
//! similar to how `validation::ValidationReport` tracks item issues.

use serde::Serialize;
use std::fmt;

use crate::volume::{FrameWarning, FrameWarningKind};

/// A report generated while converting one item to a volume.
///
/// Tracks frame and object counts, per-frame recoveries, and policy
/// decisions so users can see exactly what went into the volume.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConversionReport {
    /// Item name.
    pub item: String,
    pub counts: ConversionCounts,
    /// Issues discovered during conversion.
    pub issues: Vec<ConversionIssue>,
}

impl ConversionReport {
    /// Create a new empty report for an item.
    pub fn new(item: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            ..Default::default()
        }
    }

    /// Add an issue to the report.
    pub fn add(&mut self, issue: ConversionIssue) {
        self.issues.push(issue);
    }

    /// Count of warning-level issues (frames that lost data).
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConversionSeverity::Warning)
            .count()
    }

    /// Count of info-level issues (policy decisions, notes).
    pub fn info_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConversionSeverity::Info)
            .count()
    }

    /// Returns true if any frame data was dropped.
    pub fn is_lossy(&self) -> bool {
        self.warning_count() > 0
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  {}: {} frame(s) ({} with masks, {} filled), {} object(s) ({} labelled)",
            self.item,
            self.counts.frames,
            self.counts.frames_with_raster,
            self.counts.frames_filled,
            self.counts.objects,
            self.counts.labelled_objects
        )?;

        let warnings = self.warning_count();
        if warnings > 0 {
            writeln!(f, "  Warnings ({}):", warnings)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == ConversionSeverity::Warning)
            {
                writeln!(f, "    - {}", issue)?;
            }
        }

        let infos = self.info_count();
        if infos > 0 {
            writeln!(f, "  Notes ({}):", infos)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == ConversionSeverity::Info)
            {
                writeln!(f, "    - {}", issue)?;
            }
        }

        Ok(())
    }
}

/// Frame and object counts for one conversion.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConversionCounts {
    /// Frames on the volume's frame axis.
    pub frames: usize,
    /// Frames whose masks were decoded and remapped.
    pub frames_with_raster: usize,
    /// Frames absent from the export and filled with background.
    pub frames_filled: usize,
    /// Distinct annotation objects in the item.
    pub objects: usize,
    /// Objects that occupy at least one voxel (and so appear in the legend).
    pub labelled_objects: usize,
}

/// A single issue discovered during conversion.
#[derive(Clone, Debug, Serialize)]
pub struct ConversionIssue {
    pub severity: ConversionSeverity,
    pub code: ConversionIssueCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<usize>,
    pub message: String,
}

impl ConversionIssue {
    /// Create a warning-level issue (frame data was dropped).
    pub fn warning(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Warning,
            code,
            frame: None,
            message: message.into(),
        }
    }

    /// Create an info-level issue (policy note, does not block).
    pub fn info(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Info,
            code,
            frame: None,
            message: message.into(),
        }
    }

    /// Attach the frame index the issue refers to.
    pub fn with_frame(mut self, frame: usize) -> Self {
        self.frame = Some(frame);
        self
    }
}

impl From<&FrameWarning> for ConversionIssue {
    fn from(warning: &FrameWarning) -> Self {
        let code = match warning.kind {
            FrameWarningKind::UnknownLocalValue => ConversionIssueCode::UnknownLocalValue,
            FrameWarningKind::MalformedRle => ConversionIssueCode::MalformedRle,
            FrameWarningKind::MissingRasterLayer => ConversionIssueCode::MissingRasterLayer,
            FrameWarningKind::FrameOutOfRange => ConversionIssueCode::FrameOutOfRange,
        };
        ConversionIssue::warning(code, warning.message.clone()).with_frame(warning.frame)
    }
}

impl fmt::Display for ConversionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.frame {
            Some(frame) => write!(f, "frame {}: {}", frame, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Severity level for conversion issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionSeverity {
    /// A frame was replaced by background or ignored.
    Warning,
    /// An info note describes policy decisions; does not block conversion.
    Info,
}

/// Stable issue codes for programmatic consumption.
///
/// These codes are part of the JSON report schema and should remain stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionIssueCode {
    // Per-frame recoveries (Warning level)
    /// A mask value had no entry in the frame's mapping or the object list.
    UnknownLocalValue,
    /// The frame's run-length data did not cover the frame exactly.
    MalformedRle,
    /// The frame was listed without a raster layer.
    MissingRasterLayer,
    /// The frame index lies beyond the item's frame count.
    FrameOutOfRange,

    // Policy decisions (Info level)
    /// Slot `shape` metadata disagrees with the assembled volume.
    ShapeMetadataMismatch,
    /// The volume was reoriented to match the original affine.
    Reoriented,
    /// No affine in the metadata; one was derived from pixdim or identity.
    AffineDefaulted,
    /// Some objects never occupy a voxel and are left out of the legend.
    ObjectsWithoutVoxels,
}
