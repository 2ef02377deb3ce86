use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationReport;

/// The main error type for labelvox operations.
#[derive(Debug, Error)]
pub enum LabelvoxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed RLE: runs cover {actual} pixel(s), expected {expected}")]
    MalformedRle { expected: u64, actual: u64 },

    #[error("Malformed RLE: flat run array has odd length {len}")]
    MalformedRleArray { len: usize },

    #[error("Degenerate polygon: {points} point(s), at least 3 required")]
    DegeneratePolygon { points: usize },

    #[error("Shape mismatch: {left_width}x{left_height} vs {right_width}x{right_height}")]
    ShapeMismatch {
        left_width: u32,
        left_height: u32,
        right_width: u32,
        right_height: u32,
    },

    #[error("Frame {frame}: local mask value {value} does not resolve to a known object")]
    UnknownLocalValue { frame: usize, value: u32 },

    #[error("Frame {frame} is outside the item's {frame_count} frame(s)")]
    FrameOutOfRange { frame: usize, frame_count: usize },

    #[error("Invalid affine: {0}")]
    InvalidAffine(String),

    #[error("No masks found in {item}")]
    NoMasks { item: String },

    #[error("Label {label} does not fit in a signed 16-bit voxel")]
    VoxelOverflow { label: u32 },

    #[error("Failed to parse Darwin JSON from {path}: {source}")]
    DarwinJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid Darwin JSON in {path}: {message}")]
    DarwinJsonInvalid { path: PathBuf, message: String },

    #[error("Failed to parse polygon JSON from {path}: {source}")]
    PolygonJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write polygon JSON: {0}")]
    PolygonJsonWrite(#[source] serde_json::Error),

    #[error("Failed to parse config from {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to read image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write image {path}: {source}")]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },

    #[error("{failed} of {total} item(s) failed to convert")]
    BatchFailed { failed: usize, total: usize },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}
