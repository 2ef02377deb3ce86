//! Conversion settings.
//!
//! Settings are an explicit value handed to [`crate::conversion::convert_file`];
//! nothing is read from process-wide state. They can be loaded from a YAML
//! file, and CLI flags override individual fields afterwards.
//!
//! ```yaml
//! output_prefix: itk_snap_
//! reorient: true
//! legend:
//!   alpha: 1.0
//!   visible: true
//!   mesh_visible: true
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LabelvoxError;
use crate::volume::LegendStyle;

/// Prefix prepended to every output file name by default.
pub const DEFAULT_OUTPUT_PREFIX: &str = "itk_snap_";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    /// Prepended to `<stem>.nii` for each output volume.
    pub output_prefix: String,
    /// Reorient volumes to the slot's `original_affine` when present.
    pub reorient: bool,
    pub legend: LegendStyle,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            reorient: true,
            legend: LegendStyle::default(),
        }
    }
}

impl ConvertConfig {
    /// Loads settings from a YAML file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, LabelvoxError> {
        let data = fs::read_to_string(path).map_err(LabelvoxError::Io)?;
        Self::from_yaml_str(&data).map_err(|source| LabelvoxError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes as null rather than an empty map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }
}
