//! From per-frame masks to a labelled 3D volume.
//!
//! - [`identity`]: Collect → Remap reconciliation of frame-local mask values
//! - [`assemble`]: frame stacking, axis convention and reorientation
//! - [`orient`]: axis orientation algebra on affines
//! - [`legend`]: ITK-SNAP label descriptions
//! - [`nifti`]: NIfTI-1 output

mod affine;
pub mod assemble;
pub mod identity;
pub mod legend;
pub mod nifti;
pub mod orient;

pub use affine::Affine;
pub use assemble::{assemble, VolumetricLabelImage};
pub use identity::{
    remap_frames, FrameWarning, FrameWarningKind, GlobalIdentity, IdentityTable, ReconciledFrames,
};
pub use legend::{Legend, LegendStyle, Rgb};
pub use orient::Orientation;
