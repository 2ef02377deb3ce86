//! Annotation-store records.
//!
//! Reading Darwin JSON exports into [`ItemRecord`]s and reading/writing
//! vector polygon paths. Everything here is I/O and schema mapping; the
//! pixel work happens in [`crate::mask`] and [`crate::volume`].

mod ids;
pub mod io_darwin_json;
pub mod io_polygon_json;
mod model;

pub use ids::{AnnotationId, GlobalId};
pub use model::{AnnotationFrame, AnnotationObject, ItemRecord, RasterLayer, SlotGeometry};
