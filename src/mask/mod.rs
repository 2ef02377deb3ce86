//! Raster and vector representations of 2D annotations.
//!
//! This module holds the per-frame half of the codec:
//!
//! - [`rle`]: dense run-length streams ⇄ [`LabelMask`]
//! - [`rasterize`]: closed polygons → binary masks (even-odd, inclusive edges)
//! - [`contour`]: masks → outer and hole polygons (Moore-neighbour tracing)
//! - [`setops`]: AND / OR / IoU over equal-shaped masks
//! - [`io_png`]: masks as grayscale images, class colour masks as RGB
//!
//! # Example
//!
//! ```
//! use labelvox::mask::{rasterize, rle, Polygon};
//!
//! let square = Polygon::from_xy(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
//! let mask = rasterize::rasterize(&square, 6, 6).unwrap();
//! assert_eq!(mask.foreground_count(), 25);
//!
//! let stream = rle::encode(&mask);
//! assert_eq!(stream.total_count(), 36);
//! assert_eq!(rle::decode(&stream, 6, 6).unwrap(), mask);
//! ```

pub mod contour;
mod geometry;
pub mod io_png;
mod label;
pub mod rasterize;
pub mod rle;
pub mod setops;

pub use contour::Contours;
pub use geometry::{clip_to_image, Point, Polygon, Winding};
pub use label::LabelMask;
pub use rle::{Run, RunLengthStream};
pub use setops::Iou;
