//! Geographic adjustment of lat/lon grids before contouring.
//!
//! Re-centering rotates the longitude axis so a chosen meridian sits in the
//! middle; cropping keeps the rows and columns inside a bounding box. Both
//! preserve cell values.

pub mod adjust;

pub use adjust::{adjust, crop, recenter, wrap_lon};
