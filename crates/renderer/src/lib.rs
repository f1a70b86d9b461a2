//! Contour extraction and figure rendering for gridded fields.
//!
//! - Contour lines (marching squares) in geographic coordinates
//! - Filled-contour and contour-lines figures
//! - PNG encoding with text metadata

pub mod contour;
pub mod figure;
pub mod png;

pub use contour::{extract_contours, generate_contour_levels, validate_levels};
pub use grid_common::{ContourPath, LevelContours};
pub use figure::{render_contour_lines, render_filled_contour, Figure, FigureConfig};
