//! Common types shared across the nc2shp workspace: the lat/lon grid, the
//! bounding box, the error taxonomy and run-date handling.

pub mod bbox;
pub mod contours;
pub mod error;
pub mod grid;
pub mod time;

pub use bbox::{BboxParseError, BoundingBox};
pub use contours::{ContourPath, LevelContours};
pub use error::{ContourError, ContourResult};
pub use grid::Grid;
pub use time::{mean_time, resolve_template, validate_template, AnalysisWindow};
