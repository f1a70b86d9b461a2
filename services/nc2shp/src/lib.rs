//! nc2shp: contour a netCDF field into a polyline shapefile.
//!
//! The run is a straight pipeline: load and sum the selected variables over
//! the analysis window, re-center and crop, extract contours at the requested
//! levels, write them to a shapefile and optionally render figures.

pub mod config;
pub mod pipeline;

pub use config::RunConfig;
pub use pipeline::{analysis_window, execute, open_source, run, RunSummary};
