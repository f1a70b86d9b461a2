//! NetCDF reading for gridded atmospheric chemistry output.
//!
//! Reads local netCDF files or OPeNDAP endpoints (e.g. GEOS-CF collections),
//! decodes CF time axes and produces a single [`Grid`](grid_common::Grid) for
//! an analysis window, summing several variables when asked.
//!
//! # Data layout
//!
//! Variables are expected on `(time, [lev,] lat, lon)`. Extra dimensions such
//! as a single model level are squeezed by taking their first index.

pub mod error;
pub mod loader;
pub mod native;
pub mod source;
pub mod time_axis;

pub use error::{NetCdfError, NetCdfResult};
pub use loader::{load_grid, Aggregation, LoadRequest, LoadedGrid};
pub use native::{silence_hdf5_errors, NetCdfSource};
pub use source::{DatasetAxes, FieldSlice, GridSource, MemorySource};
pub use time_axis::CfTimeUnits;
