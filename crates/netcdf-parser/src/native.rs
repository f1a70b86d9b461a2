//! Native NetCDF reading using the netcdf library.
//!
//! Opens local files or OPeNDAP URLs through libnetcdf and serves 2-D
//! (lat, lon) slices of gridded model output such as GEOS-CF collections.
//!
//! Remote reads block until libnetcdf returns; no timeout is applied.

use std::sync::Once;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::{NetCdfError, NetCdfResult};
use crate::source::{DatasetAxes, FieldSlice, GridSource};
use crate::time_axis::CfTimeUnits;

const LON_NAMES: &[&str] = &["lon", "longitude", "x"];
const LAT_NAMES: &[&str] = &["lat", "latitude", "y"];
const TIME_NAMES: &[&str] = &["time", "t"];

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist).
///
/// Call this early in `main()` before any HDF5/NetCDF operations occur. Safe to
/// call multiple times.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// A netCDF dataset opened from a path or OPeNDAP URL.
///
/// The underlying handle is closed when the source is dropped.
pub struct NetCdfSource {
    location: String,
    file: netcdf::File,
    lon_name: String,
    lat_name: String,
    time_name: Option<String>,
}

impl NetCdfSource {
    /// Open a dataset and locate its coordinate variables.
    pub fn open(location: &str) -> NetCdfResult<Self> {
        silence_hdf5_errors();

        let file = netcdf::open(location).map_err(|e| {
            NetCdfError::InvalidFormat(format!("Failed to open NetCDF '{}': {}", location, e))
        })?;

        let lon_name = find_variable(&file, LON_NAMES)
            .ok_or_else(|| NetCdfError::MissingData("longitude coordinate".to_string()))?;
        let lat_name = find_variable(&file, LAT_NAMES)
            .ok_or_else(|| NetCdfError::MissingData("latitude coordinate".to_string()))?;
        let time_name = find_variable(&file, TIME_NAMES);

        debug!(
            location = location,
            lon = %lon_name,
            lat = %lat_name,
            time = ?time_name,
            "Opened NetCDF dataset"
        );

        Ok(Self {
            location: location.to_string(),
            file,
            lon_name,
            lat_name,
            time_name,
        })
    }

    fn read_coordinate(&self, name: &str) -> NetCdfResult<Vec<f64>> {
        let var = self
            .file
            .variable(name)
            .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", name)))?;
        var.get_values::<f64, _>(..)
            .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to read {}: {}", name, e)))
    }

    fn read_times(&self) -> NetCdfResult<Vec<DateTime<Utc>>> {
        let Some(name) = &self.time_name else {
            return Ok(Vec::new());
        };
        let var = self
            .file
            .variable(name)
            .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", name)))?;
        let units = get_string_attr(&var, "units")
            .ok_or_else(|| NetCdfError::MissingData(format!("units attribute of '{}'", name)))?;
        let offsets = self.read_coordinate(name)?;
        CfTimeUnits::parse(&units)?.decode(&offsets)
    }
}

impl GridSource for NetCdfSource {
    fn describe(&self) -> String {
        self.location.clone()
    }

    fn axes(&self) -> NetCdfResult<DatasetAxes> {
        Ok(DatasetAxes {
            lon: self.read_coordinate(&self.lon_name)?,
            lat: self.read_coordinate(&self.lat_name)?,
            times: self.read_times()?,
        })
    }

    fn read_slice(&self, variable: &str, time_index: usize) -> NetCdfResult<FieldSlice> {
        let var = self
            .file
            .variable(variable)
            .ok_or_else(|| NetCdfError::MissingData(format!("variable '{}'", variable)))?;

        let mut start = Vec::new();
        let mut count = Vec::new();
        let mut lat_pos = None;
        let mut lon_pos = None;
        let mut rows = 0;
        let mut cols = 0;

        for (pos, dim) in var.dimensions().iter().enumerate() {
            let name = dim.name();
            let len = dim.len();
            if name == self.lat_name {
                lat_pos = Some(pos);
                rows = len;
                start.push(0);
                count.push(len);
            } else if name == self.lon_name {
                lon_pos = Some(pos);
                cols = len;
                start.push(0);
                count.push(len);
            } else if self.time_name.as_deref() == Some(name.as_str()) {
                if time_index >= len {
                    return Err(NetCdfError::MissingData(format!(
                        "time index {} of '{}' (only {} steps)",
                        time_index, variable, len
                    )));
                }
                start.push(time_index);
                count.push(1);
            } else {
                if len > 1 {
                    warn!(
                        variable = variable,
                        dimension = %name,
                        len = len,
                        "Using first index of non-singleton dimension"
                    );
                }
                start.push(0);
                count.push(1);
            }
        }

        let (Some(lat_pos), Some(lon_pos)) = (lat_pos, lon_pos) else {
            return Err(NetCdfError::InvalidFormat(format!(
                "variable '{}' is not defined on ({}, {})",
                variable, self.lat_name, self.lon_name
            )));
        };

        let raw: Vec<f32> = var
            .get_values::<f32, _>((start.as_slice(), count.as_slice()))
            .map_err(|e| {
                NetCdfError::InvalidFormat(format!("Failed to read {}: {}", variable, e))
            })?;

        let scale_factor = get_f32_attr(&var, "scale_factor").unwrap_or(1.0);
        let add_offset = get_f32_attr(&var, "add_offset").unwrap_or(0.0);
        let fill_values: Vec<f32> = ["_FillValue", "missing_value"]
            .iter()
            .filter_map(|name| get_f32_attr(&var, name))
            .collect();

        let unpacked = raw.iter().map(|&val| {
            if val.is_nan() || fill_values.contains(&val) {
                f32::NAN
            } else {
                val * scale_factor + add_offset
            }
        });

        let values: Vec<f32> = if lat_pos < lon_pos {
            unpacked.collect()
        } else {
            // stored as (lon, lat): transpose to row-major (lat, lon)
            let column_major: Vec<f32> = unpacked.collect();
            let mut values = vec![f32::NAN; rows * cols];
            for c in 0..cols {
                for r in 0..rows {
                    values[r * cols + c] = column_major[c * rows + r];
                }
            }
            values
        };

        Ok(FieldSlice {
            values,
            shape: (rows, cols),
        })
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

fn find_variable(file: &netcdf::File, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find(|name| file.variable(name).is_some())
        .map(|name| name.to_string())
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Helper to get f32 attribute.
fn get_f32_attr(var: &netcdf::Variable, name: &str) -> Option<f32> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f32::try_from(attr_value).ok()
}

/// Helper to get string attribute.
fn get_string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}
