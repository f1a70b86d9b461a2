//! Data source abstraction for the loader.
//!
//! The loader only needs coordinate axes and 2-D slices of named variables.
//! `NetCdfSource` serves them from netCDF files or OPeNDAP endpoints,
//! `MemorySource` from in-memory arrays.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::{NetCdfError, NetCdfResult};

/// Coordinate axes of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetAxes {
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    /// Decoded time axis; empty when the dataset has no time dimension.
    pub times: Vec<DateTime<Utc>>,
}

impl DatasetAxes {
    /// Expected (rows, columns) of every field slice.
    pub fn shape(&self) -> (usize, usize) {
        (self.lat.len(), self.lon.len())
    }
}

/// One (lat, lon) slice of a variable.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSlice {
    /// Row-major values; fill values already replaced by NaN.
    pub values: Vec<f32>,
    /// (rows, columns)
    pub shape: (usize, usize),
}

/// Anything that can serve lat/lon slices of named variables.
pub trait GridSource {
    /// Human-readable identifier for logs.
    fn describe(&self) -> String;

    /// Longitude, latitude and time axes.
    fn axes(&self) -> NetCdfResult<DatasetAxes>;

    /// Read the slice of `variable` at `time_index`.
    ///
    /// `time_index` is ignored for variables without a time dimension.
    fn read_slice(&self, variable: &str, time_index: usize) -> NetCdfResult<FieldSlice>;
}

/// In-memory data source.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    axes: Option<DatasetAxes>,
    fields: HashMap<String, MemoryField>,
}

#[derive(Debug, Clone)]
struct MemoryField {
    shape: (usize, usize),
    steps: Vec<Vec<f32>>,
}

impl MemorySource {
    pub fn new(lon: Vec<f64>, lat: Vec<f64>, times: Vec<DateTime<Utc>>) -> Self {
        Self {
            axes: Some(DatasetAxes { lon, lat, times }),
            fields: HashMap::new(),
        }
    }

    /// Add a variable with one row-major slice per time step, shaped like the axes.
    pub fn with_field(self, name: &str, steps: Vec<Vec<f32>>) -> Self {
        let shape = self.axes.as_ref().map(|a| a.shape()).unwrap_or((0, 0));
        self.with_shaped_field(name, shape, steps)
    }

    /// Add a variable with an explicit (rows, columns) shape.
    pub fn with_shaped_field(
        mut self,
        name: &str,
        shape: (usize, usize),
        steps: Vec<Vec<f32>>,
    ) -> Self {
        self.fields
            .insert(name.to_string(), MemoryField { shape, steps });
        self
    }
}

impl GridSource for MemorySource {
    fn describe(&self) -> String {
        format!("memory ({} variables)", self.fields.len())
    }

    fn axes(&self) -> NetCdfResult<DatasetAxes> {
        self.axes
            .clone()
            .ok_or_else(|| NetCdfError::MissingData("coordinate axes".to_string()))
    }

    fn read_slice(&self, variable: &str, time_index: usize) -> NetCdfResult<FieldSlice> {
        let field = self
            .fields
            .get(variable)
            .ok_or_else(|| NetCdfError::MissingData(format!("variable '{}'", variable)))?;

        let step = if field.steps.len() == 1 { 0 } else { time_index };
        let values = field.steps.get(step).ok_or_else(|| {
            NetCdfError::MissingData(format!("time index {} of '{}'", time_index, variable))
        })?;

        Ok(FieldSlice {
            values: values.clone(),
            shape: field.shape,
        })
    }
}
