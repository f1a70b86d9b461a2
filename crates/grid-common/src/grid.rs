//! Regular latitude/longitude grid of scalar values.

use serde::{Deserialize, Serialize};

use crate::error::{ContourError, ContourResult};

/// A 2-D field indexed by (latitude row, longitude column).
///
/// `values` is row-major: row `r` holds the cells at `lat[r]`, one per entry
/// of `lon`. Missing cells are NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    values: Vec<f32>,
    lon: Vec<f64>,
    lat: Vec<f64>,
}

impl Grid {
    /// Create a grid, checking that the value count matches the coordinates.
    pub fn new(values: Vec<f32>, lon: Vec<f64>, lat: Vec<f64>) -> ContourResult<Self> {
        if values.len() != lon.len() * lat.len() {
            return Err(ContourError::ShapeMismatch {
                variable: "grid".to_string(),
                expected: (lat.len(), lon.len()),
                found: (
                    if lon.is_empty() { 0 } else { values.len() / lon.len() },
                    lon.len(),
                ),
            });
        }
        Ok(Self { values, lon, lat })
    }

    /// Grid with every cell set to `value`.
    pub fn filled(value: f32, lon: Vec<f64>, lat: Vec<f64>) -> Self {
        let values = vec![value; lon.len() * lat.len()];
        Self { values, lon, lat }
    }

    /// Number of longitude columns.
    pub fn width(&self) -> usize {
        self.lon.len()
    }

    /// Number of latitude rows.
    pub fn height(&self) -> usize {
        self.lat.len()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn lon(&self) -> &[f64] {
        &self.lon
    }

    pub fn lat(&self) -> &[f64] {
        &self.lat
    }

    /// Value at (row, col), or None outside the grid.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.height() || col >= self.width() {
            return None;
        }
        self.values.get(row * self.width() + col).copied()
    }

    /// Consume the grid, returning (values, lon, lat).
    pub fn into_parts(self) -> (Vec<f32>, Vec<f64>, Vec<f64>) {
        (self.values, self.lon, self.lat)
    }

    /// Min and max over non-NaN cells, or None if every cell is NaN.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.values
            .iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Number of non-NaN cells.
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }

    /// Reorder columns: output column `i` is input column `order[i]`.
    ///
    /// `order` must be a permutation or a subset of column indices.
    pub fn select_columns(&self, order: &[usize], new_lon: Vec<f64>) -> Self {
        let width = self.width();
        let mut values = Vec::with_capacity(order.len() * self.height());
        for row in 0..self.height() {
            let offset = row * width;
            values.extend(order.iter().map(|&col| self.values[offset + col]));
        }
        Self {
            values,
            lon: new_lon,
            lat: self.lat.clone(),
        }
    }

    /// Keep only the given rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        let width = self.width();
        let mut values = Vec::with_capacity(rows.len() * width);
        for &row in rows {
            values.extend_from_slice(&self.values[row * width..(row + 1) * width]);
        }
        Self {
            values,
            lon: self.lon.clone(),
            lat: rows.iter().map(|&r| self.lat[r]).collect(),
        }
    }

    /// Multiply every cell by `factor`.
    pub fn scale(&mut self, factor: f32) {
        if factor != 1.0 {
            self.values.iter_mut().for_each(|v| *v *= factor);
        }
    }
}
