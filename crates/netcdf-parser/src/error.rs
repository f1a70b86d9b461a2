//! Error types for NetCDF reading operations.

use grid_common::ContourError;
use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF reading.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Missing required variable, dimension or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Field shape differs from the dataset's lat/lon grid
    #[error("Variable '{variable}' has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        variable: String,
        expected: (usize, usize),
        found: (usize, usize),
    },
}

impl From<NetCdfError> for ContourError {
    fn from(err: NetCdfError) -> Self {
        match err {
            NetCdfError::ShapeMismatch {
                variable,
                expected,
                found,
            } => ContourError::ShapeMismatch {
                variable,
                expected,
                found,
            },
            other => ContourError::DataAccess(other.to_string()),
        }
    }
}
