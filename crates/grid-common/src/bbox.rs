//! Geographic bounding box used to crop a grid before contouring.

use serde::{Deserialize, Serialize};

/// A geographic bounding box in absolute degrees.
///
/// `west` may be greater than 180 or less than -180; longitudes are matched
/// modulo 360 against the grid axis. `east - west` is the box width and must
/// not be negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl BoundingBox {
    /// Create a new bounding box from its four edges.
    pub fn new(west: f64, east: f64, south: f64, north: f64) -> Self {
        Self {
            west,
            east,
            south,
            north,
        }
    }

    /// Build from the `[west, east, south, north]` order used on the command line.
    pub fn from_extent(extent: &[f64]) -> Result<Self, BboxParseError> {
        if extent.len() != 4 {
            return Err(BboxParseError::WrongCount(extent.len()));
        }
        let bbox = Self::new(extent[0], extent[1], extent[2], extent[3]);
        bbox.validate()?;
        Ok(bbox)
    }

    /// Parse a "west,east,south,north" string.
    pub fn from_extent_string(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let values = parts
            .iter()
            .map(|p| {
                p.parse::<f64>()
                    .map_err(|_| BboxParseError::InvalidNumber(p.to_string()))
            })
            .collect::<Result<Vec<f64>, _>>()?;

        Self::from_extent(&values)
    }

    /// Check edge ordering and finiteness.
    pub fn validate(&self) -> Result<(), BboxParseError> {
        let edges = [self.west, self.east, self.south, self.north];
        if edges.iter().any(|v| !v.is_finite()) {
            return Err(BboxParseError::NonFinite);
        }
        if self.east < self.west {
            return Err(BboxParseError::Inverted(format!(
                "east {} < west {}",
                self.east, self.west
            )));
        }
        if self.north < self.south {
            return Err(BboxParseError::Inverted(format!(
                "north {} < south {}",
                self.north, self.south
            )));
        }
        Ok(())
    }

    /// Longitudinal width in degrees.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Latitudinal height in degrees.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Central longitude of the box.
    pub fn center_lon(&self) -> f64 {
        (self.west + self.east) / 2.0
    }

    /// Inclusive latitude test.
    pub fn contains_lat(&self, lat: f64) -> bool {
        lat >= self.south && lat <= self.north
    }

    /// Inclusive longitude test without any wrapping.
    pub fn contains_lon(&self, lon: f64) -> bool {
        lon >= self.west && lon <= self.east
    }

    /// Check if a point is contained within this bbox (no wrapping).
    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        self.contains_lon(lon) && self.contains_lat(lat)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid extent format: {0}. Expected 'west,east,south,north'")]
    InvalidFormat(String),

    #[error("Invalid number in extent: {0}")]
    InvalidNumber(String),

    #[error("Extent needs 4 values (west east south north), got {0}")]
    WrongCount(usize),

    #[error("Extent edges must be finite")]
    NonFinite,

    #[error("Inverted extent: {0}")]
    Inverted(String),
}
