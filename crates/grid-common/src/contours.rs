//! Contour paths shared by the extractor, the shapefile writer and the
//! figure renderer.

use serde::{Deserialize, Serialize};

/// One contour path in geographic coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourPath {
    /// (longitude, latitude) vertices. Closed paths repeat the first vertex
    /// at the end.
    pub vertices: Vec<(f64, f64)>,
    pub closed: bool,
}

impl ContourPath {
    /// Whether every coordinate is a finite number.
    pub fn is_finite(&self) -> bool {
        self.vertices
            .iter()
            .all(|(lon, lat)| lon.is_finite() && lat.is_finite())
    }
}

/// All paths extracted for one level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelContours {
    pub level: f64,
    pub paths: Vec<ContourPath>,
}

impl LevelContours {
    pub fn vertex_count(&self) -> usize {
        self.paths.iter().map(|p| p.vertices.len()).sum()
    }
}
