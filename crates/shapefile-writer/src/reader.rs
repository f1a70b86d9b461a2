//! Reading contour shapefiles back.

use std::path::{Path, PathBuf};

use grid_common::{ContourError, ContourResult};
use shapefile::dbase::{self, FieldValue};
use shapefile::Polyline;

use crate::{shp_path, CLOSED_FIELD, LEVEL_FIELD};

/// One polyline record of a contour shapefile.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourRecord {
    pub level: f64,
    /// None for files written without the closed flag.
    pub closed: Option<bool>,
    /// Vertices of all parts, in order.
    pub vertices: Vec<(f64, f64)>,
}

/// Load every record of a polyline shapefile written by
/// [`write_contours`](crate::write_contours).
pub fn read_contour_records(path: &Path) -> ContourResult<Vec<ContourRecord>> {
    let shp: PathBuf = shp_path(path);
    let shapes = shapefile::read_as::<_, Polyline, dbase::Record>(&shp).map_err(|e| {
        ContourError::DataAccess(format!("cannot read {}: {}", shp.display(), e))
    })?;

    shapes
        .into_iter()
        .enumerate()
        .map(|(i, (polyline, record))| {
            let level = match record.get(LEVEL_FIELD) {
                Some(FieldValue::Numeric(Some(v))) => *v,
                other => {
                    return Err(ContourError::DataAccess(format!(
                        "record {} of {} has no numeric '{}' field (found {:?})",
                        i,
                        shp.display(),
                        LEVEL_FIELD,
                        other
                    )))
                }
            };
            let closed = match record.get(CLOSED_FIELD) {
                Some(FieldValue::Logical(flag)) => *flag,
                _ => None,
            };
            let vertices = polyline
                .parts()
                .iter()
                .flatten()
                .map(|p| (p.x, p.y))
                .collect();

            Ok(ContourRecord {
                level,
                closed,
                vertices,
            })
        })
        .collect()
}
