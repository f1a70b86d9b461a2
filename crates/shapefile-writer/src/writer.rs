//! Polyline shapefile writer.

use std::path::{Path, PathBuf};

use grid_common::{ContourError, ContourResult, LevelContours};
use serde::Serialize;
use shapefile::dbase::{self, FieldName, FieldValue, TableWriterBuilder};
use shapefile::{Point, Polyline};
use tracing::{debug, info};

use crate::{shp_path, CLOSED_FIELD, LEVEL_FIELD};

/// Width and precision of numeric attribute fields. Values are written in
/// fixed notation, so 15 decimals keep levels such as 2.5e-9 intact.
const NUMERIC_WIDTH: u8 = 24;
const NUMERIC_DECIMALS: u8 = 15;

/// dBase field names are at most 10 ASCII characters.
const MAX_FIELD_NAME_LEN: usize = 10;

/// Writer options.
#[derive(Debug, Clone, Default)]
pub struct ShapefileOptions {
    /// Extra numeric field repeating the level under a domain name
    /// (for example `pm25`). Ignored when it equals the level field.
    pub property_name: Option<String>,
}

/// What was written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapefileSummary {
    /// Path of the `.shp` member.
    pub path: PathBuf,
    pub records: usize,
    /// (level, record count) in level order.
    pub records_per_level: Vec<(f64, usize)>,
}

/// Write every path of every level as one polyline record.
///
/// Records follow level order, then path order. All vertices are checked
/// before any file is created; a non-finite coordinate is a write error.
/// Existing files at the same stem are overwritten.
pub fn write_contours(
    path: &Path,
    contours: &[LevelContours],
    options: &ShapefileOptions,
) -> ContourResult<ShapefileSummary> {
    validate_paths(contours)?;
    let property = extra_field(options)?;

    let shp = shp_path(path);
    let mut writer = shapefile::Writer::from_path(&shp, table_builder(property.as_deref())?)
        .map_err(|e| write_error(&shp, e))?;

    let mut records = 0;
    let mut records_per_level = Vec::with_capacity(contours.len());

    for level in contours {
        for contour in &level.paths {
            let points: Vec<Point> = contour
                .vertices
                .iter()
                .map(|&(lon, lat)| Point::new(lon, lat))
                .collect();
            let shape = Polyline::new(points);

            let mut record = dbase::Record::default();
            record.insert(
                LEVEL_FIELD.to_string(),
                FieldValue::Numeric(Some(level.level)),
            );
            record.insert(
                CLOSED_FIELD.to_string(),
                FieldValue::Logical(Some(contour.closed)),
            );
            if let Some(name) = &property {
                record.insert(name.clone(), FieldValue::Numeric(Some(level.level)));
            }

            writer
                .write_shape_and_record(&shape, &record)
                .map_err(|e| write_error(&shp, e))?;
            records += 1;
        }

        debug!(level = level.level, paths = level.paths.len(), "Wrote level");
        records_per_level.push((level.level, level.paths.len()));
    }

    // headers are finalized when the writer is dropped
    drop(writer);

    info!(path = %shp.display(), records = records, "Shapefile written");

    Ok(ShapefileSummary {
        path: shp,
        records,
        records_per_level,
    })
}

fn validate_paths(contours: &[LevelContours]) -> ContourResult<()> {
    for level in contours {
        if !level.level.is_finite() {
            return Err(ContourError::Write(format!(
                "level {} is not a finite number",
                level.level
            )));
        }
        let text = numeric_text(level.level);
        if text.len() > usize::from(NUMERIC_WIDTH) {
            return Err(ContourError::Write(format!(
                "level {} needs {} characters, the level field holds {}",
                level.level,
                text.len(),
                NUMERIC_WIDTH
            )));
        }
        for (i, path) in level.paths.iter().enumerate() {
            if path.vertices.len() < 2 {
                return Err(ContourError::Write(format!(
                    "path {} of level {} has {} vertices, a polyline needs at least 2",
                    i,
                    level.level,
                    path.vertices.len()
                )));
            }
            if !path.is_finite() {
                return Err(ContourError::Write(format!(
                    "path {} of level {} has a non-finite vertex",
                    i, level.level
                )));
            }
        }
    }
    Ok(())
}

/// The text dBase stores for a numeric attribute.
fn numeric_text(value: f64) -> String {
    format!("{:.*}", usize::from(NUMERIC_DECIMALS), value)
}

/// The extra property field, if it differs from the level field.
fn extra_field(options: &ShapefileOptions) -> ContourResult<Option<String>> {
    let Some(name) = options.property_name.as_deref() else {
        return Ok(None);
    };
    if name.is_empty() || name.len() > MAX_FIELD_NAME_LEN || !name.is_ascii() {
        return Err(ContourError::invalid_parameter(
            "propname",
            format!(
                "'{}' is not a valid attribute name (1-{} ASCII characters)",
                name, MAX_FIELD_NAME_LEN
            ),
        ));
    }
    if name == LEVEL_FIELD || name == CLOSED_FIELD {
        return Ok(None);
    }
    Ok(Some(name.to_string()))
}

fn table_builder(property: Option<&str>) -> ContourResult<TableWriterBuilder> {
    let mut builder = TableWriterBuilder::new()
        .add_numeric_field(field_name(LEVEL_FIELD)?, NUMERIC_WIDTH, NUMERIC_DECIMALS)
        .add_logical_field(field_name(CLOSED_FIELD)?);
    if let Some(name) = property {
        builder = builder.add_numeric_field(field_name(name)?, NUMERIC_WIDTH, NUMERIC_DECIMALS);
    }
    Ok(builder)
}

fn field_name(name: &str) -> ContourResult<FieldName> {
    FieldName::try_from(name).map_err(|e| {
        ContourError::invalid_parameter("propname", format!("'{}': {:?}", name, e))
    })
}

fn write_error(path: &Path, err: impl std::fmt::Display) -> ContourError {
    ContourError::Write(format!("{}: {}", path.display(), err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_common::ContourPath;

    fn level(level: f64, vertices: Vec<(f64, f64)>) -> LevelContours {
        LevelContours {
            level,
            paths: vec![ContourPath {
                vertices,
                closed: false,
            }],
        }
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        let bad = level(1.0, vec![(0.0, 0.0), (f64::INFINITY, 1.0)]);
        assert!(matches!(
            validate_paths(&[bad]),
            Err(ContourError::Write(_))
        ));
    }

    #[test]
    fn test_validate_rejects_single_vertex() {
        let bad = level(1.0, vec![(0.0, 0.0)]);
        assert!(matches!(
            validate_paths(&[bad]),
            Err(ContourError::Write(_))
        ));
    }

    #[test]
    fn test_level_must_fit_field_width() {
        let huge = level(1e12, vec![(0.0, 0.0), (1.0, 1.0)]);
        assert!(matches!(
            validate_paths(&[huge]),
            Err(ContourError::Write(_))
        ));
        let wide = level(-9_999_999.5, vec![(0.0, 0.0), (1.0, 1.0)]);
        validate_paths(&[wide]).unwrap();
    }

    #[test]
    fn test_numeric_text_keeps_small_levels() {
        assert_eq!(numeric_text(2.5e-9), "0.000000002500000");
        assert_eq!(numeric_text(0.1234567891).parse::<f64>().unwrap(), 0.1234567891);
    }

    #[test]
    fn test_extra_field() {
        let opts = |name: &str| ShapefileOptions {
            property_name: Some(name.to_string()),
        };
        assert_eq!(extra_field(&opts("pm25")).unwrap(), Some("pm25".to_string()));
        assert_eq!(extra_field(&opts("level")).unwrap(), None);
        assert_eq!(extra_field(&ShapefileOptions::default()).unwrap(), None);
        assert!(extra_field(&opts("much_too_long_name")).is_err());
        assert!(extra_field(&opts("")).is_err());
    }
}
