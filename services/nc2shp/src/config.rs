//! Run configuration.
//!
//! Values come from three layers: built-in defaults, an optional YAML run
//! file, then command-line flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use grid_common::{validate_template, BoundingBox, ContourError, ContourResult};
use netcdf_parser::Aggregation;
use renderer::validate_levels;
use serde::{Deserialize, Serialize};

/// GEOS-CF hourly chemistry collection on OPeNDAP.
pub const DEFAULT_INPUT: &str =
    "https://opendap.nccs.nasa.gov/dods/gmao/geos-cf/assim/chm_tavg_1hr_g1440x721_v1";

/// Everything one run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Local path or OPeNDAP URL; may hold date placeholders.
    pub input: String,

    /// Run date; missing parts fall back to yesterday (UTC).
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,

    /// Analysis window length in hours.
    pub time_window: u32,

    /// Variables summed cell by cell.
    pub variables: Vec<String>,

    /// Factor applied after temporal aggregation.
    pub scale: f32,

    /// Temporal aggregation: mean, min or max.
    pub func: String,

    /// Contour levels, in output order.
    pub levels: Vec<f64>,

    /// When set, levels are generated as multiples of this across the data
    /// range and `levels` is ignored.
    pub interval: Option<f64>,

    /// Chaikin smoothing passes per path.
    pub smooth: u32,

    /// Shapefile path template.
    pub shapefile: String,

    /// Extra attribute repeating the level.
    pub propname: Option<String>,

    /// Filled-contour figure path template.
    pub figure: Option<String>,

    /// Level painted in the filled figure; defaults to the first level.
    pub fill_level: Option<f64>,

    /// Figure title template.
    pub title: Option<String>,

    /// Contour-lines figure path template.
    pub contour_figure: Option<String>,

    /// Longitude placed at the center of the grid.
    pub central_longitude: Option<f64>,

    /// Crop box: west, east, south, north.
    pub extent: Option<[f64; 4]>,

    /// TrueType font for drawing the title.
    pub font: Option<PathBuf>,

    pub figure_width: u32,
    pub figure_height: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input: DEFAULT_INPUT.to_string(),
            year: None,
            month: None,
            day: None,
            time_window: 24,
            variables: vec!["pm25_rh35_gcc".to_string()],
            scale: 1.0,
            func: "mean".to_string(),
            levels: vec![10.0, 25.0],
            interval: None,
            smooth: 0,
            shapefile: "pm25_%Y%m%d.shp".to_string(),
            propname: Some("pm25".to_string()),
            figure: None,
            fill_level: None,
            title: None,
            contour_figure: None,
            central_longitude: None,
            extent: None,
            font: None,
            figure_width: 720,
            figure_height: 360,
        }
    }
}

impl RunConfig {
    /// Load a YAML run file. Missing keys keep their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read run file: {:?}", path))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse run file: {:?}", path))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn aggregation(&self) -> ContourResult<Aggregation> {
        self.func.parse()
    }

    pub fn bbox(&self) -> ContourResult<Option<BoundingBox>> {
        self.extent
            .map(|e| {
                BoundingBox::from_extent(&e)
                    .map_err(|err| ContourError::invalid_parameter("extent", err.to_string()))
            })
            .transpose()
    }

    /// Check everything that can be checked before touching the data.
    pub fn validate(&self) -> ContourResult<()> {
        if self.input.trim().is_empty() {
            return Err(ContourError::invalid_parameter("ifile", "input is empty"));
        }
        if let Some(month) = self.month {
            if !(1..=12).contains(&month) {
                return Err(ContourError::invalid_parameter(
                    "month",
                    format!("{} is not in 1..=12", month),
                ));
            }
        }
        if let Some(day) = self.day {
            if !(1..=31).contains(&day) {
                return Err(ContourError::invalid_parameter(
                    "day",
                    format!("{} is not in 1..=31", day),
                ));
            }
        }
        if self.time_window == 0 {
            return Err(ContourError::invalid_parameter(
                "time-window",
                "window must be at least one hour",
            ));
        }
        if self.variables.is_empty() {
            return Err(ContourError::invalid_parameter(
                "ncvars",
                "at least one variable is required",
            ));
        }
        if !self.scale.is_finite() {
            return Err(ContourError::invalid_parameter(
                "ncscal",
                "scale factor must be finite",
            ));
        }
        self.aggregation()?;
        self.bbox()?;

        if let Some(c) = self.central_longitude {
            if !c.is_finite() {
                return Err(ContourError::invalid_parameter(
                    "central-longitude",
                    "must be finite",
                ));
            }
        }

        match self.interval {
            Some(interval) if !(interval.is_finite() && interval > 0.0) => {
                return Err(ContourError::invalid_parameter(
                    "interval",
                    format!("{} is not a positive number", interval),
                ));
            }
            Some(_) => {}
            None => {
                validate_levels(&self.levels)?;
                if let (Some(fill), Some(_)) = (self.fill_level, &self.figure) {
                    if !self.levels.contains(&fill) {
                        return Err(ContourError::RenderError(format!(
                            "fill level {} is not one of the contour levels {:?}",
                            fill, self.levels
                        )));
                    }
                }
            }
        }

        if self.figure_width == 0 || self.figure_height == 0 {
            return Err(ContourError::invalid_parameter(
                "figure-size",
                "width and height must be positive",
            ));
        }

        validate_template(&self.input)?;
        validate_template(&self.shapefile)?;
        for template in [&self.figure, &self.title, &self.contour_figure]
            .into_iter()
            .flatten()
        {
            validate_template(template)?;
        }

        Ok(())
    }
}
