//! The contouring run: load, adjust, contour, write.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use grid_common::{resolve_template, AnalysisWindow, ContourError, ContourResult, Grid};
use grid_processor::adjust;
use netcdf_parser::{load_grid, GridSource, LoadRequest, NetCdfSource};
use renderer::{
    extract_contours, generate_contour_levels, render_contour_lines, render_filled_contour,
    FigureConfig, LevelContours,
};
use serde::Serialize;
use shapefile_writer::{write_contours, ShapefileOptions};
use tracing::{debug, info};

use crate::config::RunConfig;

/// What a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub input: String,
    /// Representative time the templates were resolved against.
    pub time: DateTime<Utc>,
    /// Time steps reduced into the grid.
    pub steps: usize,
    /// (rows, columns) after adjustment.
    pub grid_shape: (usize, usize),
    pub levels: Vec<f64>,
    pub shapefile: PathBuf,
    pub records: usize,
    pub records_per_level: Vec<(f64, usize)>,
    pub figure: Option<PathBuf>,
    pub contour_figure: Option<PathBuf>,
}

/// Open a netCDF file or OPeNDAP endpoint.
pub fn open_source(location: &str) -> ContourResult<NetCdfSource> {
    Ok(NetCdfSource::open(location)?)
}

/// Analysis window of `config` relative to `now`.
pub fn analysis_window(config: &RunConfig, now: DateTime<Utc>) -> ContourResult<AnalysisWindow> {
    AnalysisWindow::from_date_parts(
        config.year,
        config.month,
        config.day,
        config.time_window,
        now,
    )
}

/// Validate, open the configured input and run.
pub fn execute(config: &RunConfig) -> ContourResult<RunSummary> {
    config.validate()?;
    let window = analysis_window(config, Utc::now())?;
    let location = resolve_template(&config.input, &window.start)?;
    let source = open_source(&location)?;
    run(config, &window, &source)
}

/// Run the pipeline against an already opened source.
///
/// The configuration is validated before anything is read, so a bad level
/// set or template never leaves output files behind.
pub fn run<S: GridSource + ?Sized>(
    config: &RunConfig,
    window: &AnalysisWindow,
    source: &S,
) -> ContourResult<RunSummary> {
    config.validate()?;
    let aggregation = config.aggregation()?;
    let bbox = config.bbox()?;

    let request = LoadRequest {
        variables: config.variables.clone(),
        window: *window,
        aggregation,
        scale: config.scale,
    };
    let loaded = load_grid(source, &request)?;

    let grid = adjust(loaded.grid, config.central_longitude, bbox.as_ref())?;
    let levels = contour_levels(config, &grid)?;
    let contours = extract_contours(&grid, &levels, config.smooth)?;

    let shapefile_path = PathBuf::from(resolve_template(&config.shapefile, &loaded.time)?);
    let options = ShapefileOptions {
        property_name: config.propname.clone(),
    };
    let written = write_contours(&shapefile_path, &contours, &options)?;

    let figure_config = FigureConfig {
        width: config.figure_width,
        height: config.figure_height,
        extent: bbox,
        ..Default::default()
    };

    let contour_figure = match &config.contour_figure {
        Some(template) => {
            let path = PathBuf::from(resolve_template(template, &loaded.time)?);
            render_contour_lines(&grid, &contours, &figure_config)?.write_png(&path)?;
            Some(path)
        }
        None => None,
    };

    let figure = match &config.figure {
        Some(template) => {
            let path = PathBuf::from(resolve_template(template, &loaded.time)?);
            render_fill_figure(config, &grid, &contours, &levels, &loaded.time, figure_config)?
                .write_png(&path)?;
            Some(path)
        }
        None => None,
    };

    info!(
        shapefile = %written.path.display(),
        records = written.records,
        time = %loaded.time,
        "Run complete"
    );

    Ok(RunSummary {
        input: source.describe(),
        time: loaded.time,
        steps: loaded.steps,
        grid_shape: grid.shape(),
        levels,
        shapefile: written.path,
        records: written.records,
        records_per_level: written.records_per_level,
        figure,
        contour_figure,
    })
}

/// The configured levels, or levels generated from the data range.
fn contour_levels(config: &RunConfig, grid: &Grid) -> ContourResult<Vec<f64>> {
    let Some(interval) = config.interval else {
        return Ok(config.levels.clone());
    };

    let (min, max) = grid.value_range().ok_or_else(|| {
        ContourError::InvalidLevel("grid has no finite values to derive levels from".to_string())
    })?;
    let levels = generate_contour_levels(min as f64, max as f64, interval);
    if levels.is_empty() {
        return Err(ContourError::InvalidLevel(format!(
            "no multiple of {} within the data range {}..{}",
            interval, min, max
        )));
    }

    debug!(interval = interval, count = levels.len(), "Generated levels");
    Ok(levels)
}

fn render_fill_figure(
    config: &RunConfig,
    grid: &Grid,
    contours: &[LevelContours],
    levels: &[f64],
    time: &DateTime<Utc>,
    mut figure_config: FigureConfig,
) -> ContourResult<renderer::Figure> {
    let fill_level = match config.fill_level.or_else(|| levels.first().copied()) {
        Some(level) => level,
        None => return Err(ContourError::InvalidLevel("no contour levels".to_string())),
    };

    figure_config.title = config
        .title
        .as_deref()
        .map(|t| resolve_template(t, time))
        .transpose()?;

    if let Some(font_path) = &config.font {
        let font = std::fs::read(font_path).map_err(|e| {
            ContourError::RenderError(format!("cannot read font {}: {}", font_path.display(), e))
        })?;
        figure_config.font = Some(font);
    }

    render_filled_contour(grid, contours, fill_level, &figure_config)
}
