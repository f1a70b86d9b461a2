//! Loader: reads the selected variables for the analysis window, sums them,
//! reduces the time steps and returns a single grid.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use grid_common::time::mean_time;
use grid_common::{AnalysisWindow, ContourError, ContourResult, Grid};
use tracing::{debug, info};

use crate::error::NetCdfError;
use crate::source::GridSource;

/// Temporal reduction applied when the window holds several time steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Aggregation {
    #[default]
    Mean,
    Min,
    Max,
}

impl FromStr for Aggregation {
    type Err = ContourError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            other => Err(ContourError::invalid_parameter(
                "func",
                format!("'{}' is not one of mean, min, max", other),
            )),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mean => "mean",
            Self::Min => "min",
            Self::Max => "max",
        };
        f.write_str(name)
    }
}

/// What to load.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    /// Variables summed cell by cell.
    pub variables: Vec<String>,
    pub window: AnalysisWindow,
    pub aggregation: Aggregation,
    /// Applied after aggregation.
    pub scale: f32,
}

/// Loader output.
#[derive(Debug, Clone)]
pub struct LoadedGrid {
    pub grid: Grid,
    /// Mean of the selected time stamps (window start when the dataset has no time axis).
    pub time: DateTime<Utc>,
    /// Number of time steps reduced into the grid.
    pub steps: usize,
}

/// Load the summed, time-reduced field described by `request`.
pub fn load_grid<S: GridSource + ?Sized>(
    source: &S,
    request: &LoadRequest,
) -> ContourResult<LoadedGrid> {
    if request.variables.is_empty() {
        return Err(ContourError::invalid_parameter(
            "ncvars",
            "at least one variable is required",
        ));
    }

    info!(source = %source.describe(), variables = ?request.variables, "Reading");

    let axes = source.axes()?;
    let expected = axes.shape();

    let (indices, time) = select_time_steps(&axes.times, &request.window)?;

    let mut summed_steps: Vec<Vec<f32>> = Vec::with_capacity(indices.len());
    for &t in &indices {
        summed_steps.push(sum_variables(source, &request.variables, t, expected)?);
    }

    let mut values = reduce_steps(&summed_steps, request.aggregation);
    if request.scale != 1.0 {
        values.iter_mut().for_each(|v| *v *= request.scale);
    }

    let grid = Grid::new(values, axes.lon, axes.lat)?;

    debug!(
        rows = grid.height(),
        cols = grid.width(),
        steps = indices.len(),
        aggregation = %request.aggregation,
        range = ?grid.value_range(),
        "Loaded grid"
    );

    Ok(LoadedGrid {
        grid,
        time,
        steps: indices.len(),
    })
}

/// Elementwise sum of the named variables at one time step.
///
/// Every slice must have the `expected` (rows, columns) shape.
pub fn sum_variables<S: GridSource + ?Sized>(
    source: &S,
    variables: &[String],
    time_index: usize,
    expected: (usize, usize),
) -> ContourResult<Vec<f32>> {
    let mut sum: Option<Vec<f32>> = None;

    for name in variables {
        let slice = source.read_slice(name, time_index)?;
        if slice.shape != expected || slice.values.len() != expected.0 * expected.1 {
            return Err(NetCdfError::ShapeMismatch {
                variable: name.clone(),
                expected,
                found: slice.shape,
            }
            .into());
        }

        match sum.as_mut() {
            None => sum = Some(slice.values),
            Some(acc) => acc
                .iter_mut()
                .zip(slice.values)
                .for_each(|(a, v)| *a += v),
        }
    }

    sum.ok_or_else(|| ContourError::invalid_parameter("ncvars", "no variables given"))
}

/// Indices of the time steps inside the window and their mean time.
fn select_time_steps(
    times: &[DateTime<Utc>],
    window: &AnalysisWindow,
) -> ContourResult<(Vec<usize>, DateTime<Utc>)> {
    match times.len() {
        0 => Ok((vec![0], window.start)),
        1 => Ok((vec![0], times[0])),
        _ => {
            let indices: Vec<usize> = times
                .iter()
                .enumerate()
                .filter(|(_, t)| window.contains(t))
                .map(|(i, _)| i)
                .collect();

            let selected: Vec<DateTime<Utc>> = indices.iter().map(|&i| times[i]).collect();
            let mean = mean_time(&selected).ok_or_else(|| {
                ContourError::DataAccess(format!(
                    "no time steps between {} and {} (dataset covers {} to {})",
                    window.start,
                    window.end,
                    times[0],
                    times[times.len() - 1]
                ))
            })?;
            Ok((indices, mean))
        }
    }
}

/// Reduce per-step fields cell by cell, skipping NaN.
///
/// A cell that is NaN at every step stays NaN.
pub fn reduce_steps(steps: &[Vec<f32>], aggregation: Aggregation) -> Vec<f32> {
    let Some(first) = steps.first() else {
        return Vec::new();
    };
    if steps.len() == 1 {
        return first.clone();
    }

    (0..first.len())
        .map(|i| {
            let valid = steps.iter().map(|s| s[i]).filter(|v| !v.is_nan());
            match aggregation {
                Aggregation::Mean => {
                    let (sum, n) = valid.fold((0.0f64, 0usize), |(s, n), v| (s + v as f64, n + 1));
                    if n == 0 {
                        f32::NAN
                    } else {
                        (sum / n as f64) as f32
                    }
                }
                Aggregation::Min => valid.fold(f32::NAN, f32::min),
                Aggregation::Max => valid.fold(f32::NAN, f32::max),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use chrono::TimeZone;

    fn hourly(day: u32, hours: u32) -> Vec<DateTime<Utc>> {
        (0..hours)
            .map(|h| Utc.with_ymd_and_hms(2020, 1, day, h, 30, 0).unwrap())
            .collect()
    }

    fn window(day: u32) -> AnalysisWindow {
        AnalysisWindow::from_date_parts(Some(2020), Some(1), Some(day), 24, Utc::now()).unwrap()
    }

    #[test]
    fn test_aggregation_parse() {
        assert_eq!("MAX".parse::<Aggregation>().unwrap(), Aggregation::Max);
        assert!("median".parse::<Aggregation>().is_err());
    }

    #[test]
    fn test_reduce_steps_skips_nan() {
        let steps = vec![vec![1.0, f32::NAN, f32::NAN], vec![3.0, 4.0, f32::NAN]];
        let mean = reduce_steps(&steps, Aggregation::Mean);
        assert_eq!(mean[0], 2.0);
        assert_eq!(mean[1], 4.0);
        assert!(mean[2].is_nan());

        assert_eq!(reduce_steps(&steps, Aggregation::Min)[0], 1.0);
        assert_eq!(reduce_steps(&steps, Aggregation::Max)[0], 3.0);
    }

    #[test]
    fn test_window_selects_day() {
        let mut times = hourly(1, 24);
        times.extend(hourly(2, 24));
        let source = MemorySource::new(vec![0.0], vec![0.0], times.clone()).with_field(
            "pm25",
            (0..48).map(|i| vec![if i < 24 { 1.0 } else { 5.0 }]).collect(),
        );

        let loaded = load_grid(
            &source,
            &LoadRequest {
                variables: vec!["pm25".into()],
                window: window(2),
                aggregation: Aggregation::Mean,
                scale: 2.0,
            },
        )
        .unwrap();

        assert_eq!(loaded.steps, 24);
        assert_eq!(loaded.grid.values(), &[10.0]);
        assert_eq!(loaded.time, Utc.with_ymd_and_hms(2020, 1, 2, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_window_outside_dataset_is_data_access_error() {
        let source = MemorySource::new(vec![0.0], vec![0.0], hourly(1, 24))
            .with_field("pm25", vec![vec![1.0]; 24]);
        let result = load_grid(
            &source,
            &LoadRequest {
                variables: vec!["pm25".into()],
                window: window(5),
                aggregation: Aggregation::Mean,
                scale: 1.0,
            },
        );
        assert!(matches!(result, Err(ContourError::DataAccess(_))));
    }

    #[test]
    fn test_missing_variable_is_data_access_error() {
        let source = MemorySource::new(vec![0.0], vec![0.0], vec![]).with_field("a", vec![vec![1.0]]);
        let result = load_grid(
            &source,
            &LoadRequest {
                variables: vec!["a".into(), "nope".into()],
                window: window(1),
                aggregation: Aggregation::Mean,
                scale: 1.0,
            },
        );
        assert!(matches!(result, Err(ContourError::DataAccess(_))));
    }
}
