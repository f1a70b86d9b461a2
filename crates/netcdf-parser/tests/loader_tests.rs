//! Tests for the loader contract: variable summation, shape checks and time
//! selection, using the in-memory source.

use chrono::{TimeZone, Utc};
use grid_common::{AnalysisWindow, ContourError};
use netcdf_parser::{load_grid, Aggregation, LoadRequest, MemorySource};
use test_utils::{global_lat, global_lon};

fn request(variables: &[&str]) -> LoadRequest {
    LoadRequest {
        variables: variables.iter().map(|v| v.to_string()).collect(),
        window: AnalysisWindow::from_date_parts(Some(2020), Some(1), Some(1), 24, Utc::now())
            .unwrap(),
        aggregation: Aggregation::Mean,
        scale: 1.0,
    }
}

// ============================================================================
// Summation
// ============================================================================

#[test]
fn test_sum_of_ones_and_twos_is_threes() {
    let lon = global_lon(8);
    let lat = global_lat(4);
    let n = lon.len() * lat.len();
    let source = MemorySource::new(lon, lat, vec![])
        .with_field("a", vec![vec![1.0; n]])
        .with_field("b", vec![vec![2.0; n]]);

    let loaded = load_grid(&source, &request(&["a", "b"])).unwrap();

    assert_eq!(loaded.grid.shape(), (4, 8));
    assert!(loaded.grid.values().iter().all(|&v| v == 3.0));
}

#[test]
fn test_single_variable_passes_through() {
    let source = MemorySource::new(vec![0.0, 1.0], vec![0.0], vec![])
        .with_field("pm25_rh35_gcc", vec![vec![12.5, 30.0]]);

    let loaded = load_grid(&source, &request(&["pm25_rh35_gcc"])).unwrap();
    assert_eq!(loaded.grid.values(), &[12.5, 30.0]);
}

#[test]
fn test_nan_propagates_through_sum() {
    let source = MemorySource::new(vec![0.0, 1.0], vec![0.0], vec![])
        .with_field("a", vec![vec![f32::NAN, 1.0]])
        .with_field("b", vec![vec![1.0, 1.0]]);

    let loaded = load_grid(&source, &request(&["a", "b"])).unwrap();
    assert!(loaded.grid.values()[0].is_nan());
    assert_eq!(loaded.grid.values()[1], 2.0);
}

#[test]
fn test_incompatible_shapes_rejected() {
    let source = MemorySource::new(vec![0.0, 1.0], vec![0.0, 1.0], vec![])
        .with_field("a", vec![vec![1.0; 4]])
        .with_shaped_field("b", (1, 2), vec![vec![2.0; 2]]);

    let err = load_grid(&source, &request(&["a", "b"])).unwrap_err();
    match err {
        ContourError::ShapeMismatch {
            variable,
            expected,
            found,
        } => {
            assert_eq!(variable, "b");
            assert_eq!(expected, (2, 2));
            assert_eq!(found, (1, 2));
        }
        other => panic!("expected ShapeMismatch, got {other:?}"),
    }
}

#[test]
fn test_empty_variable_list_rejected() {
    let source = MemorySource::new(vec![0.0], vec![0.0], vec![]);
    let err = load_grid(&source, &request(&[])).unwrap_err();
    assert!(matches!(err, ContourError::InvalidParameter { .. }));
}

// ============================================================================
// Time handling
// ============================================================================

#[test]
fn test_max_aggregation_over_window() {
    let times: Vec<_> = (0..4)
        .map(|h| Utc.with_ymd_and_hms(2020, 1, 1, h * 6, 0, 0).unwrap())
        .collect();
    let source = MemorySource::new(vec![0.0], vec![0.0], times)
        .with_field("o3", vec![vec![1.0], vec![7.0], vec![3.0], vec![2.0]]);

    let mut req = request(&["o3"]);
    req.aggregation = Aggregation::Max;
    let loaded = load_grid(&source, &req).unwrap();

    assert_eq!(loaded.grid.values(), &[7.0]);
    assert_eq!(loaded.steps, 4);
    assert_eq!(loaded.time, Utc.with_ymd_and_hms(2020, 1, 1, 9, 0, 0).unwrap());
}

#[test]
fn test_single_time_step_used_regardless_of_window() {
    let stamp = Utc.with_ymd_and_hms(2019, 6, 1, 0, 0, 0).unwrap();
    let source = MemorySource::new(vec![0.0], vec![0.0], vec![stamp]).with_field("a", vec![vec![4.0]]);

    let loaded = load_grid(&source, &request(&["a"])).unwrap();
    assert_eq!(loaded.time, stamp);
    assert_eq!(loaded.grid.values(), &[4.0]);
}
