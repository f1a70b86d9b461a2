//! Tests for contour extraction.

use grid_common::{ContourError, Grid};
use renderer::contour::{
    connect_segments, contour_level, extract_contours, generate_contour_levels, march_squares,
};
use test_utils::{
    assert_approx_eq, assert_coords_approx_eq, constant_values, global_lat, global_lon,
    plume_values, ramp, ramp_values, smooth_field_values,
};

fn ramp_grid() -> Grid {
    Grid::new(
        ramp_values(ramp::WIDTH, ramp::HEIGHT),
        ramp::LON.to_vec(),
        ramp::LAT.to_vec(),
    )
    .unwrap()
}

fn plume_grid(size: usize) -> Grid {
    let center = (size / 2) as f32;
    Grid::new(
        plume_values(size, size, center, center, size as f32 / 6.0, 100.0),
        global_lon(size),
        global_lat(size),
    )
    .unwrap()
}

// ============================================================================
// generate_contour_levels tests
// ============================================================================

#[test]
fn test_generate_contour_levels_basic() {
    let levels = generate_contour_levels(0.0, 100.0, 10.0);
    assert_eq!(
        levels,
        vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0]
    );
}

#[test]
fn test_generate_contour_levels_offset_start() {
    let levels = generate_contour_levels(3.0, 27.0, 5.0);
    assert_eq!(levels, vec![5.0, 10.0, 15.0, 20.0, 25.0]);
}

#[test]
fn test_generate_contour_levels_negative_range() {
    let levels = generate_contour_levels(-20.0, 20.0, 10.0);
    assert_eq!(levels, vec![-20.0, -10.0, 0.0, 10.0, 20.0]);
}

#[test]
fn test_generate_contour_levels_fractional_interval() {
    let levels = generate_contour_levels(0.0, 1.0, 0.25);
    assert_eq!(levels.len(), 5);
    assert_approx_eq!(levels[4], 1.0, 1e-9);
}

#[test]
fn test_generate_contour_levels_invalid_input() {
    assert!(generate_contour_levels(0.0, 100.0, 0.0).is_empty());
    assert!(generate_contour_levels(0.0, 100.0, -10.0).is_empty());
    assert!(generate_contour_levels(100.0, 0.0, 10.0).is_empty());
    assert!(generate_contour_levels(0.0, 100.0, f64::NAN).is_empty());
}

// ============================================================================
// Level validation
// ============================================================================

#[test]
fn test_empty_levels_rejected() {
    let result = extract_contours(&ramp_grid(), &[], 0);
    assert!(matches!(result, Err(ContourError::InvalidLevel(_))));
}

#[test]
fn test_non_finite_level_rejected() {
    for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let result = extract_contours(&ramp_grid(), &[5.0, bad], 0);
        assert!(matches!(result, Err(ContourError::InvalidLevel(_))));
    }
}

// ============================================================================
// Ramp scenario
// ============================================================================

#[test]
fn test_ramp_mid_level_yields_path() {
    let contours = extract_contours(&ramp_grid(), &[ramp::MID_LEVEL], 0).unwrap();
    assert_eq!(contours.len(), 1);
    assert_eq!(contours[0].level, ramp::MID_LEVEL);
    assert!(!contours[0].paths.is_empty());

    // rows 1 and 2 hold 4..7 and 8..11, so the line runs between lat -20 and 20
    let path = &contours[0].paths[0];
    assert!(!path.closed);
    assert_eq!(path.vertices.len(), 4);
    for &(lon, lat) in &path.vertices {
        assert!((0.0..=270.0).contains(&lon));
        assert!(lat > -20.0 && lat < 20.0, "lat {}", lat);
    }
}

#[test]
fn test_ramp_crossings_interpolated_linearly() {
    let contours = extract_contours(&ramp_grid(), &[ramp::MID_LEVEL], 0).unwrap();
    let mut vertices = contours[0].paths[0].vertices.clone();
    vertices.sort_by(|a, b| a.0.total_cmp(&b.0));

    // column 0: 4 at lat -20, 8 at lat 20 -> 7.5 at 15
    assert_coords_approx_eq!((vertices[0].0, vertices[0].1), (0.0, 15.0), 1e-9);
    // column 3: 7 at lat -20, 11 at lat 20 -> 7.5 at -15
    assert_coords_approx_eq!((vertices[3].0, vertices[3].1), (270.0, -15.0), 1e-9);
}

#[test]
fn test_level_above_max_yields_no_paths() {
    let contours = extract_contours(&ramp_grid(), &[15.5, 100.0], 0).unwrap();
    assert_eq!(contours.len(), 2);
    assert!(contours.iter().all(|c| c.paths.is_empty()));
}

#[test]
fn test_level_order_preserved() {
    let levels = [10.5, 2.5, 7.5];
    let contours = extract_contours(&ramp_grid(), &levels, 0).unwrap();
    let out: Vec<f64> = contours.iter().map(|c| c.level).collect();
    assert_eq!(out, levels);
}

// ============================================================================
// Degenerate fields
// ============================================================================

#[test]
fn test_constant_grid_at_level_does_not_fail() {
    let grid = Grid::new(constant_values(5, 5, 3.0), global_lon(5), global_lat(5)).unwrap();
    let contours = extract_contours(&grid, &[3.0], 0).unwrap();
    assert_eq!(contours.len(), 1);
}

#[test]
fn test_single_row_grid_has_no_paths() {
    let grid = Grid::new(vec![0.0, 10.0, 0.0], vec![0.0, 1.0, 2.0], vec![0.0]).unwrap();
    assert!(contour_level(&grid, 5.0, 0).is_empty());
}

#[test]
fn test_nan_cells_skipped() {
    let mut values = ramp_values(4, 4);
    values[5] = f32::NAN;
    let grid = Grid::new(values, ramp::LON.to_vec(), ramp::LAT.to_vec()).unwrap();

    let paths = contour_level(&grid, ramp::MID_LEVEL, 0);
    // the cell touching the NaN corner is skipped, splitting or shortening the line
    let vertices: usize = paths.iter().map(|p| p.vertices.len()).sum();
    assert!(vertices < 4 || paths.len() > 1);
    for path in &paths {
        assert!(path.vertices.iter().all(|v| v.0.is_finite() && v.1.is_finite()));
    }
}

// ============================================================================
// Closed contours
// ============================================================================

#[test]
fn test_plume_gives_single_closed_ring() {
    let grid = plume_grid(24);
    let paths = contour_level(&grid, 50.0, 0);

    assert_eq!(paths.len(), 1);
    let ring = &paths[0];
    assert!(ring.closed);
    assert_eq!(ring.vertices.first(), ring.vertices.last());
    assert!(ring.vertices.len() > 8);
}

#[test]
fn test_nested_rings_for_increasing_levels() {
    let grid = plume_grid(24);
    let contours = extract_contours(&grid, &[25.0, 75.0], 0).unwrap();

    let span = |level: usize| {
        let lons: Vec<f64> = contours[level].paths[0].vertices.iter().map(|v| v.0).collect();
        lons.iter().cloned().fold(f64::MIN, f64::max) - lons.iter().cloned().fold(f64::MAX, f64::min)
    };
    assert!(span(0) > span(1));
}

#[test]
fn test_smoothing_keeps_ring_closed() {
    let grid = plume_grid(24);
    let raw = contour_level(&grid, 50.0, 0);
    let smooth = contour_level(&grid, 50.0, 2);

    assert_eq!(raw.len(), smooth.len());
    assert!(smooth[0].closed);
    assert_eq!(smooth[0].vertices.first(), smooth[0].vertices.last());
    assert!(smooth[0].vertices.len() > raw[0].vertices.len());
}

// ============================================================================
// Segment chaining
// ============================================================================

#[test]
fn test_every_segment_is_used_once() {
    let width = 64;
    let height = 32;
    let data = smooth_field_values(width, height);
    let segments = march_squares(&data, width, height, 50.0);
    let paths = connect_segments(&segments);

    // a path of n points is made of n - 1 segments
    let used: usize = paths.iter().map(|p| p.points.len() - 1).sum();
    assert_eq!(used, segments.len());
}
