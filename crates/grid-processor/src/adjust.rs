//! Longitude re-centering and bounding-box cropping.

use grid_common::{BoundingBox, ContourError, ContourResult, Grid};
use tracing::debug;

/// Wrap `lon` into `[central - 180, central + 180)`.
pub fn wrap_lon(lon: f64, central: f64) -> f64 {
    let west = central - 180.0;
    (lon - west).rem_euclid(360.0) + west
}

/// Rotate columns so `central_lon` is the middle of the longitude axis.
///
/// Longitudes are rewritten into `[central - 180, central + 180)` and columns
/// are reordered to keep them ascending. Cell values are untouched, so the
/// result is a column permutation of the input.
pub fn recenter(grid: &Grid, central_lon: f64) -> Grid {
    let wrapped: Vec<f64> = grid.lon().iter().map(|&l| wrap_lon(l, central_lon)).collect();

    let mut order: Vec<usize> = (0..wrapped.len()).collect();
    order.sort_by(|&a, &b| wrapped[a].total_cmp(&wrapped[b]));

    let new_lon = order.iter().map(|&i| wrapped[i]).collect();
    grid.select_columns(&order, new_lon)
}

/// Keep rows and columns whose coordinates fall inside `bbox` (inclusive).
///
/// When the box does not fit the grid's current longitude span, for example a
/// box crossing the seam, the grid is first re-centered on the box so the
/// selection is one contiguous slice.
pub fn crop(grid: &Grid, bbox: &BoundingBox) -> ContourResult<Grid> {
    let mut working = None;
    if needs_recentering(grid.lon(), bbox) {
        debug!(
            west = bbox.west,
            east = bbox.east,
            center = bbox.center_lon(),
            "Re-centering grid on bounding box"
        );
        working = Some(recenter(grid, bbox.center_lon()));
    }
    let grid = working.as_ref().unwrap_or(grid);

    let rows: Vec<usize> = grid
        .lat()
        .iter()
        .enumerate()
        .filter(|&(_, &lat)| bbox.contains_lat(lat))
        .map(|(i, _)| i)
        .collect();
    let cols: Vec<usize> = grid
        .lon()
        .iter()
        .enumerate()
        .filter(|&(_, &lon)| bbox.contains_lon(lon))
        .map(|(i, _)| i)
        .collect();

    if rows.is_empty() || cols.is_empty() {
        return Err(ContourError::EmptySelection(format!(
            "extent [{}, {}, {}, {}] selects {} rows and {} columns",
            bbox.west,
            bbox.east,
            bbox.south,
            bbox.north,
            rows.len(),
            cols.len()
        )));
    }

    let new_lon = cols.iter().map(|&c| grid.lon()[c]).collect();
    Ok(grid.select_columns(&cols, new_lon).select_rows(&rows))
}

/// Re-center then crop. Both steps are optional; with neither the grid is
/// returned as is.
pub fn adjust(
    grid: Grid,
    central_lon: Option<f64>,
    bbox: Option<&BoundingBox>,
) -> ContourResult<Grid> {
    let grid = match central_lon {
        Some(c) => recenter(&grid, c),
        None => grid,
    };

    let Some(bbox) = bbox else {
        return Ok(grid);
    };

    let cropped = crop(&grid, bbox)?;
    debug!(
        from = ?grid.shape(),
        to = ?cropped.shape(),
        "Cropped grid"
    );
    Ok(cropped)
}

/// True when the box longitudes do not lie within one turn starting at the
/// grid's westernmost longitude.
fn needs_recentering(lon: &[f64], bbox: &BoundingBox) -> bool {
    let Some(axis_start) = lon.iter().copied().min_by(f64::total_cmp) else {
        return false;
    };
    !(bbox.west >= axis_start && bbox.east < axis_start + 360.0)
}
