//! Contour line (isoline) extraction using the marching squares algorithm.
//!
//! Segments are generated per grid cell in index space, chained into
//! polylines through the cell edges they share, and finally mapped onto the
//! grid's longitude/latitude coordinates.

use std::collections::{HashMap, VecDeque};

use grid_common::{ContourError, ContourPath, ContourResult, Grid, LevelContours};
use tracing::debug;

/// A point in grid index space: `x` is the fractional column, `y` the
/// fractional row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Identifies a grid edge between two neighbouring cell corners.
///
/// `Horizontal { row, col }` joins (row, col) and (row, col + 1);
/// `Vertical { row, col }` joins (row, col) and (row + 1, col).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKey {
    Horizontal { row: usize, col: usize },
    Vertical { row: usize, col: usize },
}

/// Where a contour crosses a grid edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    pub edge: EdgeKey,
    pub point: Point,
}

/// A line segment inside one cell, between two edge crossings.
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub start: Crossing,
    pub end: Crossing,
}

/// A chained polyline in index space.
#[derive(Debug, Clone)]
pub struct IndexPath {
    pub points: Vec<Point>,
    pub closed: bool,
}

/// Reject an empty level set or non-finite levels.
pub fn validate_levels(levels: &[f64]) -> ContourResult<()> {
    if levels.is_empty() {
        return Err(ContourError::InvalidLevel(
            "at least one contour level is required".to_string(),
        ));
    }
    if let Some(bad) = levels.iter().find(|l| !l.is_finite()) {
        return Err(ContourError::InvalidLevel(format!(
            "level {} is not a finite number",
            bad
        )));
    }
    Ok(())
}

/// Generate contour levels automatically based on data range and interval
pub fn generate_contour_levels(min_value: f64, max_value: f64, interval: f64) -> Vec<f64> {
    if !(interval > 0.0) || !(max_value > min_value) {
        return vec![];
    }

    // Start from first multiple of interval above min_value
    let first = (min_value / interval).ceil() as i64;
    let last = (max_value / interval).floor() as i64;

    (first..=last).map(|k| k as f64 * interval).collect()
}

/// Extract contour paths for every level, in level order.
///
/// `smoothing` is the number of Chaikin passes applied to each path
/// (0 keeps the exact crossings).
pub fn extract_contours(
    grid: &Grid,
    levels: &[f64],
    smoothing: u32,
) -> ContourResult<Vec<LevelContours>> {
    validate_levels(levels)?;

    let result: Vec<LevelContours> = levels
        .iter()
        .map(|&level| LevelContours {
            level,
            paths: contour_level(grid, level, smoothing),
        })
        .collect();

    debug!(
        levels = levels.len(),
        paths = result.iter().map(|l| l.paths.len()).sum::<usize>(),
        vertices = result.iter().map(|l| l.vertex_count()).sum::<usize>(),
        "Extracted contours"
    );

    Ok(result)
}

/// Contour paths of `grid` at a single level.
pub fn contour_level(grid: &Grid, level: f64, smoothing: u32) -> Vec<ContourPath> {
    let segments = march_squares(grid.values(), grid.width(), grid.height(), level);
    let paths = connect_segments(&segments);

    let result: Vec<ContourPath> = paths
        .into_iter()
        .filter(|p| p.points.len() >= 2)
        .map(|p| {
            let vertices: Vec<(f64, f64)> = p
                .points
                .iter()
                .map(|pt| to_geographic(pt, grid.lon(), grid.lat()))
                .collect();
            ContourPath {
                vertices: smooth_path(&vertices, p.closed, smoothing),
                closed: p.closed,
            }
        })
        .collect();

    debug!(
        level = level,
        segments = segments.len(),
        paths = result.len(),
        "Contoured level"
    );

    result
}

/// Marching squares algorithm to generate contour segments
///
/// # Arguments
/// * `data` - Grid data in row-major order
/// * `width` - Grid width
/// * `height` - Grid height
/// * `level` - Contour level to extract
///
/// # Returns
/// Vector of line segments representing the contour
pub fn march_squares(data: &[f32], width: usize, height: usize, level: f64) -> Vec<Segment> {
    if width < 2 || height < 2 || data.len() != width * height {
        return vec![];
    }

    let mut segments = Vec::new();

    for y in 0..(height - 1) {
        for x in 0..(width - 1) {
            let tl = data[y * width + x];
            let tr = data[y * width + x + 1];
            let bl = data[(y + 1) * width + x];
            let br = data[(y + 1) * width + x + 1];

            // Skip cells with NaN values
            if tl.is_nan() || tr.is_nan() || bl.is_nan() || br.is_nan() {
                continue;
            }

            let mut cell_index = 0u8;
            if tl as f64 >= level {
                cell_index |= 1;
            }
            if tr as f64 >= level {
                cell_index |= 2;
            }
            if br as f64 >= level {
                cell_index |= 4;
            }
            if bl as f64 >= level {
                cell_index |= 8;
            }

            if cell_index == 0 || cell_index == 15 {
                continue;
            }

            let crossing = |edge: EdgeKey| Crossing {
                edge,
                point: edge_point(data, width, edge, level),
            };
            let top = crossing(EdgeKey::Horizontal { row: y, col: x });
            let bottom = crossing(EdgeKey::Horizontal { row: y + 1, col: x });
            let left = crossing(EdgeKey::Vertical { row: y, col: x });
            let right = crossing(EdgeKey::Vertical { row: y, col: x + 1 });

            get_cell_segments(cell_index, top, right, bottom, left, &mut segments);
        }
    }

    segments
}

/// Append the segments for a marching squares cell case.
fn get_cell_segments(
    cell_index: u8,
    top: Crossing,
    right: Crossing,
    bottom: Crossing,
    left: Crossing,
    out: &mut Vec<Segment>,
) {
    let mut push = |start, end| out.push(Segment { start, end });

    match cell_index {
        1 | 14 => push(left, top),
        2 | 13 => push(top, right),
        3 | 12 => push(left, right),
        4 | 11 => push(right, bottom),
        5 => {
            // saddle
            push(left, top);
            push(right, bottom);
        }
        6 | 9 => push(top, bottom),
        7 | 8 => push(left, bottom),
        10 => {
            // saddle
            push(top, right);
            push(left, bottom);
        }
        _ => {}
    }
}

/// Crossing point on an edge, computed from the edge alone so both cells
/// sharing it produce the same point.
fn edge_point(data: &[f32], width: usize, edge: EdgeKey, level: f64) -> Point {
    let (row, col, row2, col2) = match edge {
        EdgeKey::Horizontal { row, col } => (row, col, row, col + 1),
        EdgeKey::Vertical { row, col } => (row, col, row + 1, col),
    };
    interpolate_edge(
        col as f64,
        row as f64,
        col2 as f64,
        row2 as f64,
        data[row * width + col] as f64,
        data[row2 * width + col2] as f64,
        level,
    )
}

/// Linearly interpolate between two edge points based on data values
fn interpolate_edge(
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    val1: f64,
    val2: f64,
    level: f64,
) -> Point {
    if (val2 - val1).abs() < f64::EPSILON {
        return Point::new((x1 + x2) / 2.0, (y1 + y2) / 2.0);
    }

    let t = ((level - val1) / (val2 - val1)).clamp(0.0, 1.0);

    Point::new(x1 + t * (x2 - x1), y1 + t * (y2 - y1))
}

/// Connect line segments into continuous polylines
///
/// Segments are joined through shared edges, extending each chain at both
/// ends. A chain that returns to its starting edge is closed.
pub fn connect_segments(segments: &[Segment]) -> Vec<IndexPath> {
    if segments.is_empty() {
        return vec![];
    }

    let mut by_edge: HashMap<EdgeKey, Vec<usize>> = HashMap::with_capacity(segments.len() * 2);
    for (i, seg) in segments.iter().enumerate() {
        by_edge.entry(seg.start.edge).or_default().push(i);
        by_edge.entry(seg.end.edge).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut paths = Vec::new();

    for start_idx in 0..segments.len() {
        if used[start_idx] {
            continue;
        }
        used[start_idx] = true;

        let mut chain: VecDeque<Crossing> = VecDeque::new();
        chain.push_back(segments[start_idx].start);
        chain.push_back(segments[start_idx].end);

        // forward
        while let Some(&tail) = chain.back() {
            match take_neighbour(segments, &by_edge, &mut used, tail.edge) {
                Some(next) => chain.push_back(next),
                None => break,
            }
        }

        let closed = chain.len() > 2 && chain.front().map(|c| c.edge) == chain.back().map(|c| c.edge);

        if !closed {
            // backward
            while let Some(&head) = chain.front() {
                match take_neighbour(segments, &by_edge, &mut used, head.edge) {
                    Some(prev) => chain.push_front(prev),
                    None => break,
                }
            }
        }

        paths.push(IndexPath {
            points: chain.into_iter().map(|c| c.point).collect(),
            closed,
        });
    }

    paths
}

/// Mark the unused segment touching `edge` as used and return its far end.
fn take_neighbour(
    segments: &[Segment],
    by_edge: &HashMap<EdgeKey, Vec<usize>>,
    used: &mut [bool],
    edge: EdgeKey,
) -> Option<Crossing> {
    let idx = by_edge.get(&edge)?.iter().copied().find(|&i| !used[i])?;
    used[idx] = true;
    let seg = &segments[idx];
    Some(if seg.start.edge == edge { seg.end } else { seg.start })
}

/// Map an index-space point onto the coordinate axes.
fn to_geographic(point: &Point, lon: &[f64], lat: &[f64]) -> (f64, f64) {
    (interpolate_axis(lon, point.x), interpolate_axis(lat, point.y))
}

fn interpolate_axis(axis: &[f64], position: f64) -> f64 {
    if axis.len() < 2 {
        return axis.first().copied().unwrap_or(f64::NAN);
    }
    let i = (position.floor().max(0.0) as usize).min(axis.len() - 2);
    let frac = position - i as f64;
    axis[i] + frac * (axis[i + 1] - axis[i])
}

/// Apply Chaikin's corner cutting algorithm for smoothing
///
/// Open paths keep their end points. Closed paths stay closed.
pub fn smooth_path(vertices: &[(f64, f64)], closed: bool, iterations: u32) -> Vec<(f64, f64)> {
    if iterations == 0 || vertices.len() < 3 {
        return vertices.to_vec();
    }

    let mut points: Vec<(f64, f64)> = if closed {
        // drop the repeated closing vertex while cutting corners
        vertices[..vertices.len() - 1].to_vec()
    } else {
        vertices.to_vec()
    };

    for _ in 0..iterations {
        let n = points.len();
        let mut new_points = Vec::with_capacity(n * 2 + 2);
        if !closed {
            new_points.push(points[0]);
        }

        let pairs = if closed { n } else { n - 1 };
        for i in 0..pairs {
            let p1 = points[i];
            let p2 = points[(i + 1) % n];

            // Create two new points: 25% and 75% along the segment
            new_points.push((0.75 * p1.0 + 0.25 * p2.0, 0.75 * p1.1 + 0.25 * p2.1));
            new_points.push((0.25 * p1.0 + 0.75 * p2.0, 0.25 * p1.1 + 0.75 * p2.1));
        }

        if !closed {
            new_points.push(points[n - 1]);
        }
        points = new_points;
    }

    if closed {
        points.push(points[0]);
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_contour_levels() {
        let levels = generate_contour_levels(0.0, 20.0, 5.0);
        assert_eq!(levels, vec![0.0, 5.0, 10.0, 15.0, 20.0]);

        let levels = generate_contour_levels(2.0, 18.0, 5.0);
        assert_eq!(levels, vec![5.0, 10.0, 15.0]);

        assert!(generate_contour_levels(0.0, 1.0, 0.0).is_empty());
        assert!(generate_contour_levels(1.0, 1.0, 0.5).is_empty());
    }

    #[test]
    fn test_interpolate_edge() {
        let p = interpolate_edge(0.0, 0.0, 1.0, 0.0, 0.0, 10.0, 5.0);
        assert!((p.x - 0.5).abs() < 1e-9);
        assert!((p.y - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_march_squares_flat() {
        let data = vec![5.0; 9];
        let segments = march_squares(&data, 3, 3, 5.0);
        assert_eq!(segments.len(), 0);
    }

    #[test]
    fn test_march_squares_peak_is_closed_ring() {
        let data = vec![
            0.0, 0.0, 0.0,
            0.0, 10.0, 0.0,
            0.0, 0.0, 0.0,
        ];
        let segments = march_squares(&data, 3, 3, 5.0);
        assert_eq!(segments.len(), 4);

        let paths = connect_segments(&segments);
        assert_eq!(paths.len(), 1);
        assert!(paths[0].closed);
        assert_eq!(paths[0].points.len(), 5);
        assert_eq!(paths[0].points.first(), paths[0].points.last());
    }

    #[test]
    fn test_connect_open_line_from_middle_segment() {
        // a vertical step: the chain must grow in both directions
        let data = vec![
            0.0, 1.0,
            0.0, 1.0,
            0.0, 1.0,
            0.0, 1.0,
        ];
        let segments = march_squares(&data, 2, 4, 0.5);
        assert_eq!(segments.len(), 3);

        let mut reordered = segments.clone();
        reordered.swap(0, 1);
        let paths = connect_segments(&reordered);
        assert_eq!(paths.len(), 1);
        assert!(!paths[0].closed);
        assert_eq!(paths[0].points.len(), 4);
    }

    #[test]
    fn test_interpolate_axis() {
        let axis = [10.0, 20.0, 40.0];
        assert_eq!(interpolate_axis(&axis, 0.0), 10.0);
        assert_eq!(interpolate_axis(&axis, 1.5), 30.0);
        assert_eq!(interpolate_axis(&axis, 2.0), 40.0);
    }

    #[test]
    fn test_smooth_path_keeps_shape_invariants() {
        let open = vec![(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)];
        let smoothed = smooth_path(&open, false, 2);
        assert_eq!(smoothed.first(), Some(&(0.0, 0.0)));
        assert_eq!(smoothed.last(), Some(&(2.0, 0.0)));
        assert!(smoothed.len() > open.len());

        let ring = vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)];
        let smoothed = smooth_path(&ring, true, 1);
        assert_eq!(smoothed.len(), 9);
        assert_eq!(smoothed.first(), smoothed.last());
    }

    #[test]
    fn test_validate_levels() {
        assert!(validate_levels(&[1.0]).is_ok());
        assert!(matches!(
            validate_levels(&[]),
            Err(ContourError::InvalidLevel(_))
        ));
        assert!(matches!(
            validate_levels(&[1.0, f64::NAN]),
            Err(ContourError::InvalidLevel(_))
        ));
    }
}
