//! Generators for synthetic gridded fields and coordinate axes.
//!
//! All value generators return row-major `Vec<f32>` with `height` rows of
//! `width` cells, matching `grid_common::Grid`.

/// Cell-center longitudes of a global grid starting at -180.
///
/// ```
/// use test_utils::global_lon;
///
/// assert_eq!(global_lon(4), vec![-180.0, -90.0, 0.0, 90.0]);
/// ```
pub fn global_lon(n: usize) -> Vec<f64> {
    let step = 360.0 / n as f64;
    (0..n).map(|i| -180.0 + i as f64 * step).collect()
}

/// Longitudes of a global grid on the 0..360 convention.
pub fn global_lon_0_360(n: usize) -> Vec<f64> {
    let step = 360.0 / n as f64;
    (0..n).map(|i| i as f64 * step).collect()
}

/// Cell-center latitudes from south to north.
///
/// ```
/// use test_utils::global_lat;
///
/// assert_eq!(global_lat(2), vec![-45.0, 45.0]);
/// ```
pub fn global_lat(n: usize) -> Vec<f64> {
    let step = 180.0 / n as f64;
    (0..n).map(|i| -90.0 + (i as f64 + 0.5) * step).collect()
}

/// Values `0, 1, 2, ...` in row-major order.
pub fn ramp_values(width: usize, height: usize) -> Vec<f32> {
    (0..width * height).map(|i| i as f32).collect()
}

/// Every cell set to `value`.
pub fn constant_values(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Gaussian plume of height `peak` centered on (`center_col`, `center_row`).
///
/// Useful for closed contours: any level in `(0, peak)` yields one ring.
pub fn plume_values(
    width: usize,
    height: usize,
    center_col: f32,
    center_row: f32,
    sigma: f32,
    peak: f32,
) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let dx = col as f32 - center_col;
            let dy = row as f32 - center_row;
            let r2 = dx * dx + dy * dy;
            data.push(peak * (-r2 / (2.0 * sigma * sigma)).exp());
        }
    }
    data
}

/// A smooth field with several hills and valleys around 50.
pub fn smooth_field_values(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let fx = col as f32 / width as f32;
            let fy = row as f32 / height as f32;
            let v1 = (fx * std::f32::consts::PI * 4.0).sin() * 20.0;
            let v2 = (fy * std::f32::consts::PI * 4.0).sin() * 20.0;
            let v3 = ((fx + fy) * std::f32::consts::PI * 2.0).sin() * 10.0;
            data.push(50.0 + v1 + v2 + v3);
        }
    }
    data
}
