//! Figure rendering: the filled-contour map and the contour-lines check plot.
//!
//! Both figures are drawn on an equirectangular canvas covering either the
//! grid's own extent or an explicit bounding box.

use std::path::Path;

use grid_common::{BoundingBox, ContourError, ContourResult, Grid, LevelContours};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use rusttype::{Font, Scale};
use tiny_skia::{Color, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};
use tracing::{info, warn};

use crate::png::encode_png;

/// PNG text keyword under which the title is stored.
pub const TITLE_KEYWORD: &str = "Title";

/// Configuration for figure rendering
#[derive(Debug, Clone)]
pub struct FigureConfig {
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Region shown; defaults to the grid extent
    pub extent: Option<BoundingBox>,
    /// Background color [R, G, B, A]
    pub background: [u8; 4],
    /// Color of cells at or above the fill level
    pub fill_color: [u8; 4],
    /// Contour line color
    pub line_color: [u8; 4],
    /// Line width in pixels
    pub line_width: f32,
    /// Title, already resolved against the run date
    pub title: Option<String>,
    /// Title font size in pixels
    pub title_size: f32,
    /// TrueType font used to draw the title onto the image
    pub font: Option<Vec<u8>>,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: 720,
            height: 360,
            extent: None,
            background: [255, 255, 255, 255],
            fill_color: [220, 30, 30, 255],
            line_color: [0, 0, 0, 255],
            line_width: 1.0,
            title: None,
            title_size: 16.0,
            font: None,
        }
    }
}

/// A rendered figure: straight RGBA pixels plus its title.
#[derive(Debug, Clone)]
pub struct Figure {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub title: Option<String>,
}

impl Figure {
    /// RGBA value at (x, y), or None outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        self.pixels.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }

    /// Encode as PNG with the title in a text chunk.
    pub fn encode_png(&self) -> ContourResult<Vec<u8>> {
        let text: Vec<(&str, &str)> = self
            .title
            .as_deref()
            .map(|t| vec![(TITLE_KEYWORD, t)])
            .unwrap_or_default();
        encode_png(&self.pixels, self.width as usize, self.height as usize, &text)
    }

    /// Encode and write to `path`.
    pub fn write_png(&self, path: &Path) -> ContourResult<()> {
        let png = self.encode_png()?;
        std::fs::write(path, &png).map_err(|e| {
            ContourError::RenderError(format!("cannot write figure {}: {}", path.display(), e))
        })?;
        info!(path = %path.display(), bytes = png.len(), "Figure written");
        Ok(())
    }
}

/// Mapping between geographic coordinates and canvas pixels.
#[derive(Debug, Clone, Copy)]
struct Viewport {
    bbox: BoundingBox,
    width: u32,
    height: u32,
}

impl Viewport {
    fn new(grid: &Grid, config: &FigureConfig) -> ContourResult<Self> {
        if config.width == 0 || config.height == 0 {
            return Err(ContourError::RenderError(format!(
                "figure size {}x{} is empty",
                config.width, config.height
            )));
        }

        let bbox = match config.extent {
            Some(bbox) => bbox,
            None => grid_extent(grid).ok_or_else(|| {
                ContourError::RenderError("grid has no coordinate extent".to_string())
            })?,
        };
        if !(bbox.width() > 0.0 && bbox.height() > 0.0) {
            return Err(ContourError::RenderError(format!(
                "figure extent [{}, {}, {}, {}] has no area",
                bbox.west, bbox.east, bbox.south, bbox.north
            )));
        }

        Ok(Self {
            bbox,
            width: config.width,
            height: config.height,
        })
    }

    /// Geographic position of a pixel center.
    fn pixel_to_geo(&self, x: u32, y: u32) -> (f64, f64) {
        let lon = self.bbox.west + (x as f64 + 0.5) / self.width as f64 * self.bbox.width();
        let lat = self.bbox.north - (y as f64 + 0.5) / self.height as f64 * self.bbox.height();
        (lon, lat)
    }

    fn geo_to_pixel(&self, lon: f64, lat: f64) -> (f32, f32) {
        let lon = if self.bbox.contains_lon(lon) {
            lon
        } else {
            wrap_from(lon, self.bbox.west)
        };
        let x = (lon - self.bbox.west) / self.bbox.width() * self.width as f64;
        let y = (self.bbox.north - lat) / self.bbox.height() * self.height as f64;
        (x as f32, y as f32)
    }
}

/// Render the filled-contour figure for `fill_level`.
///
/// `fill_level` must be one of the extracted levels; its contours are stroked
/// over the filled cells.
pub fn render_filled_contour(
    grid: &Grid,
    contours: &[LevelContours],
    fill_level: f64,
    config: &FigureConfig,
) -> ContourResult<Figure> {
    let selected = contours
        .iter()
        .find(|c| c.level == fill_level)
        .ok_or_else(|| {
            let levels: Vec<f64> = contours.iter().map(|c| c.level).collect();
            ContourError::RenderError(format!(
                "fill level {} is not one of the contour levels {:?}",
                fill_level, levels
            ))
        })?;

    let viewport = Viewport::new(grid, config)?;
    let mut pixmap = new_pixmap(&viewport, config.background)?;

    let fill = premultiply(config.fill_color);
    let width = viewport.width as usize;
    for (i, px) in pixmap.data_mut().chunks_exact_mut(4).enumerate() {
        let (lon, lat) = viewport.pixel_to_geo((i % width) as u32, (i / width) as u32);
        if sample_bilinear(grid, lon, lat).is_some_and(|v| v >= fill_level) {
            px.copy_from_slice(&fill);
        }
    }

    stroke_contours(&mut pixmap, &viewport, std::slice::from_ref(selected), config);

    finish(pixmap, config)
}

/// Render every level's contour lines over the background.
pub fn render_contour_lines(
    grid: &Grid,
    contours: &[LevelContours],
    config: &FigureConfig,
) -> ContourResult<Figure> {
    let viewport = Viewport::new(grid, config)?;
    let mut pixmap = new_pixmap(&viewport, config.background)?;
    stroke_contours(&mut pixmap, &viewport, contours, config);
    finish(pixmap, config)
}

fn new_pixmap(viewport: &Viewport, background: [u8; 4]) -> ContourResult<Pixmap> {
    let mut pixmap = Pixmap::new(viewport.width, viewport.height).ok_or_else(|| {
        ContourError::RenderError(format!(
            "cannot allocate {}x{} canvas",
            viewport.width, viewport.height
        ))
    })?;
    pixmap.fill(Color::from_rgba8(
        background[0],
        background[1],
        background[2],
        background[3],
    ));
    Ok(pixmap)
}

/// Stroke contour paths using tiny-skia
fn stroke_contours(
    pixmap: &mut Pixmap,
    viewport: &Viewport,
    contours: &[LevelContours],
    config: &FigureConfig,
) {
    let color = config.line_color;
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = true;

    let stroke = Stroke {
        width: config.line_width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    for path in contours.iter().flat_map(|c| &c.paths) {
        let mut pb = PathBuilder::new();
        let mut previous_x: Option<f32> = None;

        for &(lon, lat) in &path.vertices {
            let (x, y) = viewport.geo_to_pixel(lon, lat);
            // lift the pen where a path jumps across the canvas seam
            match previous_x {
                Some(px) if (x - px).abs() <= viewport.width as f32 / 2.0 => pb.line_to(x, y),
                _ => pb.move_to(x, y),
            }
            previous_x = Some(x);
        }

        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }
}

/// Draw the title and convert to straight RGBA.
fn finish(pixmap: Pixmap, config: &FigureConfig) -> ContourResult<Figure> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let pixels: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();

    let pixels = match (&config.title, &config.font) {
        (Some(title), Some(font_data)) => draw_title(pixels, width, height, title, font_data, config)?,
        _ => pixels,
    };

    Ok(Figure {
        width,
        height,
        pixels,
        title: config.title.clone(),
    })
}

fn draw_title(
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    title: &str,
    font_data: &[u8],
    config: &FigureConfig,
) -> ContourResult<Vec<u8>> {
    let mut img = RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
        ContourError::RenderError("pixel buffer does not match canvas size".to_string())
    })?;

    match Font::try_from_vec(font_data.to_vec()) {
        Some(font) => {
            let scale = Scale::uniform(config.title_size);
            let text_width = title.chars().count() as f32 * config.title_size * 0.5;
            let x = ((width as f32 - text_width) / 2.0).max(4.0) as i32;
            let c = config.line_color;
            draw_text_mut(&mut img, Rgba(c), x, 4, scale, &font, title);
        }
        None => {
            warn!("Failed to parse title font, title kept as metadata only");
        }
    }

    Ok(img.into_raw())
}

fn premultiply(color: [u8; 4]) -> [u8; 4] {
    let a = color[3] as u16;
    let scale = |c: u8| ((c as u16 * a + 127) / 255) as u8;
    [scale(color[0]), scale(color[1]), scale(color[2]), color[3]]
}

/// Bounding box of the grid's coordinate axes.
pub fn grid_extent(grid: &Grid) -> Option<BoundingBox> {
    let (west, east) = min_max(grid.lon())?;
    let (south, north) = min_max(grid.lat())?;
    Some(BoundingBox::new(west, east, south, north))
}

fn min_max(axis: &[f64]) -> Option<(f64, f64)> {
    axis.iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Wrap `lon` into `[west, west + 360)`.
fn wrap_from(lon: f64, west: f64) -> f64 {
    (lon - west).rem_euclid(360.0) + west
}

/// Fractional index of `value` on a monotonic axis, or None outside it.
fn axis_position(axis: &[f64], value: f64) -> Option<f64> {
    if axis.len() < 2 || !value.is_finite() {
        return None;
    }
    let last = axis.len() - 1;
    let ascending = axis[last] >= axis[0];
    let (lo, hi) = if ascending {
        (axis[0], axis[last])
    } else {
        (axis[last], axis[0])
    };
    if value < lo || value > hi {
        return None;
    }

    let upper = if ascending {
        axis.partition_point(|&a| a <= value)
    } else {
        axis.partition_point(|&a| a >= value)
    };
    let i = upper.clamp(1, last) - 1;
    let (a0, a1) = (axis[i], axis[i + 1]);
    let frac = if a1 == a0 { 0.0 } else { (value - a0) / (a1 - a0) };
    Some(i as f64 + frac)
}

/// Bilinear sample at (lon, lat); None outside the grid or next to NaN cells.
pub fn sample_bilinear(grid: &Grid, lon: f64, lat: f64) -> Option<f64> {
    let x = axis_position(grid.lon(), lon).or_else(|| {
        let (west, _) = min_max(grid.lon())?;
        axis_position(grid.lon(), wrap_from(lon, west))
    })?;
    let y = axis_position(grid.lat(), lat)?;

    let x0 = (x.floor() as usize).min(grid.width() - 2);
    let y0 = (y.floor() as usize).min(grid.height() - 2);
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let v00 = grid.get(y0, x0)? as f64;
    let v01 = grid.get(y0, x0 + 1)? as f64;
    let v10 = grid.get(y0 + 1, x0)? as f64;
    let v11 = grid.get(y0 + 1, x0 + 1)? as f64;

    let value = v00 * (1.0 - fx) * (1.0 - fy)
        + v01 * fx * (1.0 - fy)
        + v10 * (1.0 - fx) * fy
        + v11 * fx * fy;
    (!value.is_nan()).then_some(value)
}
