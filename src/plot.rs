use std::path::Path;

use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;
use plotters::prelude::*;

use crate::error::{DigitizeError, Result};
use crate::raster::Trace;
use crate::series::DataSeries;

const MARGIN: i32 = 20;
const GRID_LINES: i32 = 10;

fn render_err(e: impl std::fmt::Display) -> DigitizeError {
    DigitizeError::Render(e.to_string())
}

/// Widens a zero-length range so a constant series still gets a scale.
fn padded(range: Option<(f64, f64)>) -> (f64, f64) {
    match range {
        Some((lo, hi)) if hi > lo => (lo, hi),
        Some((v, _)) => (v - 0.5, v + 0.5),
        None => (0.0, 1.0),
    }
}

/// Renders a preview of the series in-memory as an RGBA pixel buffer.
///
/// Light grid, the series as a polyline in data order and a small marker on
/// every point. Data `y` grows upward.
pub fn render_series_rgba(width: u32, height: u32, series: &DataSeries) -> Result<Vec<u8>> {
    if width == 0 || height == 0 {
        return Ok(Vec::new());
    }

    let pixel_count = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| render_err("width*height overflow"))?;

    let mut rgb = vec![255u8; pixel_count * 3];

    {
        let root = BitMapBackend::with_buffer(&mut rgb, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let right = (width as i32 - 1 - MARGIN).max(MARGIN);
        let bottom = (height as i32 - 1 - MARGIN).max(MARGIN);

        let grid_color = RGBColor(210, 210, 210);
        for i in 0..=GRID_LINES {
            let x = MARGIN + (right - MARGIN) * i / GRID_LINES;
            let y = MARGIN + (bottom - MARGIN) * i / GRID_LINES;
            root.draw(&PathElement::new([(x, MARGIN), (x, bottom)], grid_color))
                .map_err(render_err)?;
            root.draw(&PathElement::new([(MARGIN, y), (right, y)], grid_color))
                .map_err(render_err)?;
        }

        let (x_lo, x_hi) = padded(series.x_range());
        let (y_lo, y_hi) = padded(series.y_range());
        let to_px = |x: f64, y: f64| -> Option<(i32, i32)> {
            if !x.is_finite() || !y.is_finite() {
                return None;
            }
            let px = MARGIN as f64 + (x - x_lo) / (x_hi - x_lo) * f64::from(right - MARGIN);
            let py = bottom as f64 - (y - y_lo) / (y_hi - y_lo) * f64::from(bottom - MARGIN);
            Some((px.round() as i32, py.round() as i32))
        };

        let pixels: Vec<(i32, i32)> = series.iter().filter_map(|p| to_px(p.x, p.y)).collect();
        let curve_color = RGBColor(220, 30, 30);
        if pixels.len() > 1 {
            root.draw(&PathElement::new(pixels.clone(), curve_color.stroke_width(2)))
                .map_err(render_err)?;
        }
        for &(x, y) in &pixels {
            root.draw(&Circle::new((x, y), 2, curve_color.filled()))
                .map_err(render_err)?;
        }

        root.present().map_err(render_err)?;
    }

    let mut rgba = vec![255u8; pixel_count * 4];
    for (dst, src) in rgba.chunks_exact_mut(4).zip(rgb.chunks_exact(3)) {
        dst[..3].copy_from_slice(src);
    }

    Ok(rgba)
}

/// Renders [`render_series_rgba`] and writes it as an image file.
pub fn save_series_plot(path: &Path, width: u32, height: u32, series: &DataSeries) -> Result<()> {
    let pixels = render_series_rgba(width, height, series)?;
    let img = RgbaImage::from_raw(width, height, pixels)
        .ok_or_else(|| render_err("plot buffer does not match its dimensions"))?;
    img.save(path).map_err(DigitizeError::EncodeFailure)
}

/// Draws the selected trace in red over a copy of the source image.
pub fn overlay_trace(image: &DynamicImage, trace: &Trace) -> RgbaImage {
    let mut canvas = image.to_rgba8();
    let red = Rgba([255, 0, 0, 255]);
    for pair in trace.points().windows(2) {
        let (a, b) = (pair[0], pair[1]);
        draw_line_segment_mut(
            &mut canvas,
            (a.col as f32, a.row as f32),
            (b.col as f32, b.row as f32),
            red,
        );
    }
    canvas
}
