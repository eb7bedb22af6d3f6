use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const INK: Rgb<u8> = Rgb([0, 0, 0]);
/// Light enough to sit above the default threshold.
pub const GRID: Rgb<u8> = Rgb([200, 200, 200]);

pub fn blank_chart(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, WHITE)
}

/// Draws a polyline through `points` (x, y in image coordinates), `thickness`
/// pixels wide, by stacking vertically offset one-pixel segments.
pub fn draw_polyline(img: &mut RgbImage, points: &[(f32, f32)], color: Rgb<u8>, thickness: u32) {
    let half = thickness.saturating_sub(1) as f32 / 2.0;
    for pair in points.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        for k in 0..thickness.max(1) {
            let dy = k as f32 - half;
            draw_line_segment_mut(img, (x0, y0 + dy), (x1, y1 + dy), color);
        }
    }
}

/// A light grey grid every `step` pixels.
pub fn draw_grid(img: &mut RgbImage, step: u32) {
    let (w, h) = img.dimensions();
    let step = step.max(1);
    for x in (0..w).step_by(step as usize) {
        draw_line_segment_mut(img, (x as f32, 0.0), (x as f32, (h - 1) as f32), GRID);
    }
    for y in (0..h).step_by(step as usize) {
        draw_line_segment_mut(img, (0.0, y as f32), ((w - 1) as f32, y as f32), GRID);
    }
}

/// Square chart with a one-pixel black diagonal from the bottom-left corner
/// to the top-right corner.
pub fn diagonal_chart(size: u32) -> DynamicImage {
    let mut img = blank_chart(size, size);
    if size > 0 {
        let last = (size - 1) as f32;
        draw_line_segment_mut(&mut img, (0.0, last), (last, 0.0), INK);
    }
    DynamicImage::ImageRgb8(img)
}

/// Horizontal stroke spanning the full width, `thickness` rows starting at
/// `row`.
pub fn horizontal_line_chart(width: u32, height: u32, row: u32, thickness: u32) -> DynamicImage {
    let mut img = blank_chart(width, height);
    for y in row..(row + thickness).min(height) {
        for x in 0..width {
            img.put_pixel(x, y, INK);
        }
    }
    DynamicImage::ImageRgb8(img)
}

/// One period of a sine wave, three pixels thick, over a light grid.
pub fn sine_chart(width: u32, height: u32) -> DynamicImage {
    let mut img = blank_chart(width, height);
    draw_grid(&mut img, 20);
    let mid = height as f32 / 2.0;
    let amp = height as f32 * 0.35;
    let points: Vec<(f32, f32)> = (0..width)
        .map(|x| {
            let t = x as f32 / width.max(1) as f32 * std::f32::consts::TAU;
            (x as f32, mid - amp * t.sin())
        })
        .collect();
    draw_polyline(&mut img, &points, INK, 3);
    DynamicImage::ImageRgb8(img)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_touches_both_corners() {
        let img = diagonal_chart(10).to_rgb8();
        assert_eq!(img.get_pixel(0, 9), &INK);
        assert_eq!(img.get_pixel(9, 0), &INK);
        assert_eq!(img.get_pixel(0, 0), &WHITE);
    }

    #[test]
    fn horizontal_line_is_clipped_to_the_image() {
        let img = horizontal_line_chart(8, 6, 4, 5).to_rgb8();
        assert_eq!(img.get_pixel(3, 5), &INK);
        assert_eq!(img.get_pixel(3, 3), &WHITE);
    }

    #[test]
    fn grid_stays_light() {
        let img = sine_chart(100, 80).to_rgb8();
        assert_eq!(img.get_pixel(40, 1), &GRID);
    }
}
