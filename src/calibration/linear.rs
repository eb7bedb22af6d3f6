//! One- and two-dimensional linear maps from pixel to data coordinates.

use crate::error::{CalibrationAxis, DigitizeError, Result};

/// Interpolates a single data coordinate between two (pixel, value) anchors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMap {
    pixel_origin: f64,
    value_origin: f64,
    pixel_span: f64,
    value_span: f64,
}

impl AxisMap {
    /// Line through `(p1, d1)` and `(p2, d2)`. Anchors on the same pixel
    /// coordinate give a zero divisor and are rejected.
    pub fn through(p1: f64, d1: f64, p2: f64, d2: f64, axis: CalibrationAxis) -> Result<Self> {
        let pixel_span = p2 - p1;
        if pixel_span.abs() < f64::EPSILON || !pixel_span.is_finite() {
            return Err(DigitizeError::DegenerateCalibration { axis });
        }
        Ok(Self {
            pixel_origin: p1,
            value_origin: d1,
            pixel_span,
            value_span: d2 - d1,
        })
    }

    pub fn apply(&self, pixel: f64) -> f64 {
        self.value_origin + (pixel - self.pixel_origin) * self.value_span / self.pixel_span
    }
}

/// Affine map `value = a * col + b * row + c` fitted exactly through three
/// anchors, one per data coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineMap {
    x: [f64; 3],
    y: [f64; 3],
}

fn det3(m: [[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Cramer's rule for `[col row 1] * coeffs = values`.
fn solve(pixels: &[(f64, f64); 3], values: [f64; 3], det: f64) -> [f64; 3] {
    let [(c1, r1), (c2, r2), (c3, r3)] = *pixels;
    let [v1, v2, v3] = values;
    let a = det3([[v1, r1, 1.0], [v2, r2, 1.0], [v3, r3, 1.0]]) / det;
    let b = det3([[c1, v1, 1.0], [c2, v2, 1.0], [c3, v3, 1.0]]) / det;
    let c = det3([[c1, r1, v1], [c2, r2, v2], [c3, r3, v3]]) / det;
    [a, b, c]
}

impl AffineMap {
    /// Fits the map through `(col, row) -> (x, y)` anchor pairs. Collinear pixel
    /// anchors leave the system singular.
    pub fn through(pixels: [(f64, f64); 3], values: [(f64, f64); 3]) -> Result<Self> {
        let [(c1, r1), (c2, r2), (c3, r3)] = pixels;
        let det = det3([[c1, r1, 1.0], [c2, r2, 1.0], [c3, r3, 1.0]]);
        if det.abs() < f64::EPSILON || !det.is_finite() {
            return Err(DigitizeError::DegenerateCalibration {
                axis: CalibrationAxis::Plane,
            });
        }

        let x = solve(&pixels, values.map(|v| v.0), det);
        let y = solve(&pixels, values.map(|v| v.1), det);
        Ok(Self { x, y })
    }

    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.x[0] * col + self.x[1] * row + self.x[2],
            self.y[0] * col + self.y[1] * row + self.y[2],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_scale_maps_midpoint() {
        let map = AxisMap::through(0.0, 0.0, 100.0, 100.0, CalibrationAxis::X).expect("map");
        assert!((map.apply(50.0) - 50.0).abs() < 1e-12);
    }

    #[test]
    fn inverted_axis_interpolates_downwards() {
        // Row 20 is y = 100, row 220 is y = 0.
        let map = AxisMap::through(20.0, 100.0, 220.0, 0.0, CalibrationAxis::Y).expect("map");
        assert!((map.apply(120.0) - 50.0).abs() < 1e-12);
        assert!((map.apply(0.0) - 110.0).abs() < 1e-12);
    }

    #[test]
    fn coincident_pixels_are_degenerate() {
        let err = AxisMap::through(42.0, 0.0, 42.0, 10.0, CalibrationAxis::X).unwrap_err();
        assert!(matches!(
            err,
            DigitizeError::DegenerateCalibration {
                axis: CalibrationAxis::X
            }
        ));
    }

    #[test]
    fn affine_recovers_rotated_frame() {
        // Data axes rotated 90 degrees relative to the pixel grid.
        let pixels = [(10.0, 10.0), (10.0, 110.0), (60.0, 10.0)];
        let values = [(0.0, 0.0), (100.0, 0.0), (0.0, 50.0)];
        let map = AffineMap::through(pixels, values).expect("map");
        let (x, y) = map.apply(35.0, 60.0);
        assert!((x - 50.0).abs() < 1e-9);
        assert!((y - 25.0).abs() < 1e-9);
    }

    #[test]
    fn collinear_anchors_are_degenerate() {
        let pixels = [(0.0, 0.0), (5.0, 5.0), (10.0, 10.0)];
        let values = [(0.0, 0.0), (1.0, 1.0), (2.0, 3.0)];
        let err = AffineMap::through(pixels, values).unwrap_err();
        assert!(matches!(
            err,
            DigitizeError::DegenerateCalibration {
                axis: CalibrationAxis::Plane
            }
        ));
    }
}
