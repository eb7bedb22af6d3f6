//! Marching-squares contour tracing and curve selection.
//!
//! The mask is treated as a grid of samples at integer (row, col) positions.
//! Every 2x2 cell whose corners straddle [`CONTOUR_LEVEL`] contributes one or
//! two line segments with linearly interpolated end points; segments sharing
//! an end point are chained into contours. Contours reaching the image border
//! stay open, all others close on themselves.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use super::binarize::Mask;
use crate::error::{DigitizeError, Result};

/// Iso-level between the 0 and 255 mask values.
pub const CONTOUR_LEVEL: f64 = 128.0;

/// Sub-pixel position in image space. Row 0 is the top of the image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub row: f64,
    pub col: f64,
}

impl PixelPoint {
    pub fn new(row: f64, col: f64) -> Self {
        Self { row, col }
    }

    fn key(self) -> (u64, u64) {
        (self.row.to_bits(), self.col.to_bits())
    }
}

/// How saddle cells (two diagonal foreground corners) are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// Diagonal foreground samples belong to one region, so a one pixel wide
    /// diagonal stroke yields a single trace.
    #[default]
    Full,
    /// Foreground samples only connect through shared edges; diagonal
    /// neighbours are traced as separate contours.
    Face,
}

/// One traced iso-line.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub points: Vec<PixelPoint>,
    pub closed: bool,
}

/// The contour selected as the plotted curve, with the extent of the image it
/// was traced in.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    points: Vec<PixelPoint>,
    width: usize,
    height: usize,
}

impl Trace {
    /// Builds a trace directly from pixel points. Returns `None` for an empty
    /// point list.
    pub fn new(points: Vec<PixelPoint>, width: usize, height: usize) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        Some(Self {
            points,
            width,
            height,
        })
    }

    pub fn points(&self) -> &[PixelPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Width of the source image in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the source image in pixels.
    pub fn height(&self) -> usize {
        self.height
    }
}

/// Selects the longest contour in the mask as the curve.
///
/// Ties keep the contour that was started first while scanning cells in
/// row-major order.
pub fn extract_trace(mask: &Mask, connectivity: Connectivity) -> Result<Trace> {
    let mut longest: Option<Contour> = None;
    for contour in find_contours(mask, connectivity) {
        let better = longest
            .as_ref()
            .is_none_or(|best| contour.points.len() > best.points.len());
        if better {
            longest = Some(contour);
        }
    }

    longest
        .and_then(|c| Trace::new(c.points, mask.width(), mask.height()))
        .ok_or(DigitizeError::NoCurveFound {
            threshold: mask.threshold(),
        })
}

/// Traces every iso-line of the mask at [`CONTOUR_LEVEL`], in creation order.
pub fn find_contours(mask: &Mask, connectivity: Connectivity) -> Vec<Contour> {
    let segments = march_squares(mask, CONTOUR_LEVEL, connectivity == Connectivity::Full);
    assemble_contours(segments)
}

fn fraction(from: f64, to: f64, level: f64) -> f64 {
    if to == from {
        return 0.0;
    }
    (level - from) / (to - from)
}

fn march_squares(mask: &Mask, level: f64, connect_high: bool) -> Vec<(PixelPoint, PixelPoint)> {
    let width = mask.width();
    let height = mask.height();
    let mut segments = Vec::new();
    if width < 2 || height < 2 {
        return segments;
    }

    let data = mask.as_slice();
    let at = |r: usize, c: usize| data[r * width + c] as f64;

    for r0 in 0..height - 1 {
        let r1 = r0 + 1;
        for c0 in 0..width - 1 {
            let c1 = c0 + 1;
            let ul = at(r0, c0);
            let ur = at(r0, c1);
            let ll = at(r1, c0);
            let lr = at(r1, c1);

            let mut case = 0u8;
            if ul > level {
                case |= 1;
            }
            if ur > level {
                case |= 2;
            }
            if ll > level {
                case |= 4;
            }
            if lr > level {
                case |= 8;
            }
            if case == 0 || case == 15 {
                continue;
            }

            let (r0f, r1f, c0f, c1f) = (r0 as f64, r1 as f64, c0 as f64, c1 as f64);
            let top = PixelPoint::new(r0f, c0f + fraction(ul, ur, level));
            let bottom = PixelPoint::new(r1f, c0f + fraction(ll, lr, level));
            let left = PixelPoint::new(r0f + fraction(ul, ll, level), c0f);
            let right = PixelPoint::new(r0f + fraction(ur, lr, level), c1f);

            // Segments are oriented so the high side stays on the same hand.
            match case {
                1 => segments.push((top, left)),
                2 => segments.push((right, top)),
                3 => segments.push((right, left)),
                4 => segments.push((left, bottom)),
                5 => segments.push((top, bottom)),
                6 if connect_high => {
                    segments.push((left, top));
                    segments.push((right, bottom));
                }
                6 => {
                    segments.push((right, top));
                    segments.push((left, bottom));
                }
                7 => segments.push((right, bottom)),
                8 => segments.push((bottom, right)),
                9 if connect_high => {
                    segments.push((top, right));
                    segments.push((bottom, left));
                }
                9 => {
                    segments.push((top, left));
                    segments.push((bottom, right));
                }
                10 => segments.push((bottom, top)),
                11 => segments.push((bottom, left)),
                12 => segments.push((left, right)),
                13 => segments.push((top, right)),
                14 => segments.push((left, top)),
                _ => {}
            }
        }
    }

    segments
}

fn assemble_contours(segments: Vec<(PixelPoint, PixelPoint)>) -> Vec<Contour> {
    let mut contours: Vec<Option<VecDeque<PixelPoint>>> = Vec::new();
    // End point -> index of the contour starting / ending there.
    let mut starts: HashMap<(u64, u64), usize> = HashMap::new();
    let mut ends: HashMap<(u64, u64), usize> = HashMap::new();

    for (from, to) in segments {
        if from == to {
            continue;
        }

        let tail = starts.remove(&to.key());
        let head = ends.remove(&from.key());

        match (tail, head) {
            (Some(t), Some(h)) if t == h => {
                if let Some(c) = contours[h].as_mut() {
                    c.push_back(to);
                }
            }
            (Some(t), Some(h)) => {
                // Join two contours, keeping the older index.
                if t > h {
                    let tail_points = contours[t].take().unwrap_or_default();
                    if let Some(c) = contours[h].as_mut() {
                        c.extend(tail_points);
                        if let (Some(first), Some(last)) = (c.front(), c.back()) {
                            starts.insert(first.key(), h);
                            ends.insert(last.key(), h);
                        }
                    }
                } else {
                    let head_points = contours[h].take().unwrap_or_default();
                    if let Some(first) = head_points.front() {
                        starts.remove(&first.key());
                    }
                    if let Some(c) = contours[t].as_mut() {
                        for p in head_points.into_iter().rev() {
                            c.push_front(p);
                        }
                        if let (Some(first), Some(last)) = (c.front(), c.back()) {
                            starts.insert(first.key(), t);
                            ends.insert(last.key(), t);
                        }
                    }
                }
            }
            (None, None) => {
                let idx = contours.len();
                contours.push(Some(VecDeque::from([from, to])));
                starts.insert(from.key(), idx);
                ends.insert(to.key(), idx);
            }
            (Some(t), None) => {
                if let Some(c) = contours[t].as_mut() {
                    c.push_front(from);
                }
                starts.insert(from.key(), t);
            }
            (None, Some(h)) => {
                if let Some(c) = contours[h].as_mut() {
                    c.push_back(to);
                }
                ends.insert(to.key(), h);
            }
        }
    }

    contours
        .into_iter()
        .flatten()
        .map(|points| {
            let points: Vec<PixelPoint> = points.into();
            let closed = points.len() > 2 && points.first() == points.last();
            Contour { points, closed }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_with(width: usize, height: usize, on: &[(usize, usize)]) -> Mask {
        let mut data = vec![0u8; width * height];
        for &(r, c) in on {
            data[r * width + c] = 255;
        }
        Mask::from_raw(width, height, data, 127).expect("mask")
    }

    #[test]
    fn uniform_mask_has_no_curve() {
        let empty = mask_with(10, 10, &[]);
        assert!(find_contours(&empty, Connectivity::Full).is_empty());
        match extract_trace(&empty, Connectivity::Full) {
            Err(DigitizeError::NoCurveFound { threshold }) => assert_eq!(threshold, 127),
            other => panic!("expected NoCurveFound, got {other:?}"),
        }

        let full = Mask::from_raw(10, 10, vec![255; 100], 127).expect("mask");
        assert!(extract_trace(&full, Connectivity::Full).is_err());
    }

    #[test]
    fn isolated_pixel_is_a_closed_diamond() {
        let mask = mask_with(5, 5, &[(2, 2)]);
        let contours = find_contours(&mask, Connectivity::Full);
        assert_eq!(contours.len(), 1);
        let c = &contours[0];
        assert!(c.closed);
        assert_eq!(c.points.len(), 5);
        for p in &c.points {
            let d = (p.row - 2.0).abs() + (p.col - 2.0).abs();
            assert!((d - 127.0 / 255.0).abs() < 1e-9, "point {p:?}");
        }
    }

    #[test]
    fn border_stroke_stays_open() {
        // Horizontal stroke across the full width of row 2.
        let on: Vec<_> = (0..8).map(|c| (2, c)).collect();
        let mask = mask_with(8, 5, &on);
        let contours = find_contours(&mask, Connectivity::Full);
        assert_eq!(contours.len(), 2);
        assert!(contours.iter().all(|c| !c.closed));
        assert!(contours.iter().all(|c| c.points.len() == 8));
    }

    #[test]
    fn diagonal_stroke_depends_on_connectivity() {
        let on: Vec<_> = (1..6).map(|i| (i, i)).collect();
        let mask = mask_with(7, 7, &on);

        let full = find_contours(&mask, Connectivity::Full);
        assert_eq!(full.len(), 1);
        assert!(full[0].closed);

        let face = find_contours(&mask, Connectivity::Face);
        assert_eq!(face.len(), 5);
    }

    #[test]
    fn longest_contour_wins() {
        // A 1-pixel dot and a 3x3 block.
        let mut on = vec![(1, 1)];
        for r in 4..7 {
            for c in 4..7 {
                on.push((r, c));
            }
        }
        let mask = mask_with(9, 9, &on);
        let trace = extract_trace(&mask, Connectivity::Full).expect("trace");
        assert!(trace.len() > 5);
        assert!(trace.points().iter().all(|p| p.row > 3.0 && p.col > 3.0));
        assert_eq!((trace.width(), trace.height()), (9, 9));
    }

    #[test]
    fn equal_length_tie_keeps_first_in_scan_order() {
        let mask = mask_with(9, 9, &[(6, 6), (2, 2)]);
        let trace = extract_trace(&mask, Connectivity::Full).expect("trace");
        assert!(trace.points().iter().all(|p| p.row < 3.0));
    }

    #[test]
    fn tracing_is_deterministic() {
        let on: Vec<_> = (0..20).map(|i| (i % 7 + 1, i)).collect();
        let mask = mask_with(20, 10, &on);
        let a = extract_trace(&mask, Connectivity::Full).expect("trace");
        let b = extract_trace(&mask, Connectivity::Full).expect("trace");
        assert_eq!(a, b);
    }
}
