//! Pixel to data-space calibration.
//!
//! A [`CalibrationModel`] is either the four chart extrema (the image border is
//! the pixel reference) or a set of clicked anchors pairing a pixel position
//! with a known data value.

pub mod linear;
pub mod session;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CalibrationAxis, DigitizeError, Result};
use crate::raster::{PixelPoint, Trace};
use crate::series::{DataPoint, DataSeries};

pub use linear::{AffineMap, AxisMap};
pub use session::CalibrationSession;

/// Names of the calibration anchors a user clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnchorName {
    X1,
    X2,
    Y1,
    Y2,
    P1,
    P2,
    P3,
    C1,
    C2,
}

impl fmt::Display for AnchorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnchorName::X1 => "X1",
            AnchorName::X2 => "X2",
            AnchorName::Y1 => "Y1",
            AnchorName::Y2 => "Y2",
            AnchorName::P1 => "P1",
            AnchorName::P2 => "P2",
            AnchorName::P3 => "P3",
            AnchorName::C1 => "C1",
            AnchorName::C2 => "C2",
        };
        f.write_str(name)
    }
}

/// Chart boundary values. Column 0 is `x_min`, column `width` is `x_max`;
/// row 0 is `y_max`, row `height` is `y_min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisExtrema {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// Anchor on a single axis: X anchors read the pixel column, Y anchors the row.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisAnchor {
    #[serde(default)]
    pub pixel: Option<PixelPoint>,
    pub value: f64,
}

impl AxisAnchor {
    pub fn new(value: f64) -> Self {
        Self { pixel: None, value }
    }

    pub fn at(pixel: PixelPoint, value: f64) -> Self {
        Self {
            pixel: Some(pixel),
            value,
        }
    }
}

/// Anchor carrying a full data-space coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneAnchor {
    #[serde(default)]
    pub pixel: Option<PixelPoint>,
    pub value: DataPoint,
}

impl PlaneAnchor {
    pub fn new(value: DataPoint) -> Self {
        Self { pixel: None, value }
    }

    pub fn at(pixel: PixelPoint, value: DataPoint) -> Self {
        Self {
            pixel: Some(pixel),
            value,
        }
    }
}

impl Default for PlaneAnchor {
    fn default() -> Self {
        Self::new(DataPoint::new(0.0, 0.0))
    }
}

/// Four-click calibration: two anchors per axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisAnchors {
    pub x1: AxisAnchor,
    pub x2: AxisAnchor,
    pub y1: AxisAnchor,
    pub y2: AxisAnchor,
}

/// Three-click calibration fitting a full affine map.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaneAnchors {
    pub p1: PlaneAnchor,
    pub p2: PlaneAnchor,
    pub p3: PlaneAnchor,
}

impl PlaneAnchors {
    /// Anchors in click order.
    pub fn named(&self) -> [(AnchorName, &PlaneAnchor); 3] {
        [
            (AnchorName::P1, &self.p1),
            (AnchorName::P2, &self.p2),
            (AnchorName::P3, &self.p3),
        ]
    }

    /// Anchors still lacking a pixel, in click order.
    pub fn missing(&self) -> Vec<AnchorName> {
        self.named()
            .into_iter()
            .filter(|(_, a)| a.pixel.is_none())
            .map(|(name, _)| name)
            .collect()
    }
}

/// Two-click calibration: opposite corners of the plot area, each carrying a
/// full data coordinate. x follows the columns of the two clicks and y their
/// rows, so the clicks must differ in both.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CornerAnchors {
    pub c1: PlaneAnchor,
    pub c2: PlaneAnchor,
}

/// Calibration built from clicked anchors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointCalibration {
    Corners(CornerAnchors),
    Axes(AxisAnchors),
    Plane(PlaneAnchors),
}

impl PointCalibration {
    /// Anchor names in the order they are expected to be clicked.
    pub fn anchor_names(&self) -> &'static [AnchorName] {
        match self {
            PointCalibration::Corners(_) => &[AnchorName::C1, AnchorName::C2],
            PointCalibration::Axes(_) => &[AnchorName::X1, AnchorName::X2, AnchorName::Y1, AnchorName::Y2],
            PointCalibration::Plane(_) => &[AnchorName::P1, AnchorName::P2, AnchorName::P3],
        }
    }

    pub fn pixel(&self, name: AnchorName) -> Option<Option<PixelPoint>> {
        let pixel = match (self, name) {
            (PointCalibration::Corners(c), AnchorName::C1) => c.c1.pixel,
            (PointCalibration::Corners(c), AnchorName::C2) => c.c2.pixel,
            (PointCalibration::Axes(a), AnchorName::X1) => a.x1.pixel,
            (PointCalibration::Axes(a), AnchorName::X2) => a.x2.pixel,
            (PointCalibration::Axes(a), AnchorName::Y1) => a.y1.pixel,
            (PointCalibration::Axes(a), AnchorName::Y2) => a.y2.pixel,
            (PointCalibration::Plane(p), AnchorName::P1) => p.p1.pixel,
            (PointCalibration::Plane(p), AnchorName::P2) => p.p2.pixel,
            (PointCalibration::Plane(p), AnchorName::P3) => p.p3.pixel,
            _ => return None,
        };
        Some(pixel)
    }

    pub(crate) fn pixel_mut(&mut self, name: AnchorName) -> Option<&mut Option<PixelPoint>> {
        match (self, name) {
            (PointCalibration::Corners(c), AnchorName::C1) => Some(&mut c.c1.pixel),
            (PointCalibration::Corners(c), AnchorName::C2) => Some(&mut c.c2.pixel),
            (PointCalibration::Axes(a), AnchorName::X1) => Some(&mut a.x1.pixel),
            (PointCalibration::Axes(a), AnchorName::X2) => Some(&mut a.x2.pixel),
            (PointCalibration::Axes(a), AnchorName::Y1) => Some(&mut a.y1.pixel),
            (PointCalibration::Axes(a), AnchorName::Y2) => Some(&mut a.y2.pixel),
            (PointCalibration::Plane(p), AnchorName::P1) => Some(&mut p.p1.pixel),
            (PointCalibration::Plane(p), AnchorName::P2) => Some(&mut p.p2.pixel),
            (PointCalibration::Plane(p), AnchorName::P3) => Some(&mut p.p3.pixel),
            _ => None,
        }
    }

    /// Anchors still lacking a pixel, in click order.
    pub fn missing(&self) -> Vec<AnchorName> {
        self.anchor_names()
            .iter()
            .copied()
            .filter(|&name| self.pixel(name) == Some(None))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}

/// How pixel coordinates become data coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationModel {
    AxisExtrema(AxisExtrema),
    Points(PointCalibration),
}

impl CalibrationModel {
    /// Parses a calibration from its JSON form, e.g.
    /// `{"axis_extrema": {"x_min": 0, "x_max": 10, "y_min": 0, "y_max": 100}}`.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Resolves the model into a concrete map for an image of the given size.
    pub fn mapper(&self, width: usize, height: usize) -> Result<PixelMapper> {
        match self {
            CalibrationModel::AxisExtrema(e) => Ok(PixelMapper::Separable {
                x: AxisMap::through(0.0, e.x_min, width as f64, e.x_max, CalibrationAxis::X)?,
                y: AxisMap::through(0.0, e.y_max, height as f64, e.y_min, CalibrationAxis::Y)?,
            }),
            CalibrationModel::Points(points) => {
                let missing = points.missing();
                if !missing.is_empty() {
                    return Err(DigitizeError::CalibrationIncomplete { missing });
                }
                match points {
                    PointCalibration::Corners(c) => {
                        let (first, second) = (pixel_or_origin(&c.c1), pixel_or_origin(&c.c2));
                        Ok(PixelMapper::Separable {
                            x: AxisMap::through(
                                first.col,
                                c.c1.value.x,
                                second.col,
                                c.c2.value.x,
                                CalibrationAxis::X,
                            )?,
                            y: AxisMap::through(
                                first.row,
                                c.c1.value.y,
                                second.row,
                                c.c2.value.y,
                                CalibrationAxis::Y,
                            )?,
                        })
                    }
                    PointCalibration::Axes(a) => Ok(PixelMapper::Separable {
                        x: axis_map(&a.x1, &a.x2, CalibrationAxis::X)?,
                        y: axis_map(&a.y1, &a.y2, CalibrationAxis::Y)?,
                    }),
                    PointCalibration::Plane(p) => {
                        let pixel = |a: &PlaneAnchor| {
                            let px = pixel_or_origin(a);
                            (px.col, px.row)
                        };
                        let value = |a: &PlaneAnchor| (a.value.x, a.value.y);
                        Ok(PixelMapper::Affine(AffineMap::through(
                            [pixel(&p.p1), pixel(&p.p2), pixel(&p.p3)],
                            [value(&p.p1), value(&p.p2), value(&p.p3)],
                        )?))
                    }
                }
            }
        }
    }
}

fn pixel_or_origin(anchor: &PlaneAnchor) -> PixelPoint {
    anchor.pixel.unwrap_or(PixelPoint::new(0.0, 0.0))
}

fn axis_map(first: &AxisAnchor, second: &AxisAnchor, axis: CalibrationAxis) -> Result<AxisMap> {
    let coord = |a: &AxisAnchor| {
        a.pixel
            .map(|px| match axis {
                CalibrationAxis::Y => px.row,
                _ => px.col,
            })
            .unwrap_or_default()
    };
    AxisMap::through(coord(first), first.value, coord(second), second.value, axis)
}

/// A calibration resolved against a concrete image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PixelMapper {
    /// x from the pixel column, y from the pixel row.
    Separable { x: AxisMap, y: AxisMap },
    Affine(AffineMap),
}

impl PixelMapper {
    pub fn apply(&self, pixel: PixelPoint) -> DataPoint {
        match self {
            PixelMapper::Separable { x, y } => DataPoint::new(x.apply(pixel.col), y.apply(pixel.row)),
            PixelMapper::Affine(map) => {
                let (x, y) = map.apply(pixel.col, pixel.row);
                DataPoint::new(x, y)
            }
        }
    }
}

/// Maps every trace point into data space and orders the result by `x`.
pub fn map_to_data(trace: &Trace, calibration: &CalibrationModel) -> Result<DataSeries> {
    let mapper = calibration.mapper(trace.width(), trace.height())?;
    let points = trace.points().iter().map(|&p| mapper.apply(p)).collect();
    Ok(DataSeries::from_unsorted(points))
}
