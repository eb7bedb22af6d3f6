//! Caller-owned state for collecting calibration clicks one at a time.

use crate::calibration::{
    AnchorName, AxisAnchors, CalibrationModel, CornerAnchors, PlaneAnchors, PointCalibration,
};
use crate::error::{DigitizeError, Result};
use crate::raster::PixelPoint;
use crate::series::DataPoint;

/// Accumulates anchor pixels and values between UI interactions.
///
/// Clicks fill anchors in their natural order (C1, C2 or X1, X2, Y1, Y2 or
/// P1, P2, P3);
/// values can be entered at any time. The session is plain data, so the caller
/// decides where it lives and passes the resulting model into the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationSession {
    calibration: PointCalibration,
}

impl CalibrationSession {
    /// Two opposite plot corners, each with an (x, y) value.
    pub fn two_point() -> Self {
        Self {
            calibration: PointCalibration::Corners(CornerAnchors::default()),
        }
    }

    /// Two anchors per axis.
    pub fn four_point() -> Self {
        Self {
            calibration: PointCalibration::Axes(AxisAnchors::default()),
        }
    }

    /// Three anchors with full data coordinates.
    pub fn three_point() -> Self {
        Self {
            calibration: PointCalibration::Plane(PlaneAnchors::default()),
        }
    }

    pub fn calibration(&self) -> &PointCalibration {
        &self.calibration
    }

    /// Next anchor waiting for a click.
    pub fn next_pending(&self) -> Option<AnchorName> {
        self.calibration.missing().first().copied()
    }

    /// Assigns `pixel` to the next pending anchor and returns its name, or
    /// `None` once every anchor has a pixel.
    pub fn record_click(&mut self, pixel: PixelPoint) -> Option<AnchorName> {
        let name = self.next_pending()?;
        if let Some(slot) = self.calibration.pixel_mut(name) {
            *slot = Some(pixel);
        }
        Some(name)
    }

    /// Places (or moves) a specific anchor.
    pub fn set_pixel(&mut self, name: AnchorName, pixel: PixelPoint) -> Result<()> {
        let slot = self
            .calibration
            .pixel_mut(name)
            .ok_or(DigitizeError::UnknownAnchor { anchor: name })?;
        *slot = Some(pixel);
        Ok(())
    }

    /// Sets the data value of an X or Y anchor.
    pub fn set_axis_value(&mut self, name: AnchorName, value: f64) -> Result<()> {
        let PointCalibration::Axes(anchors) = &mut self.calibration else {
            return Err(DigitizeError::UnknownAnchor { anchor: name });
        };
        let anchor = match name {
            AnchorName::X1 => &mut anchors.x1,
            AnchorName::X2 => &mut anchors.x2,
            AnchorName::Y1 => &mut anchors.y1,
            AnchorName::Y2 => &mut anchors.y2,
            _ => return Err(DigitizeError::UnknownAnchor { anchor: name }),
        };
        anchor.value = value;
        Ok(())
    }

    /// Sets the data coordinate of a C or P anchor.
    pub fn set_point_value(&mut self, name: AnchorName, value: DataPoint) -> Result<()> {
        let anchor = match (&mut self.calibration, name) {
            (PointCalibration::Corners(c), AnchorName::C1) => &mut c.c1,
            (PointCalibration::Corners(c), AnchorName::C2) => &mut c.c2,
            (PointCalibration::Plane(p), AnchorName::P1) => &mut p.p1,
            (PointCalibration::Plane(p), AnchorName::P2) => &mut p.p2,
            (PointCalibration::Plane(p), AnchorName::P3) => &mut p.p3,
            _ => return Err(DigitizeError::UnknownAnchor { anchor: name }),
        };
        anchor.value = value;
        Ok(())
    }

    /// Forgets all clicked pixels, keeping the entered values.
    pub fn clear_pixels(&mut self) {
        for &name in self.calibration.anchor_names() {
            if let Some(slot) = self.calibration.pixel_mut(name) {
                *slot = None;
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.calibration.is_complete()
    }

    /// Snapshot of the session as a calibration model. Mapping with it fails
    /// with `CalibrationIncomplete` until every anchor has a pixel.
    pub fn model(&self) -> CalibrationModel {
        CalibrationModel::Points(self.calibration)
    }
}
