use std::fmt;

use kornia::image::ImageError;

use crate::calibration::AnchorName;

/// Which part of a calibration collapsed to a zero divisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationAxis {
    X,
    Y,
    /// The three-point affine calibration (collinear pixel anchors).
    Plane,
}

impl fmt::Display for CalibrationAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationAxis::X => write!(f, "x"),
            CalibrationAxis::Y => write!(f, "y"),
            CalibrationAxis::Plane => write!(f, "plane"),
        }
    }
}

/// Errors raised by the extraction pipeline and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum DigitizeError {
    #[error("no curve found in the image (threshold {threshold})")]
    NoCurveFound { threshold: u8 },

    #[error("calibration incomplete, missing pixel for: {}", format_anchors(.missing))]
    CalibrationIncomplete { missing: Vec<AnchorName> },

    #[error("degenerate calibration on {axis} axis: anchors share the same pixel coordinate")]
    DegenerateCalibration { axis: CalibrationAxis },

    #[error("could not decode image: {0}")]
    DecodeFailure(#[source] image::ImageError),

    #[error("could not encode image: {0}")]
    EncodeFailure(#[source] image::ImageError),

    #[error("plot rendering failed: {0}")]
    Render(String),

    #[error("anchor {anchor} does not belong to this calibration")]
    UnknownAnchor { anchor: AnchorName },

    #[error("invalid calibration file: {0}")]
    InvalidCalibration(#[from] serde_json::Error),

    #[error("kornia image error: {0}")]
    Image(#[from] ImageError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("external digitizer did not finish within {seconds}s and was killed")]
    ExternalTimeout { seconds: u64 },
}

fn format_anchors(anchors: &[AnchorName]) -> String {
    anchors
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T, E = DigitizeError> = std::result::Result<T, E>;
