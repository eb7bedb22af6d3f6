//! Recover numeric (x, y) series from raster images of 2-D charts.
//!
//! The pipeline binarizes the image, traces the longest iso-contour of the
//! foreground mask and maps its pixel coordinates into data space through a
//! [`CalibrationModel`].

pub mod calibration;
pub mod config;
pub mod error;
pub mod export;
pub mod legacy;
pub mod pipeline;
pub mod plot;
pub mod raster;
pub mod series;
pub mod test_image_gen;

pub use calibration::{CalibrationModel, CalibrationSession, map_to_data};
pub use config::ExtractConfig;
pub use error::{DigitizeError, Result};
pub use pipeline::{decode_image, extract_curve, extract_series, extract_series_from_bytes};
pub use raster::{Connectivity, Mask, PixelPoint, Trace, binarize, extract_trace};
pub use series::{DataPoint, DataSeries};
