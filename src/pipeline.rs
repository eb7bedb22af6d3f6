//! Image → mask → trace → data series.

use image::{DynamicImage, GenericImageView};

use crate::calibration::{CalibrationModel, map_to_data};
use crate::config::ExtractConfig;
use crate::error::{DigitizeError, Result};
use crate::raster::{self, Trace};
use crate::series::DataSeries;

/// Decodes PNG/JPEG/BMP (or any other format the `image` crate recognises).
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(DigitizeError::DecodeFailure)
}

/// Binarizes the image and selects the curve trace.
pub fn extract_curve(image: &DynamicImage, config: &ExtractConfig) -> Result<Trace> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(DigitizeError::NoCurveFound {
            threshold: config.threshold,
        });
    }

    let luma = raster::luminance(image)?;
    let threshold = if config.auto_threshold {
        raster::otsu_threshold(luma.as_slice())
    } else {
        config.threshold
    };
    let mask = raster::binarize_luminance(&luma, threshold)?;
    raster::extract_trace(&mask, config.connectivity)
}

/// Runs the full extraction. Either the whole series is returned or an error;
/// a trace that cannot be mapped is never handed back.
pub fn extract_series(
    image: &DynamicImage,
    calibration: &CalibrationModel,
    config: &ExtractConfig,
) -> Result<DataSeries> {
    if let CalibrationModel::Points(points) = calibration
        && !points.is_complete()
    {
        return Err(DigitizeError::CalibrationIncomplete {
            missing: points.missing(),
        });
    }
    let trace = extract_curve(image, config)?;
    map_to_data(&trace, calibration)
}

/// [`extract_series`] on an encoded image buffer.
pub fn extract_series_from_bytes(
    bytes: &[u8],
    calibration: &CalibrationModel,
    config: &ExtractConfig,
) -> Result<DataSeries> {
    let image = decode_image(bytes)?;
    extract_series(&image, calibration, config)
}
