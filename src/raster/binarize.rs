//! Luminance conversion and fixed/automatic thresholding.

use image::{DynamicImage, GenericImageView};
use kornia::{
    image::{Image, ImageSize, allocator::CpuAllocator},
    imgproc,
};

use crate::error::Result;

pub type CpuImage<T, const C: usize> = Image<T, C, CpuAllocator>;

/// Luminance at or below this value is treated as curve ink.
pub const DEFAULT_THRESHOLD: u8 = 127;

const LUMA_R: f32 = 0.2989;
const LUMA_G: f32 = 0.5870;
const LUMA_B: f32 = 0.1140;

/// Curve/background mask: 255 where the luminance was at or below the
/// threshold, 0 elsewhere. Row-major, one byte per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: usize,
    height: usize,
    data: Vec<u8>,
    threshold: u8,
}

impl Mask {
    /// Wraps an existing buffer, row-major. Any nonzero byte is foreground and
    /// is stored as 255, so 0/1 and 0/255 masks trace the same. Returns `None`
    /// if the buffer length does not match `width * height`.
    pub fn from_raw(width: usize, height: usize, mut data: Vec<u8>, threshold: u8) -> Option<Self> {
        if width.checked_mul(height)? != data.len() {
            return None;
        }
        for px in data.iter_mut().filter(|px| **px != 0) {
            *px = 255;
        }
        Some(Self {
            width,
            height,
            data,
            threshold,
        })
    }

    fn empty(width: usize, height: usize, threshold: u8) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
            threshold,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Threshold the mask was produced with.
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn is_foreground(&self, row: usize, col: usize) -> bool {
        row < self.height && col < self.width && self.data[row * self.width + col] != 0
    }

    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&px| px != 0).count()
    }
}

/// Converts any decoded image into a single-channel luminance map.
///
/// Colour images use the weighted sum `0.2989 R + 0.5870 G + 0.1140 B`; grey
/// images pass their luma sample through. Alpha is always dropped and wider
/// sample types are normalized to 8 bits first.
pub fn luminance(image: &DynamicImage) -> Result<CpuImage<f32, 1>> {
    let (width, height) = image.dimensions();
    let size = ImageSize {
        width: width as usize,
        height: height as usize,
    };

    let samples: Vec<f32> = if image.color().has_color() {
        image
            .to_rgb8()
            .pixels()
            .map(|px| LUMA_R * px[0] as f32 + LUMA_G * px[1] as f32 + LUMA_B * px[2] as f32)
            .collect()
    } else {
        image.to_luma8().into_raw().into_iter().map(f32::from).collect()
    };

    Ok(CpuImage::<f32, 1>::new(size, samples, CpuAllocator)?)
}

/// Thresholds an image into a curve mask.
pub fn binarize(image: &DynamicImage, threshold: u8) -> Result<Mask> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Ok(Mask::empty(width as usize, height as usize, threshold));
    }
    let luma = luminance(image)?;
    binarize_luminance(&luma, threshold)
}

/// Thresholds an already computed luminance map.
pub fn binarize_luminance(luma: &CpuImage<f32, 1>, threshold: u8) -> Result<Mask> {
    let size = luma.size();
    let mut binary = CpuImage::<f32, 1>::from_size_val(size, 0.0, CpuAllocator)?;
    // Inverse binary: samples <= threshold become 255, the rest 0.
    imgproc::threshold::threshold_binary_inverse(luma, &mut binary, threshold as f32, 255.0)?;

    let data = binary
        .as_slice()
        .iter()
        .map(|&v| if v > 0.0 { 255u8 } else { 0u8 })
        .collect();

    Ok(Mask {
        width: size.width,
        height: size.height,
        data,
        threshold,
    })
}

/// Histogram of a luminance map in 256 integer bins.
///
/// A sample lands in bin `ceil(v)`, so for an integer threshold `t` the bins
/// `0..=t` hold exactly the samples the mask marks as ink (`v <= t`).
fn ink_histogram(luma: &[f32]) -> [u64; 256] {
    let mut bins = [0u64; 256];
    for &v in luma {
        bins[v.ceil().clamp(0.0, 255.0) as usize] += 1;
    }
    bins
}

/// Otsu threshold over a luminance map: the `t` maximizing the between-class
/// variance of `v <= t` against `v > t`. The lowest such `t` wins; a map with
/// a single populated bin falls back to [`DEFAULT_THRESHOLD`].
pub fn otsu_threshold(luma: &[f32]) -> u8 {
    let bins = ink_histogram(luma);
    let total: u64 = bins.iter().sum();
    if total == 0 {
        return DEFAULT_THRESHOLD;
    }
    let total = total as f64;
    let grand_mean = bins
        .iter()
        .enumerate()
        .map(|(t, &n)| t as f64 * n as f64)
        .sum::<f64>()
        / total;

    let mut best: Option<(u8, f64)> = None;
    let (mut ink_count, mut ink_sum) = (0u64, 0.0f64);
    for (t, &n) in bins.iter().enumerate() {
        ink_count += n;
        ink_sum += t as f64 * n as f64;
        if ink_count == 0 || ink_count as f64 == total {
            continue;
        }
        let ink_weight = ink_count as f64 / total;
        let ink_moment = ink_sum / total;
        let spread = grand_mean * ink_weight - ink_moment;
        let between = spread * spread / (ink_weight * (1.0 - ink_weight));
        if best.is_none_or(|(_, b)| between > b) {
            best = Some((t as u8, between));
        }
    }

    best.map_or(DEFAULT_THRESHOLD, |(t, _)| t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn colour_uses_weighted_sum() {
        // 0.2989 * 200 + 0.5870 * 100 + 0.1140 * 50 = 124.18
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 1, Rgb([200, 100, 50])));
        let luma = luminance(&img).expect("luminance");
        assert!((luma.as_slice()[0] - 124.18).abs() < 1e-3);

        assert_eq!(binarize(&img, 124).expect("mask").foreground_count(), 0);
        assert_eq!(binarize(&img, 125).expect("mask").foreground_count(), 2);
    }

    #[test]
    fn alpha_channel_is_ignored() {
        let opaque = RgbaImage::from_pixel(3, 3, Rgba([10, 10, 10, 255]));
        let transparent = RgbaImage::from_pixel(3, 3, Rgba([10, 10, 10, 0]));
        let a = binarize(&DynamicImage::ImageRgba8(opaque), DEFAULT_THRESHOLD).expect("mask");
        let b = binarize(&DynamicImage::ImageRgba8(transparent), DEFAULT_THRESHOLD).expect("mask");
        assert_eq!(a, b);
        assert_eq!(a.foreground_count(), 9);
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut gray = GrayImage::from_pixel(3, 1, Luma([200]));
        gray.put_pixel(0, 0, Luma([127]));
        gray.put_pixel(1, 0, Luma([128]));
        let mask = binarize(&DynamicImage::ImageLuma8(gray), 127).expect("mask");
        assert_eq!(mask.as_slice(), &[255, 0, 0]);
        assert_eq!(mask.threshold(), 127);
    }

    #[test]
    fn raising_threshold_never_shrinks_foreground() {
        let gray = GrayImage::from_fn(64, 4, |x, _| Luma([(x * 4) as u8]));
        let img = DynamicImage::ImageLuma8(gray);
        let mut previous = 0;
        for threshold in (0..=255u16).step_by(5) {
            let count = binarize(&img, threshold as u8).expect("mask").foreground_count();
            assert!(count >= previous, "threshold {threshold}: {count} < {previous}");
            previous = count;
        }
    }

    #[test]
    fn empty_image_gives_empty_mask() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        let mask = binarize(&img, DEFAULT_THRESHOLD).expect("mask");
        assert_eq!(mask.foreground_count(), 0);
        assert_eq!(mask.width(), 0);
    }

    #[test]
    fn otsu_splits_bimodal_histogram() {
        let mut samples = vec![20.0f32; 500];
        samples.extend(std::iter::repeat_n(230.0f32, 500));
        let t = otsu_threshold(&samples);
        assert!((20..230).contains(&t), "threshold {t}");
    }

    #[test]
    fn otsu_split_matches_the_mask() {
        // 99.99 must stay on the background side of a threshold of 99.
        let mut samples = vec![0.0f32; 40];
        samples.extend(std::iter::repeat_n(99.99f32, 60));
        let t = otsu_threshold(&samples);
        assert!(t < 100, "threshold {t}");
        let ink = samples.iter().filter(|&&v| v <= f32::from(t)).count();
        assert_eq!(ink, 40);
    }

    #[test]
    fn otsu_on_a_flat_map_uses_the_default() {
        assert_eq!(otsu_threshold(&[42.0; 16]), DEFAULT_THRESHOLD);
        assert_eq!(otsu_threshold(&[]), DEFAULT_THRESHOLD);
    }

    #[test]
    fn boolean_mask_is_widened_to_full_scale() {
        let mut data = vec![0u8; 81];
        for r in 3..6 {
            for c in 3..6 {
                data[r * 9 + c] = 1;
            }
        }
        let mask = Mask::from_raw(9, 9, data, DEFAULT_THRESHOLD).expect("mask");
        assert_eq!(mask.foreground_count(), 9);
        assert!(mask.as_slice().iter().all(|&px| px == 0 || px == 255));

        let trace = crate::raster::extract_trace(&mask, crate::raster::Connectivity::Full).expect("trace");
        assert!(!trace.is_empty());
    }

    #[test]
    fn mask_from_raw_checks_length() {
        assert!(Mask::from_raw(2, 2, vec![0; 3], 127).is_none());
        let mask = Mask::from_raw(2, 2, vec![0, 255, 0, 0], 127).expect("mask");
        assert!(mask.is_foreground(0, 1));
        assert!(!mask.is_foreground(1, 1));
        assert!(!mask.is_foreground(5, 5));
    }
}
