//! Pixel-space stages of the pipeline.
//!
//! ```text
//!   DynamicImage
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ binarize │  luminance <= threshold → 255
//!   └──────────┘
//!        │ Mask
//!        ▼
//!   ┌──────────┐
//!   │ contour  │  marching squares, longest contour
//!   └──────────┘
//!        │ Trace
//!        ▼
//! ```

pub mod binarize;
pub mod contour;

pub use binarize::{DEFAULT_THRESHOLD, Mask, binarize, binarize_luminance, luminance, otsu_threshold};
pub use contour::{CONTOUR_LEVEL, Connectivity, Contour, PixelPoint, Trace, extract_trace, find_contours};
