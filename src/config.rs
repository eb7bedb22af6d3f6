use serde::{Deserialize, Serialize};

use crate::raster::{Connectivity, DEFAULT_THRESHOLD};

/// Tunables for curve extraction.
///
/// Defaults assume a dark curve on a light background traced with the fixed
/// mid-grey threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Luminance at or below this is curve ink.
    pub threshold: u8,
    /// Pick the threshold from the luminance histogram (Otsu) instead.
    pub auto_threshold: bool,
    pub connectivity: Connectivity,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            auto_threshold: false,
            connectivity: Connectivity::default(),
        }
    }
}

impl ExtractConfig {
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }
}
