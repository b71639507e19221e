//! Edge/boundary extraction: smoothed image in, binary map out.
//!
//! This module defines the [`EdgeExtractor`] trait and the
//! [`EdgeExtractorKind`] enum for selecting a strategy at runtime. Both
//! strategies produce an image with exactly two possible values, so the
//! contour tracer and the serializer never need to know which one ran.

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

use crate::hysteresis;
use crate::types::PipelineConfig;

/// Selects how the binary map is produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EdgeExtractorKind {
    /// Fixed-threshold binarization: `max_value` where the intensity is
    /// strictly above `threshold`, 0 elsewhere.
    Threshold {
        /// Intensities above this become foreground.
        threshold: u8,
        /// Value written for foreground pixels.
        max_value: u8,
    },

    /// Sobel gradient, non-maximum suppression, and hysteresis
    /// thresholding (see the [`hysteresis`](crate::hysteresis) module).
    Hysteresis {
        /// Weak-edge threshold.
        low: f32,
        /// Definite-edge threshold. Must be at least `low`.
        high: f32,
    },
}

impl EdgeExtractorKind {
    /// Hysteresis mode with the default thresholds.
    #[must_use]
    pub const fn default_hysteresis() -> Self {
        Self::Hysteresis {
            low: PipelineConfig::DEFAULT_HYSTERESIS_LOW,
            high: PipelineConfig::DEFAULT_HYSTERESIS_HIGH,
        }
    }

    /// Short human-readable strategy name, used in logs and diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Threshold { .. } => "threshold",
            Self::Hysteresis { .. } => "hysteresis",
        }
    }
}

impl Default for EdgeExtractorKind {
    fn default() -> Self {
        Self::Threshold {
            threshold: PipelineConfig::DEFAULT_THRESHOLD,
            max_value: PipelineConfig::DEFAULT_MAX_VALUE,
        }
    }
}

/// Trait for binary-map extraction strategies.
///
/// Input: a smoothed grayscale image.
/// Output: a same-sized image containing only 0 and one foreground value.
pub trait EdgeExtractor {
    /// Produce the binary map for `image`.
    fn extract(&self, image: &GrayImage) -> GrayImage;
}

impl EdgeExtractor for EdgeExtractorKind {
    fn extract(&self, image: &GrayImage) -> GrayImage {
        match *self {
            Self::Threshold {
                threshold,
                max_value,
            } => binarize(image, threshold, max_value),
            Self::Hysteresis { low, high } => hysteresis::detect_edges(image, low, high),
        }
    }
}

/// Fixed-threshold binarization.
///
/// Pixels strictly above `threshold` become `max_value`; everything else
/// (including pixels equal to `threshold`) becomes 0.
#[must_use = "returns the binary map"]
pub fn binarize(image: &GrayImage, threshold: u8, max_value: u8) -> GrayImage {
    let mut out = image.clone();
    for p in out.pixels_mut() {
        *p = Luma([if p.0[0] > threshold { max_value } else { 0 }]);
    }
    out
}

/// Number of foreground (non-zero) pixels in a binary map.
#[must_use]
pub fn count_foreground(image: &GrayImage) -> u64 {
    image.pixels().map(|p| u64::from(p.0[0] != 0)).sum()
}
