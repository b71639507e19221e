//! Shared types for the lineart image processing pipeline.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::contour::ContourTracerKind;
use crate::edge::EdgeExtractorKind;

/// Re-export `GrayImage` so downstream crates can reference
/// intermediate raster data without depending on `image` directly.
pub use image::GrayImage;

/// An integer pixel coordinate.
///
/// All geometry in the pipeline originates from pixel positions, so
/// coordinates never carry a fractional part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Column (pixels from left edge).
    pub x: u32,
    /// Row (pixels from top edge).
    pub y: u32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Returns `true` if the point lies inside an image of the given size.
    #[must_use]
    pub const fn is_within(self, dimensions: Dimensions) -> bool {
        self.x < dimensions.width && self.y < dimensions.height
    }
}

/// One traced boundary: an ordered sequence of pixel coordinates.
///
/// The order is the walk direction of the tracer and is preserved all
/// the way into serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contour(Vec<Point>);

impl Contour {
    /// Create a new contour from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the contour has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the contour.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the contour and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of an existing grayscale image.
    #[must_use]
    pub fn of(image: &GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Total number of pixels.
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// A decoded pixel buffer as handed over by the caller.
///
/// Samples are interleaved row-major, `channels` bytes per pixel.
/// Construction performs no checks: the grayscale normalizer is the
/// single place where malformed buffers are rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl RawImage {
    /// Wrap raw interleaved samples.
    #[must_use]
    pub const fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            channels,
            data,
        }
    }

    /// Wrap an already single-channel image.
    #[must_use]
    pub fn from_gray(image: GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(width, height, 1, image.into_raw())
    }

    /// Wrap an RGB image.
    #[must_use]
    pub fn from_rgb(image: image::RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(width, height, 3, image.into_raw())
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Samples per pixel.
    #[must_use]
    pub const fn channels(&self) -> u8 {
        self.channels
    }

    /// Raw interleaved samples.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the buffer and returns the raw samples.
    #[must_use]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Configuration for the image processing pipeline.
///
/// Defaults match the slider defaults of the interactive tool this
/// pipeline backs. Every field has a declared range (the associated
/// `*_RANGE` constants); [`validate`](Self::validate) rejects anything
/// outside it instead of clamping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Bilateral filter window diameter in pixels.
    pub smooth_diameter: u32,

    /// Bilateral filter intensity sigma. Larger values let pixels with
    /// more different intensities contribute, blurring across weaker edges.
    pub sigma_color: f32,

    /// Bilateral filter spatial sigma in pixels.
    pub sigma_space: f32,

    /// Which strategy turns the smoothed image into a binary map.
    pub edge_extractor: EdgeExtractorKind,

    /// Which contour tracing algorithm to use.
    pub contour_tracer: ContourTracerKind,
}

impl PipelineConfig {
    /// Default bilateral window diameter.
    pub const DEFAULT_SMOOTH_DIAMETER: u32 = 9;
    /// Default bilateral intensity sigma.
    pub const DEFAULT_SIGMA_COLOR: f32 = 75.0;
    /// Default bilateral spatial sigma.
    pub const DEFAULT_SIGMA_SPACE: f32 = 75.0;
    /// Default binarization threshold.
    pub const DEFAULT_THRESHOLD: u8 = 127;
    /// Default value written for pixels above the threshold.
    pub const DEFAULT_MAX_VALUE: u8 = 255;
    /// Default hysteresis low threshold.
    pub const DEFAULT_HYSTERESIS_LOW: f32 = 50.0;
    /// Default hysteresis high threshold.
    pub const DEFAULT_HYSTERESIS_HIGH: f32 = 150.0;

    /// Accepted bilateral window diameters.
    pub const SMOOTH_DIAMETER_RANGE: RangeInclusive<u32> = 1..=20;
    /// Accepted values for both bilateral sigmas.
    pub const SIGMA_RANGE: RangeInclusive<f32> = 1.0..=150.0;
    /// Accepted hysteresis low thresholds.
    pub const HYSTERESIS_LOW_RANGE: RangeInclusive<f32> = 50.0..=150.0;
    /// Accepted hysteresis high thresholds.
    pub const HYSTERESIS_HIGH_RANGE: RangeInclusive<f32> = 150.0..=250.0;

    /// Check every parameter against its declared range.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::HysteresisOrder`] if the hysteresis low
    /// threshold exceeds the high threshold, and
    /// [`PipelineError::ParameterOutOfRange`] for any other value outside
    /// its range (including NaN).
    pub fn validate(&self) -> Result<(), PipelineError> {
        check_range(
            "smooth_diameter",
            f64::from(self.smooth_diameter),
            &Self::SMOOTH_DIAMETER_RANGE,
        )?;
        check_range(
            "sigma_color",
            f64::from(self.sigma_color),
            &Self::SIGMA_RANGE,
        )?;
        check_range(
            "sigma_space",
            f64::from(self.sigma_space),
            &Self::SIGMA_RANGE,
        )?;

        match self.edge_extractor {
            // Both fields are u8, so their 0..=255 range holds by construction.
            EdgeExtractorKind::Threshold { .. } => Ok(()),
            EdgeExtractorKind::Hysteresis { low, high } => {
                if low > high {
                    return Err(PipelineError::HysteresisOrder { low, high });
                }
                check_range("low", f64::from(low), &Self::HYSTERESIS_LOW_RANGE)?;
                check_range("high", f64::from(high), &Self::HYSTERESIS_HIGH_RANGE)
            }
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            smooth_diameter: Self::DEFAULT_SMOOTH_DIAMETER,
            sigma_color: Self::DEFAULT_SIGMA_COLOR,
            sigma_space: Self::DEFAULT_SIGMA_SPACE,
            edge_extractor: EdgeExtractorKind::default(),
            contour_tracer: ContourTracerKind::default(),
        }
    }
}

fn check_range<T>(name: &'static str, value: f64, range: &RangeInclusive<T>) -> Result<(), PipelineError>
where
    T: Copy + Into<f64>,
{
    let (min, max) = ((*range.start()).into(), (*range.end()).into());
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(PipelineError::ParameterOutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

/// Result of running the full image processing pipeline.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    /// Binary map handed to the contour tracer (edge = max value, else 0).
    ///
    /// Shells display this and re-encode it as PNG.
    pub edges: GrayImage,

    /// Traced contours in discovery order.
    pub contours: Vec<Contour>,

    /// Dimensions of the binary map in pixels.
    ///
    /// Export serializers use this for the document size.
    pub dimensions: Dimensions,
}

/// Result of running the pipeline with all intermediate stage outputs preserved.
///
/// Each field captures the output of one logical pipeline stage so a
/// shell can show a preview for every step of the processing chain.
#[derive(Debug, Clone)]
pub struct StagedResult {
    /// Stage 1: single-channel intensity image.
    pub grayscale: GrayImage,
    /// Stage 2: bilateral-filtered image.
    pub smoothed: GrayImage,
    /// Stage 3: binary edge map.
    pub edges: GrayImage,
    /// Stage 4: traced contours.
    pub contours: Vec<Contour>,
    /// Source image dimensions in pixels.
    pub dimensions: Dimensions,
}

impl StagedResult {
    /// Drop the raster intermediates that only previews need.
    #[must_use]
    pub fn into_process_result(self) -> ProcessResult {
        ProcessResult {
            edges: self.edges,
            contours: self.contours,
            dimensions: self.dimensions,
        }
    }
}

/// Broad classification of a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The pixel data handed to the pipeline is unusable.
    MalformedInput,
    /// The configuration violates a declared range or invariant.
    InvalidConfiguration,
}

/// Errors that can occur during pipeline processing.
///
/// Every error is raised before the first stage runs, so a failed run
/// never produces partial output.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The pixel buffer has a channel count other than 1 or 3.
    #[error("unsupported channel count {0} (expected 1 or 3)")]
    UnsupportedChannels(u8),

    /// The pixel buffer has a zero width or height.
    #[error("image dimensions must be positive, got {width}x{height}")]
    ZeroDimensions {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
    },

    /// The sample count does not match `width * height * channels`.
    #[error("pixel buffer holds {actual} samples, expected {expected}")]
    BufferLength {
        /// `width * height * channels`.
        expected: u64,
        /// Length of the provided buffer.
        actual: u64,
    },

    /// A parameter lies outside its declared range.
    #[error("{name} = {value} is outside the accepted range {min}..={max}")]
    ParameterOutOfRange {
        /// Config field name.
        name: &'static str,
        /// Offending value.
        value: f64,
        /// Smallest accepted value.
        min: f64,
        /// Largest accepted value.
        max: f64,
    },

    /// Hysteresis low threshold is above the high threshold.
    #[error("hysteresis low threshold {low} exceeds high threshold {high}")]
    HysteresisOrder {
        /// Low threshold.
        low: f32,
        /// High threshold.
        high: f32,
    },
}

impl PipelineError {
    /// Classify the error as bad input or bad configuration.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyInput
            | Self::ImageDecode(_)
            | Self::UnsupportedChannels(_)
            | Self::ZeroDimensions { .. }
            | Self::BufferLength { .. } => ErrorKind::MalformedInput,
            Self::ParameterOutOfRange { .. } | Self::HysteresisOrder { .. } => {
                ErrorKind::InvalidConfiguration
            }
        }
    }
}
