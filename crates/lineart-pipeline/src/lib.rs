//! lineart-pipeline: Pure raster-to-line-art pipeline (sans-IO).
//!
//! Converts a decoded pixel buffer into a binary map and a set of traced
//! contours through:
//! grayscale -> bilateral smoothing -> threshold or hysteresis edges ->
//! contour tracing.
//!
//! This crate has **no I/O dependencies**. It operates on in-memory
//! buffers and returns structured data; reading files, encoding PNGs and
//! writing SVG text live in the shells (`lineart-cli`, `lineart-export`).

pub mod contour;
pub mod diagnostics;
pub mod edge;
pub mod grayscale;
pub mod hysteresis;
pub mod smooth;
pub mod types;

pub use contour::{ContourTracer, ContourTracerKind};
pub use diagnostics::{Clock, PipelineDiagnostics, process_staged_with_diagnostics};
pub use edge::{EdgeExtractor, EdgeExtractorKind};
pub use types::{
    Contour, Dimensions, ErrorKind, GrayImage, PipelineConfig, PipelineError, Point,
    ProcessResult, RawImage, StagedResult,
};

/// Run the full pipeline.
///
/// Produces the binary map, the traced contours and the image
/// dimensions. The dimensions are needed by export serializers to set
/// the coordinate space (e.g. SVG `viewBox`).
///
/// # Pipeline steps
///
/// 1. Validate the configuration and the input buffer
/// 2. Normalize to a single grayscale channel
/// 3. Bilateral smoothing
/// 4. Binary map extraction (fixed threshold or hysteresis)
/// 5. Contour tracing
///
/// An image with no foreground yields an empty contour list, not an
/// error.
///
/// # Errors
///
/// Returns [`PipelineError::ParameterOutOfRange`] or
/// [`PipelineError::HysteresisOrder`] for an invalid `config`, and
/// [`PipelineError::UnsupportedChannels`],
/// [`PipelineError::ZeroDimensions`] or [`PipelineError::BufferLength`]
/// for a malformed `raw` buffer. Nothing is computed in either case.
pub fn process(raw: &RawImage, config: &PipelineConfig) -> Result<ProcessResult, PipelineError> {
    process_staged(raw, config).map(StagedResult::into_process_result)
}

/// Run the full pipeline, keeping every intermediate image.
///
/// Same as [`process`], but the grayscale and smoothed images are kept
/// alongside the binary map for preview and debugging.
///
/// # Errors
///
/// Same as [`process`].
pub fn process_staged(raw: &RawImage, config: &PipelineConfig) -> Result<StagedResult, PipelineError> {
    process_staged_with_diagnostics(raw, config, &diagnostics::FrozenClock).map(|(staged, _)| staged)
}
