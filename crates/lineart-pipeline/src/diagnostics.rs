//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! Every pipeline run goes through [`process_staged_with_diagnostics`];
//! the plain entry points in the crate root drive it with a clock that
//! never advances and drop the diagnostics.
//!
//! The crate stays sans-IO: it never reads the system time itself.
//! Callers supply a [`Clock`] (the CLI uses one backed by
//! `std::time::Instant`).
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::contour::ContourTracer;
use crate::edge::{EdgeExtractor, count_foreground};
use crate::types::{Contour, Dimensions, PipelineConfig, PipelineError, RawImage, StagedResult};
use crate::{grayscale, smooth};

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// A clock that never advances. Every duration it reports is zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrozenClock;

impl Clock for FrozenClock {
    type Instant = ();

    fn now(&self) {}

    fn elapsed(&self, _since: &()) -> Duration {
        Duration::ZERO
    }
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: input validation and grayscale normalization.
    pub grayscale: StageDiagnostics,
    /// Stage 2: bilateral smoothing.
    pub smoothing: StageDiagnostics,
    /// Stage 3: binary map extraction (threshold or hysteresis).
    pub edge_extraction: StageDiagnostics,
    /// Stage 4: contour tracing.
    pub contour_tracing: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Grayscale normalization metrics.
    Grayscale {
        /// Channel count of the input buffer (1 or 3).
        input_channels: u8,
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },
    /// Bilateral smoothing metrics.
    Smoothing {
        /// Window diameter in pixels.
        diameter: u32,
        /// Intensity falloff.
        sigma_color: f32,
        /// Distance falloff.
        sigma_space: f32,
    },
    /// Binary map extraction metrics.
    EdgeExtraction {
        /// Which extraction strategy ran (`threshold` or `hysteresis`).
        mode: String,
        /// Number of foreground pixels in the output.
        foreground_pixel_count: u64,
        /// Total pixel count for computing foreground density.
        total_pixel_count: u64,
    },
    /// Contour tracing metrics.
    ContourTracing {
        /// Number of contours found.
        contour_count: usize,
        /// Total number of points across all contours.
        total_point_count: usize,
        /// Minimum points in any single contour.
        min_contour_points: usize,
        /// Maximum points in any single contour.
        max_contour_points: usize,
        /// Mean points per contour.
        mean_contour_points: f64,
    },
}

/// High-level summary counts for the entire pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Number of contours found.
    pub contour_count: usize,
    /// Total points across all contours.
    pub total_point_count: usize,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Grayscale", &self.grayscale),
            ("Smoothing", &self.smoothing),
            ("Edge Extraction", &self.edge_extraction),
            ("Contour Tracing", &self.contour_tracing),
        ];
        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Contours: {}  |  Total points: {}",
            self.summary.contour_count, self.summary.total_point_count,
        ));

        lines.join("\n")
    }
}

/// Run the pipeline, timing each stage with `clock`.
///
/// Identical results to [`process_staged`](crate::process_staged); the
/// diagnostics are the only addition.
///
/// # Errors
///
/// Same as [`process_staged`](crate::process_staged): configuration and
/// input problems are reported before any stage runs.
pub fn process_staged_with_diagnostics<C: Clock>(
    raw: &RawImage,
    config: &PipelineConfig,
    clock: &C,
) -> Result<(StagedResult, PipelineDiagnostics), PipelineError> {
    let total_start = clock.now();

    config.validate()?;

    let start = clock.now();
    let gray = grayscale::to_grayscale(raw)?;
    let dimensions = Dimensions::of(&gray);
    let grayscale_diag = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Grayscale {
            input_channels: raw.channels(),
            width: dimensions.width,
            height: dimensions.height,
        },
    };
    tracing::debug!(
        width = dimensions.width,
        height = dimensions.height,
        channels = raw.channels(),
        "grayscale normalized"
    );

    let start = clock.now();
    let smoothed = smooth::bilateral_filter(
        &gray,
        config.smooth_diameter,
        config.sigma_color,
        config.sigma_space,
    );
    let smoothing_diag = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Smoothing {
            diameter: config.smooth_diameter,
            sigma_color: config.sigma_color,
            sigma_space: config.sigma_space,
        },
    };
    tracing::debug!(
        diameter = config.smooth_diameter,
        sigma_color = config.sigma_color,
        sigma_space = config.sigma_space,
        "smoothing applied"
    );

    let start = clock.now();
    let edges = config.edge_extractor.extract(&smoothed);
    let foreground = count_foreground(&edges);
    let edge_diag = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::EdgeExtraction {
            mode: config.edge_extractor.name().to_owned(),
            foreground_pixel_count: foreground,
            total_pixel_count: dimensions.pixel_count(),
        },
    };
    tracing::debug!(
        mode = config.edge_extractor.name(),
        foreground,
        "binary map extracted"
    );

    let start = clock.now();
    let contours = config.contour_tracer.trace(&edges);
    let stats = contour_stats(&contours);
    let contour_diag = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::ContourTracing {
            contour_count: contours.len(),
            total_point_count: stats.total,
            min_contour_points: stats.min,
            max_contour_points: stats.max,
            mean_contour_points: stats.mean,
        },
    };
    tracing::debug!(
        contours = contours.len(),
        points = stats.total,
        "contours traced"
    );

    let total_duration = clock.elapsed(&total_start);
    tracing::info!(
        width = dimensions.width,
        height = dimensions.height,
        mode = config.edge_extractor.name(),
        contours = contours.len(),
        points = stats.total,
        "pipeline finished"
    );

    let diagnostics = PipelineDiagnostics {
        grayscale: grayscale_diag,
        smoothing: smoothing_diag,
        edge_extraction: edge_diag,
        contour_tracing: contour_diag,
        total_duration,
        summary: PipelineSummary {
            image_width: dimensions.width,
            image_height: dimensions.height,
            pixel_count: dimensions.pixel_count(),
            contour_count: contours.len(),
            total_point_count: stats.total,
        },
    };
    let staged = StagedResult {
        grayscale: gray,
        smoothed,
        edges,
        contours,
        dimensions,
    };
    Ok((staged, diagnostics))
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Grayscale {
            input_channels,
            width,
            height,
        } => format!("{input_channels}ch -> {width}x{height}"),
        StageMetrics::Smoothing {
            diameter,
            sigma_color,
            sigma_space,
        } => format!("d={diameter} sigma_color={sigma_color:.1} sigma_space={sigma_space:.1}"),
        StageMetrics::EdgeExtraction {
            mode,
            foreground_pixel_count,
            total_pixel_count,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let density = if *total_pixel_count > 0 {
                *foreground_pixel_count as f64 / *total_pixel_count as f64 * 100.0
            } else {
                0.0
            };
            format!("{mode} foreground={foreground_pixel_count} ({density:.1}%)")
        }
        StageMetrics::ContourTracing {
            contour_count,
            total_point_count,
            min_contour_points,
            max_contour_points,
            mean_contour_points,
        } => {
            format!(
                "{contour_count} contours, {total_point_count} pts (min={min_contour_points} max={max_contour_points} mean={mean_contour_points:.1})",
            )
        }
    }
}

/// Statistics for a set of contours.
pub(crate) struct ContourStats {
    /// Total number of points across all contours.
    pub total: usize,
    /// Minimum number of points in any single contour.
    pub min: usize,
    /// Maximum number of points in any single contour.
    pub max: usize,
    /// Mean number of points per contour.
    pub mean: f64,
}

pub(crate) fn contour_stats(contours: &[Contour]) -> ContourStats {
    let total: usize = contours.iter().map(Contour::len).sum();
    let min = contours.iter().map(Contour::len).min().unwrap_or(0);
    let max = contours.iter().map(Contour::len).max().unwrap_or(0);
    #[allow(clippy::cast_precision_loss)]
    let mean = if contours.is_empty() {
        0.0
    } else {
        total as f64 / contours.len() as f64
    };
    ContourStats {
        total,
        min,
        max,
        mean,
    }
}
