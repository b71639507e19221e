//! lineart: turn an image file into a binary line-art PNG and an SVG path
//! document.
//!
//! Reads the image, runs the pipeline with per-stage diagnostics, prints
//! the diagnostics report (or JSON), and writes the requested outputs.
//!
//! # Usage
//!
//! ```text
//! lineart [OPTIONS] <IMAGE_PATH>
//! lineart photo.jpg --mode hysteresis --low 60 --high 180 --svg out.svg --png out.png
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::builder::RangedU64ValueParser;
use clap::{ArgAction, Parser, ValueEnum};
use lineart_export::{SvgMetadata, VectorDocument};
use lineart_pipeline::diagnostics::{Clock, PipelineDiagnostics};
use lineart_pipeline::{EdgeExtractorKind, PipelineConfig, StagedResult};
use tracing_subscriber::EnvFilter;

/// Convert an image into line art.
///
/// Smooths the image while keeping edges, extracts a binary map with a
/// fixed threshold or hysteresis edge detection, traces the boundaries
/// and writes them out as a single SVG path.
#[derive(Parser, Debug)]
#[command(name = "lineart", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Smoothing window diameter in pixels (1-20).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_SMOOTH_DIAMETER, value_parser = RangedU64ValueParser::<u32>::new().range(1..=20))]
    diameter: u32,

    /// Smoothing intensity falloff (1-150).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_SIGMA_COLOR, value_parser = parse_sigma)]
    sigma_color: f32,

    /// Smoothing distance falloff (1-150).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_SIGMA_SPACE, value_parser = parse_sigma)]
    sigma_space: f32,

    /// How the binary map is produced.
    #[arg(long, value_enum, default_value_t = Mode::Threshold)]
    mode: Mode,

    /// Threshold mode: intensities above this become foreground.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_THRESHOLD)]
    threshold: u8,

    /// Threshold mode: value written for foreground pixels.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_MAX_VALUE)]
    max_value: u8,

    /// Hysteresis mode: weak-edge threshold (50-150).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_HYSTERESIS_LOW, value_parser = parse_low)]
    low: f32,

    /// Hysteresis mode: definite-edge threshold (150-250).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_HYSTERESIS_HIGH, value_parser = parse_high)]
    high: f32,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// The JSON must be a valid `PipelineConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Write the binary map as a PNG file.
    #[arg(long)]
    png: Option<PathBuf>,

    /// Write the traced contours as an SVG file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// SVG `<title>`. Defaults to the input file stem.
    #[arg(long)]
    title: Option<String>,

    /// Output diagnostics as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Binary map extraction mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Fixed-threshold binarization.
    Threshold,
    /// Gradient edges with hysteresis thresholding.
    Hysteresis,
}

fn parse_f32_in(s: &str, range: &std::ops::RangeInclusive<f32>) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|e| format!("`{s}` is not a number: {e}"))?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "{value} is not in {}..={}",
            range.start(),
            range.end()
        ))
    }
}

fn parse_sigma(s: &str) -> Result<f32, String> {
    parse_f32_in(s, &PipelineConfig::SIGMA_RANGE)
}

fn parse_low(s: &str) -> Result<f32, String> {
    parse_f32_in(s, &PipelineConfig::HYSTERESIS_LOW_RANGE)
}

fn parse_high(s: &str) -> Result<f32, String> {
    parse_f32_in(s, &PipelineConfig::HYSTERESIS_HIGH_RANGE)
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).context("Error parsing --config-json");
    }

    let edge_extractor = match cli.mode {
        Mode::Threshold => EdgeExtractorKind::Threshold {
            threshold: cli.threshold,
            max_value: cli.max_value,
        },
        Mode::Hysteresis => EdgeExtractorKind::Hysteresis {
            low: cli.low,
            high: cli.high,
        },
    };

    Ok(PipelineConfig {
        smooth_diameter: cli.diameter,
        sigma_color: cli.sigma_color,
        sigma_space: cli.sigma_space,
        edge_extractor,
        ..PipelineConfig::default()
    })
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = config_from_cli(cli)?;
    config.validate().context("Invalid pipeline configuration")?;

    let image_bytes = std::fs::read(&cli.image_path)
        .with_context(|| format!("Error reading {}", cli.image_path.display()))?;
    let raw = lineart_pipeline::grayscale::decode(&image_bytes)
        .with_context(|| format!("Error decoding {}", cli.image_path.display()))?;
    tracing::info!(
        path = %cli.image_path.display(),
        bytes = image_bytes.len(),
        width = raw.width(),
        height = raw.height(),
        channels = raw.channels(),
        "image loaded"
    );

    let mut all_diagnostics = Vec::with_capacity(cli.runs);
    let mut first_result = None;

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        let (staged, diagnostics) =
            lineart_pipeline::process_staged_with_diagnostics(&raw, &config, &StdClock)
                .context("Pipeline error")?;

        if cli.json {
            let json = serde_json::to_string_pretty(&diagnostics)
                .context("Error serializing diagnostics")?;
            println!("{json}");
        } else {
            println!("{}", diagnostics.report());
        }

        if first_result.is_none() {
            first_result = Some(staged);
        }
        all_diagnostics.push(diagnostics);
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    let Some(staged) = first_result else {
        bail!("no pipeline runs were performed");
    };
    if let Some(ref png_path) = cli.png {
        write_png(&staged, png_path)?;
    }
    if let Some(ref svg_path) = cli.svg {
        write_svg(cli, &config, &staged, svg_path)?;
    }
    Ok(())
}

fn write_png(staged: &StagedResult, path: &Path) -> Result<()> {
    staged
        .edges
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("Error writing PNG to {}", path.display()))?;
    eprintln!("PNG written to {}", path.display());
    Ok(())
}

fn write_svg(cli: &Cli, config: &PipelineConfig, staged: &StagedResult, path: &Path) -> Result<()> {
    let stem = cli
        .image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("lineart");
    let title = cli.title.as_deref().unwrap_or(stem);
    let description = describe(config);
    let metadata = SvgMetadata {
        title: Some(title),
        description: Some(&description),
    };

    let document = VectorDocument::from_contours(&staged.contours, staged.dimensions)
        .context("Error building vector document")?;
    let svg = lineart_export::to_svg(&document, &metadata);
    std::fs::write(path, &svg).with_context(|| format!("Error writing SVG to {}", path.display()))?;
    eprintln!("SVG written to {} ({} bytes)", path.display(), svg.len());
    Ok(())
}

/// One-line parameter summary embedded as the SVG `<desc>`.
fn describe(config: &PipelineConfig) -> String {
    let mode = match config.edge_extractor {
        EdgeExtractorKind::Threshold {
            threshold,
            max_value,
        } => format!("threshold={threshold} max_value={max_value}"),
        EdgeExtractorKind::Hysteresis { low, high } => format!("hysteresis low={low} high={high}"),
    };
    format!(
        "lineart d={} sigma_color={} sigma_space={} {mode}",
        config.smooth_diameter, config.sigma_color, config.sigma_space,
    )
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&PipelineDiagnostics) -> Duration;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[PipelineDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Grayscale", |d| d.grayscale.duration),
        ("Smoothing", |d| d.smoothing.duration),
        ("Edge Extraction", |d| d.edge_extraction.duration),
        ("Contour Tracing", |d| d.contour_tracing.duration),
    ];

    for (name, extractor) in stage_extractors {
        let total: f64 = all_diagnostics
            .iter()
            .map(|d| extractor(d).as_secs_f64() * 1000.0)
            .sum();
        let stage_mean = total / all_diagnostics.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("lineart").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_match_pipeline_defaults() {
        let cli = parse(&["in.png"]).unwrap();
        assert_eq!(config_from_cli(&cli).unwrap(), PipelineConfig::default());
    }

    #[test]
    fn hysteresis_flags_build_hysteresis_config() {
        let cli = parse(&["in.png", "--mode", "hysteresis", "--low", "60", "--high", "200"]).unwrap();
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(
            config.edge_extractor,
            EdgeExtractorKind::Hysteresis {
                low: 60.0,
                high: 200.0
            }
        );
    }

    #[test]
    fn out_of_range_values_are_rejected_by_parser() {
        assert!(parse(&["in.png", "--diameter", "21"]).is_err());
        assert!(parse(&["in.png", "--diameter", "0"]).is_err());
        assert!(parse(&["in.png", "--sigma-color", "151"]).is_err());
        assert!(parse(&["in.png", "--low", "49"]).is_err());
        assert!(parse(&["in.png", "--high", "251"]).is_err());
        assert!(parse(&["in.png", "--threshold", "256"]).is_err());
    }

    #[test]
    fn config_json_overrides_flags() {
        let json = r#"{"smooth_diameter":3,"edge_extractor":{"mode":"hysteresis","low":70.0,"high":160.0}}"#;
        let cli = parse(&["in.png", "--diameter", "15", "--config-json", json]).unwrap();
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.smooth_diameter, 3);
        assert_eq!(config.edge_extractor.name(), "hysteresis");
    }

    #[test]
    fn bad_config_json_is_an_error() {
        let cli = parse(&["in.png", "--config-json", "{not json"]).unwrap();
        let err = config_from_cli(&cli).unwrap_err();
        assert!(format!("{err:#}").contains("--config-json"));
    }

    #[test]
    fn verbosity_counts() {
        let cli = parse(&["in.png", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn describe_names_mode() {
        let text = describe(&PipelineConfig::default());
        assert!(text.contains("threshold=127 max_value=255"));
        assert!(text.starts_with("lineart d=9"));
    }
}
