//! Integration test: run a synthetic square through the full pipeline and export to SVG.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use lineart_export::{SvgMetadata, VectorDocument, to_svg};
use lineart_pipeline::{EdgeExtractorKind, PipelineConfig, Point, grayscale};

/// PNG bytes of a 20x20 black image with a filled white 10x10 square.
fn square_png() -> Vec<u8> {
    let img = image::RgbImage::from_fn(20, 20, |x, y| {
        if (5..15).contains(&x) && (5..15).contains(&y) {
            image::Rgb([255, 255, 255])
        } else {
            image::Rgb([0, 0, 0])
        }
    });
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// Default smoothing with the default hysteresis thresholds.
fn hysteresis_config() -> PipelineConfig {
    PipelineConfig {
        edge_extractor: EdgeExtractorKind::default_hysteresis(),
        ..PipelineConfig::default()
    }
}

fn render(png: &[u8], config: &PipelineConfig) -> String {
    let raw = grayscale::decode(png).expect("decode should succeed");
    let result = lineart_pipeline::process(&raw, config).expect("pipeline should succeed");
    let doc = VectorDocument::from_contours(&result.contours, result.dimensions)
        .expect("traced contours lie inside the image");
    to_svg(
        &doc,
        &SvgMetadata {
            title: Some("square"),
            description: None,
        },
    )
}

#[test]
fn square_png_to_svg_has_four_corners() {
    let raw = grayscale::decode(&square_png()).unwrap();
    let result = lineart_pipeline::process(&raw, &hysteresis_config()).unwrap();
    assert_eq!(result.contours.len(), 1);
    assert_eq!(
        result.contours[0].points(),
        &[
            Point::new(5, 5),
            Point::new(14, 5),
            Point::new(14, 14),
            Point::new(5, 14),
        ]
    );

    let svg = render(&square_png(), &hysteresis_config());
    assert!(svg.starts_with(r#"<svg width="20" height="20""#));
    assert!(svg.ends_with("</svg>"));
    assert_eq!(svg.matches("<path").count(), 1);
    assert!(svg.contains(r#"d="M5,5 L14,5 L14,14 L5,14 z""#));
    assert!(svg.contains("<title>square</title>"));
}

#[test]
fn heavy_smoothing_keeps_square_path() {
    let config = PipelineConfig {
        smooth_diameter: 20,
        sigma_color: 150.0,
        sigma_space: 150.0,
        ..hysteresis_config()
    };
    let svg = render(&square_png(), &config);
    assert!(svg.contains(r#"d="M5,5 L14,5 L14,14 L5,14 z""#), "got {svg}");
}

#[test]
fn repeated_runs_produce_identical_text() {
    let png = square_png();
    for config in [PipelineConfig::default(), hysteresis_config()] {
        let first = render(&png, &config);
        let second = render(&png, &config);
        assert_eq!(first, second);
    }
}

#[test]
fn blank_image_yields_empty_path() {
    let img = image::GrayImage::from_pixel(10, 10, image::Luma([0]));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();

    let svg = render(&buf.into_inner(), &PipelineConfig::default());
    assert!(svg.starts_with(r#"<svg width="10" height="10""#));
    assert!(svg.contains(r#"d="""#));
    assert!(svg.ends_with("</svg>"));
}

#[test]
fn single_pixel_becomes_single_move_and_close() {
    let mut img = image::GrayImage::new(10, 10);
    img.put_pixel(5, 5, image::Luma([255]));
    let raw = lineart_pipeline::RawImage::from_gray(img);
    // Diameter 1 leaves the pixel untouched.
    let config = PipelineConfig {
        smooth_diameter: 1,
        ..PipelineConfig::default()
    };
    let result = lineart_pipeline::process(&raw, &config).unwrap();
    assert_eq!(result.contours.len(), 1);
    assert_eq!(result.contours[0].points(), &[Point::new(5, 5)]);

    let doc = VectorDocument::from_contours(&result.contours, result.dimensions).unwrap();
    assert_eq!(doc.path_data(), "M5,5 z");
}
