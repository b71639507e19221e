//! Gradient edge detection with non-maximum suppression and hysteresis.
//!
//! The smoothed image is differentiated with 3x3 Sobel kernels
//! ([`imageproc::filter::filter_clamped`]), the gradient magnitude is
//! thinned to single-pixel ridges along the gradient direction, and the
//! ridges are classified with two thresholds:
//!
//! - magnitude `> high`: definite edge;
//! - `low <= magnitude <= high`: edge only if 8-connected, transitively,
//!   to a definite edge;
//! - magnitude `< low`: never an edge.
//!
//! No Gaussian pre-blur happens here; smoothing is the bilateral stage's
//! job.

use image::{GrayImage, Luma};
use imageproc::definitions::Image;
use imageproc::filter::filter_clamped;
use imageproc::kernel;

/// Value written for edge pixels.
pub const EDGE: u8 = u8::MAX;

/// The eight neighbor offsets, used by the hysteresis flood fill.
const NEIGHBORS: [(i64, i64); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Detect edges in a grayscale image.
///
/// Returns a binary image: [`EDGE`] for edge pixels, 0 elsewhere.
/// The thresholds are not checked here: `low <= high` is enforced by
/// [`PipelineConfig::validate`](crate::PipelineConfig::validate) before
/// any stage runs, and only asserted in debug builds.
#[must_use = "returns the binary edge map"]
pub(crate) fn detect_edges(image: &GrayImage, low: f32, high: f32) -> GrayImage {
    debug_assert!(low <= high, "hysteresis thresholds out of order");

    let gx: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_HORIZONTAL_3X3);
    let gy: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_VERTICAL_3X3);
    let magnitude = gradient_magnitude(&gx, &gy);
    let thinned = non_maximum_suppression(image, &magnitude, &gx, &gy);
    hysteresis(&thinned, low, high)
}

/// Euclidean gradient magnitude per pixel.
fn gradient_magnitude(gx: &Image<Luma<i16>>, gy: &Image<Luma<i16>>) -> Image<Luma<f32>> {
    Image::from_fn(gx.width(), gx.height(), |x, y| {
        let h = f32::from(gx.get_pixel(x, y).0[0]);
        let v = f32::from(gy.get_pixel(x, y).0[0]);
        Luma([h.hypot(v)])
    })
}

/// Magnitude and intensity of one pixel on a suppression axis.
#[derive(Clone, Copy)]
struct Sample {
    magnitude: f32,
    /// `None` off-image.
    intensity: Option<u8>,
}

/// Keep only pixels that are local maxima along their gradient direction.
///
/// The direction is quantized to one of four axes (0, 45, 90, 135
/// degrees) and the axis is oriented from the darker neighbor toward the
/// brighter one, read from the intensity image so the result does not
/// depend on the sign convention of the Sobel kernels. Out-of-bounds
/// samples count as darkest with zero magnitude.
///
/// A ridge pixel is at least its darker neighbor and strictly above its
/// brighter one, which settles exact ties toward the bright side. A step
/// that has been smoothed is rarely an exact tie, so a ridge is then
/// handed one pixel toward the bright side when the intensity step to
/// that neighbor is the larger of the two and the neighbor carries at
/// least half the ridge's magnitude. The survivor is then the brighter
/// pixel of the pair straddling the steepest step.
fn non_maximum_suppression(
    intensity: &GrayImage,
    g: &Image<Luma<f32>>,
    gx: &Image<Luma<i16>>,
    gy: &Image<Luma<i16>>,
) -> Image<Luma<f32>> {
    const RADIANS_TO_DEGREES: f32 = 180.0 / std::f32::consts::PI;

    let (w, h) = g.dimensions();
    let sample = |x: i64, y: i64| match (u32::try_from(x), u32::try_from(y)) {
        (Ok(x), Ok(y)) if x < w && y < h => Sample {
            magnitude: g.get_pixel(x, y).0[0],
            intensity: Some(intensity.get_pixel(x, y).0[0]),
        },
        _ => Sample {
            magnitude: 0.0,
            intensity: None,
        },
    };

    Image::from_fn(w, h, |x, y| {
        let m = g.get_pixel(x, y).0[0];
        if m <= 0.0 {
            return Luma([0.0]);
        }

        let x_gradient = f32::from(gx.get_pixel(x, y).0[0]);
        let y_gradient = f32::from(gy.get_pixel(x, y).0[0]);
        let mut angle = y_gradient.atan2(x_gradient) * RADIANS_TO_DEGREES;
        if angle < 0.0 {
            angle += 180.0;
        }
        let (dx, dy) = if !(22.5..157.5).contains(&angle) {
            (1, 0)
        } else if angle < 67.5 {
            (1, 1)
        } else if angle < 112.5 {
            (0, 1)
        } else {
            (-1, 1)
        };

        let (x, y) = (i64::from(x), i64::from(y));
        // `None < Some(_)`, so off-image neighbors are the darker side.
        let (dx, dy) = if sample(x + dx, y + dy).intensity >= sample(x - dx, y - dy).intensity {
            (dx, dy)
        } else {
            (-dx, -dy)
        };
        // Two steps toward the dark side through one toward the bright side;
        // this pixel sits at index 2.
        let axis = [-2, -1, 0, 1].map(|k| sample(x + k * dx, y + k * dy));

        let keeps_own = is_ridge(&axis, 2) && !hands_over(&axis, 2);
        let takes_darker = is_ridge(&axis, 1) && hands_over(&axis, 1);
        if keeps_own || takes_darker {
            Luma([m])
        } else {
            Luma([0.0])
        }
    })
}

/// At least the darker neighbor and strictly above the brighter one.
const fn is_ridge(axis: &[Sample; 4], i: usize) -> bool {
    let m = axis[i].magnitude;
    m > 0.0 && m >= axis[i - 1].magnitude && m > axis[i + 1].magnitude
}

/// Whether the ridge at `i` belongs to its brighter neighbor instead.
const fn hands_over(axis: &[Sample; 4], i: usize) -> bool {
    let (dark, here, bright) = (axis[i - 1], axis[i], axis[i + 1]);
    2.0 * bright.magnitude >= here.magnitude
        && intensity_step(here, bright) > intensity_step(dark, here)
}

/// Absolute intensity difference; zero across the image border.
const fn intensity_step(a: Sample, b: Sample) -> u8 {
    match (a.intensity, b.intensity) {
        (Some(a), Some(b)) => a.abs_diff(b),
        _ => 0,
    }
}

/// Classify thinned gradient responses with two thresholds.
///
/// Iterative depth-first flood fill from every definite edge; each
/// neighbor is bounds-checked before access.
fn hysteresis(input: &Image<Luma<f32>>, low: f32, high: f32) -> GrayImage {
    let (w, h) = input.dimensions();
    let mut out = GrayImage::new(w, h);
    let mut stack = Vec::new();

    for y in 0..h {
        for x in 0..w {
            if input.get_pixel(x, y).0[0] <= high || out.get_pixel(x, y).0[0] != 0 {
                continue;
            }
            out.put_pixel(x, y, Luma([EDGE]));
            stack.push((x, y));

            while let Some((cx, cy)) = stack.pop() {
                for (dx, dy) in NEIGHBORS {
                    let (Ok(nx), Ok(ny)) = (
                        u32::try_from(i64::from(cx) + dx),
                        u32::try_from(i64::from(cy) + dy),
                    ) else {
                        continue;
                    };
                    if nx >= w || ny >= h {
                        continue;
                    }
                    if out.get_pixel(nx, ny).0[0] == 0 && input.get_pixel(nx, ny).0[0] >= low {
                        out.put_pixel(nx, ny, Luma([EDGE]));
                        stack.push((nx, ny));
                    }
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_pixels(img: &GrayImage) -> Vec<(u32, u32)> {
        img.enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] != 0)
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    /// 20x20 image with a filled 10x10 square of 255 at (5..15, 5..15).
    fn square_image() -> GrayImage {
        GrayImage::from_fn(20, 20, |x, y| {
            if (5..15).contains(&x) && (5..15).contains(&y) {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    #[test]
    fn blank_image_produces_no_edges() {
        let img = GrayImage::from_pixel(20, 20, Luma([128]));
        let edges = detect_edges(&img, 50.0, 150.0);
        assert!(edge_pixels(&edges).is_empty());
    }

    #[test]
    fn output_dimensions_match_input() {
        let img = GrayImage::new(17, 31);
        let edges = detect_edges(&img, 50.0, 150.0);
        assert_eq!(edges.width(), 17);
        assert_eq!(edges.height(), 31);
    }

    #[test]
    fn vertical_step_gives_single_pixel_line_on_bright_side() {
        let img = GrayImage::from_fn(20, 20, |x, _| if x < 10 { Luma([0]) } else { Luma([255]) });
        let edges = detect_edges(&img, 50.0, 150.0);
        let pixels = edge_pixels(&edges);
        assert_eq!(pixels.len(), 20, "expected one edge pixel per row");
        assert!(pixels.iter().all(|&(x, _)| x == 10), "got {pixels:?}");
    }

    #[test]
    fn square_outline_is_closed_rectangle() {
        let edges = detect_edges(&square_image(), 50.0, 150.0);
        for y in 0..20 {
            for x in 0..20 {
                let on_ring = (5..15).contains(&x)
                    && (5..15).contains(&y)
                    && (x == 5 || x == 14 || y == 5 || y == 14);
                assert_eq!(
                    edges.get_pixel(x, y).0[0] != 0,
                    on_ring,
                    "unexpected classification at ({x},{y})",
                );
            }
        }
    }

    #[test]
    fn dark_side_residue_keeps_edge_on_bright_side() {
        // After smoothing, the dark pixel next to the step can carry a
        // slightly larger magnitude (1016) than the bright one (1012).
        let row = |x: u32| match x {
            0..=8 => 0,
            9 => 2,
            10 => 254,
            _ => 255,
        };
        let img = GrayImage::from_fn(20, 20, |x, _| Luma([row(x)]));
        let pixels = edge_pixels(&detect_edges(&img, 50.0, 150.0));
        assert_eq!(pixels.len(), 20, "got {pixels:?}");
        assert!(pixels.iter().all(|&(x, _)| x == 10), "got {pixels:?}");

        let mirrored = GrayImage::from_fn(20, 20, |x, _| Luma([row(19 - x)]));
        let pixels = edge_pixels(&detect_edges(&mirrored, 50.0, 150.0));
        assert_eq!(pixels.len(), 20, "got {pixels:?}");
        assert!(pixels.iter().all(|&(x, _)| x == 9), "got {pixels:?}");
    }

    #[test]
    fn soft_edge_keeps_a_single_ridge() {
        // Logistic ramp centred between x=19 and x=20.
        const RAMP: [u8; 40] = [
            0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 2, 4, 6, 10, 15, 24, 38, 57, 82, 112, 143, 173, 198,
            217, 231, 240, 245, 249, 251, 253, 254, 254, 255, 255, 255, 255, 255, 255, 255, 255,
        ];
        let img = GrayImage::from_fn(40, 6, |x, _| Luma([RAMP[x as usize]]));
        let pixels = edge_pixels(&detect_edges(&img, 50.0, 150.0));
        assert_eq!(pixels.len(), 6, "got {pixels:?}");
        assert!(pixels.iter().all(|&(x, _)| x == 20), "got {pixels:?}");
    }

    #[test]
    fn one_pixel_line_keeps_both_flanks() {
        // The line pixel itself has zero gradient, so neither flank hands over.
        let img = GrayImage::from_fn(12, 12, |x, _| if x == 5 { Luma([255]) } else { Luma([0]) });
        let pixels = edge_pixels(&detect_edges(&img, 50.0, 150.0));
        assert_eq!(pixels.len(), 24, "got {pixels:?}");
        assert!(pixels.iter().all(|&(x, _)| x == 4 || x == 6), "got {pixels:?}");
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "hysteresis thresholds out of order")]
    fn thresholds_out_of_order_assert_in_debug() {
        let _ = detect_edges(&GrayImage::new(4, 4), 150.0, 50.0);
    }

    #[test]
    fn output_is_binary() {
        let img = GrayImage::from_fn(16, 16, |x, y| Luma([u8::try_from((x * 37 + y * 11) % 256).unwrap_or(0)]));
        let edges = detect_edges(&img, 50.0, 150.0);
        assert!(edges.pixels().all(|p| p.0[0] == 0 || p.0[0] == EDGE));
    }

    #[test]
    fn weak_edge_without_strong_neighbor_is_dropped() {
        // A 40-level step gives magnitude 160: above low=50, below high=200.
        let img = GrayImage::from_fn(20, 20, |x, _| if x < 10 { Luma([100]) } else { Luma([140]) });
        let edges = detect_edges(&img, 50.0, 200.0);
        assert!(edge_pixels(&edges).is_empty());
        // The same step becomes a definite edge once high drops below 160.
        let edges = detect_edges(&img, 50.0, 150.0);
        assert!(!edge_pixels(&edges).is_empty());
    }

    #[test]
    fn weak_edge_connected_to_strong_edge_is_kept() {
        let mut input = Image::from_pixel(5, 1, Luma([0.0_f32]));
        input.put_pixel(0, 0, Luma([200.0]));
        input.put_pixel(1, 0, Luma([80.0]));
        input.put_pixel(2, 0, Luma([60.0]));
        input.put_pixel(4, 0, Luma([80.0]));
        let out = hysteresis(&input, 50.0, 150.0);
        assert_eq!(out.as_raw(), &vec![EDGE, EDGE, EDGE, 0, 0]);
    }

    #[test]
    fn diagonal_connection_counts() {
        let mut input = Image::from_pixel(3, 3, Luma([0.0_f32]));
        input.put_pixel(2, 2, Luma([200.0]));
        input.put_pixel(1, 1, Luma([60.0]));
        input.put_pixel(0, 0, Luma([60.0]));
        let out = hysteresis(&input, 50.0, 150.0);
        assert_eq!(edge_pixels(&out), vec![(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn magnitude_equal_to_high_is_not_definite() {
        let input = Image::from_pixel(2, 2, Luma([150.0_f32]));
        let out = hysteresis(&input, 50.0, 150.0);
        assert!(edge_pixels(&out).is_empty());
    }

    #[test]
    fn border_edges_do_not_panic() {
        let mut img = GrayImage::from_pixel(10, 10, Luma([0]));
        for y in 0..10 {
            img.put_pixel(1, y, Luma([255]));
        }
        let edges = detect_edges(&img, 50.0, 150.0);
        assert!(!edge_pixels(&edges).is_empty());
    }
}
