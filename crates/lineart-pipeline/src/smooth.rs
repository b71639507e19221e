//! Edge-preserving smoothing (bilateral filter).
//!
//! Each output pixel is a weighted average of a square window around
//! it. A neighbor's weight is the product of a Gaussian in spatial
//! distance and a Gaussian in intensity difference from the center, so
//! pixels across a sharp edge contribute almost nothing and the edge
//! survives while flat regions lose their noise.
//!
//! Windows clipped by the image border use only the in-bounds
//! neighbors; the weights are renormalized over what remains.

use image::{GrayImage, Luma};

/// Apply a bilateral filter to a grayscale image.
///
/// The window is `2 * (diameter / 2) + 1` pixels on a side, so a
/// diameter of 1 (or 0) degenerates to the identity. `sigma_color`
/// scales the intensity falloff, `sigma_space` the distance falloff.
///
/// Both sigmas must be positive. This is asserted in debug builds only;
/// [`PipelineConfig::validate`](crate::PipelineConfig::validate) rejects
/// other values before any stage runs. A release build handed a
/// non-positive sigma returns the image unchanged.
#[must_use = "returns the smoothed image"]
pub fn bilateral_filter(
    image: &GrayImage,
    diameter: u32,
    sigma_color: f32,
    sigma_space: f32,
) -> GrayImage {
    debug_assert!(
        sigma_color > 0.0 && sigma_space > 0.0,
        "bilateral sigmas must be positive"
    );
    let radius = diameter / 2;
    if radius == 0 || sigma_color <= 0.0 || sigma_space <= 0.0 {
        return image.clone();
    }

    let spatial = spatial_kernel(radius, f64::from(sigma_space));
    let range = range_table(f64::from(sigma_color));
    let side = 2 * radius + 1;
    let (w, h) = image.dimensions();

    GrayImage::from_fn(w, h, |x, y| {
        let center = image.get_pixel(x, y).0[0];

        let x0 = x.saturating_sub(radius);
        let y0 = y.saturating_sub(radius);
        let x1 = (x + radius + 1).min(w);
        let y1 = (y + radius + 1).min(h);

        let mut weighted_sum = 0.0_f64;
        let mut weight_total = 0.0_f64;
        for ny in y0..y1 {
            // Window-local row/column of (nx, ny), always in 0..side.
            let ky = ny + radius - y;
            for nx in x0..x1 {
                let kx = nx + radius - x;
                let value = image.get_pixel(nx, ny).0[0];
                let weight = spatial[(ky * side + kx) as usize]
                    * range[usize::from(value.abs_diff(center))];
                weighted_sum += weight * f64::from(value);
                weight_total += weight;
            }
        }

        // The center always contributes with weight 1, so the total is
        // never zero.
        Luma([to_intensity(weighted_sum / weight_total)])
    })
}

/// Spatial Gaussian weights for a `(2r+1)²` window, row-major.
#[allow(clippy::cast_possible_wrap)]
fn spatial_kernel(radius: u32, sigma: f64) -> Vec<f64> {
    let r = radius as i32;
    let denom = 2.0 * sigma * sigma;
    (-r..=r)
        .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
        .map(|(dx, dy)| (-f64::from(dx * dx + dy * dy) / denom).exp())
        .collect()
}

/// Intensity Gaussian weights indexed by absolute difference `0..=255`.
fn range_table(sigma: f64) -> [f64; 256] {
    let denom = 2.0 * sigma * sigma;
    std::array::from_fn(|diff| {
        #[allow(clippy::cast_precision_loss)]
        let d = diff as f64;
        (-(d * d) / denom).exp()
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_intensity(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Create a test image with a sharp black-to-white boundary at x=5.
    fn sharp_edge_image() -> GrayImage {
        GrayImage::from_fn(10, 10, |x, _y| {
            if x < 5 {
                image::Luma([0])
            } else {
                image::Luma([255])
            }
        })
    }

    #[test]
    fn uniform_image_is_unchanged() {
        let img = GrayImage::from_pixel(12, 9, image::Luma([137]));
        let smoothed = bilateral_filter(&img, 9, 75.0, 75.0);
        assert_eq!(img, smoothed);
    }

    #[test]
    fn diameter_one_is_identity() {
        let img = sharp_edge_image();
        assert_eq!(bilateral_filter(&img, 1, 75.0, 75.0), img);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "bilateral sigmas must be positive")]
    fn zero_sigma_color_asserts_in_debug() {
        let _ = bilateral_filter(&sharp_edge_image(), 5, 0.0, 10.0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "bilateral sigmas must be positive")]
    fn negative_sigma_space_asserts_in_debug() {
        let _ = bilateral_filter(&sharp_edge_image(), 5, 10.0, -1.0);
    }

    #[test]
    fn output_dimensions_preserved() {
        let img = GrayImage::new(17, 31);
        let smoothed = bilateral_filter(&img, 5, 20.0, 20.0);
        assert_eq!(smoothed.width(), 17);
        assert_eq!(smoothed.height(), 31);
    }

    #[test]
    fn sharp_edge_survives_small_color_sigma() {
        // A 255 jump is ~10 sigmas away, so across-edge weights vanish.
        let img = sharp_edge_image();
        let smoothed = bilateral_filter(&img, 9, 25.0, 75.0);
        assert_eq!(img, smoothed);
    }

    #[test]
    fn isolated_noise_is_reduced() {
        let mut img = GrayImage::from_pixel(9, 9, image::Luma([100]));
        img.put_pixel(4, 4, image::Luma([140]));
        let smoothed = bilateral_filter(&img, 5, 75.0, 10.0);
        let center = smoothed.get_pixel(4, 4).0[0];
        assert!(
            center < 140 && center >= 100,
            "expected noisy pixel to move toward its neighbors, got {center}",
        );
    }

    #[test]
    fn large_color_sigma_blurs_across_edge() {
        let img = sharp_edge_image();
        let smoothed = bilateral_filter(&img, 5, 150.0, 150.0);
        let left = smoothed.get_pixel(4, 5).0[0];
        let right = smoothed.get_pixel(5, 5).0[0];
        assert!(left > 0, "expected left-of-edge above 0, got {left}");
        assert!(right < 255, "expected right-of-edge below 255, got {right}");
    }

    #[test]
    fn corner_pixels_use_only_in_bounds_neighbors() {
        // A 2x2 image: the window is clipped on every side. The result
        // must still be a convex combination of the input values.
        let img = GrayImage::from_raw(2, 2, vec![10, 20, 30, 40]).unwrap();
        let smoothed = bilateral_filter(&img, 7, 150.0, 150.0);
        for p in smoothed.pixels() {
            assert!((10..=40).contains(&p.0[0]), "value {} escaped range", p.0[0]);
        }
    }

    #[test]
    fn range_table_starts_at_one_and_decreases() {
        let table = range_table(30.0);
        assert!((table[0] - 1.0).abs() < f64::EPSILON);
        assert!(table.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn spatial_kernel_peaks_at_center() {
        let k = spatial_kernel(2, 1.5);
        assert_eq!(k.len(), 25);
        assert!((k[12] - 1.0).abs() < f64::EPSILON);
        assert!(k.iter().all(|&w| w <= k[12]));
    }
}
