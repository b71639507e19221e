//! Image decoding and grayscale normalization.
//!
//! [`to_grayscale`] is the first pipeline stage: it accepts a decoded
//! 1- or 3-channel pixel buffer and produces a single-channel
//! [`GrayImage`]. [`decode`] turns encoded bytes (PNG, JPEG, BMP, WebP)
//! into such a buffer for shells that start from a file.

use image::{ColorType, GrayImage};

use crate::types::{PipelineError, RawImage};

/// Decode raw image bytes into a 1- or 3-channel pixel buffer.
///
/// Luma sources (with or without alpha) become single-channel buffers;
/// everything else is converted to 8-bit RGB. Alpha is discarded.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<RawImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    let raw = match img.color() {
        ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16 => {
            RawImage::from_gray(img.to_luma8())
        }
        _ => RawImage::from_rgb(img.to_rgb8()),
    };
    Ok(raw)
}

/// Reduce a decoded pixel buffer to a single intensity channel.
///
/// Single-channel buffers pass through unchanged. Three-channel buffers
/// use the standard luma weights `0.299*R + 0.587*G + 0.114*B`, rounded
/// to the nearest integer.
///
/// # Errors
///
/// Returns [`PipelineError::UnsupportedChannels`] for channel counts
/// other than 1 or 3, [`PipelineError::ZeroDimensions`] for an empty
/// extent, and [`PipelineError::BufferLength`] if the sample count does
/// not match `width * height * channels`.
pub fn to_grayscale(raw: &RawImage) -> Result<GrayImage, PipelineError> {
    let channels = raw.channels();
    if channels != 1 && channels != 3 {
        return Err(PipelineError::UnsupportedChannels(channels));
    }
    let (width, height) = (raw.width(), raw.height());
    if width == 0 || height == 0 {
        return Err(PipelineError::ZeroDimensions { width, height });
    }
    let expected = u64::from(width) * u64::from(height) * u64::from(channels);
    let actual = raw.data().len() as u64;
    if expected != actual {
        return Err(PipelineError::BufferLength { expected, actual });
    }

    let samples = if channels == 1 {
        raw.data().to_vec()
    } else {
        raw.data()
            .chunks_exact(3)
            .map(|px| luma(px[0], px[1], px[2]))
            .collect()
    };

    GrayImage::from_raw(width, height, samples).ok_or(PipelineError::BufferLength { expected, actual })
}

/// Fixed-point luma: `(299 R + 587 G + 114 B + 500) / 1000`.
fn luma(r: u8, g: u8, b: u8) -> u8 {
    let weighted = 299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b);
    // At most 255_000 + 500, so the quotient fits in a u8.
    u8::try_from((weighted + 500) / 1000).unwrap_or(u8::MAX)
}
