//! PNG bytes to RGBA buffers and back.

use std::io::Cursor;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::error::LimitErrorKind;
use image::{ExtendedColorType, ImageEncoder, ImageError, ImageFormat, ImageReader, Limits, RgbaImage};
use thiserror::Error;

/// Largest accepted width or height. Full-page captures get tall, but nothing
/// legitimate comes close to this.
pub const MAX_DIMENSION: u32 = 32_768;

/// Decoder allocation cap: the largest in-bounds image at 16 bits per
/// channel. Keeps `MAX_DIMENSION` the only size limit callers see.
const MAX_ALLOC: u64 = MAX_DIMENSION as u64 * MAX_DIMENSION as u64 * 8;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("input is not a PNG image")]
    NotPng,

    #[error("image exceeds the maximum dimension of {max}px")]
    TooLarge { max: u32 },

    #[error("failed to decode PNG: {0}")]
    Decode(#[source] ImageError),

    #[error("failed to encode PNG: {0}")]
    Encode(#[source] ImageError),
}

/// Decode PNG bytes into an 8-bit RGBA buffer.
///
/// Grey, RGB and 16-bit inputs are converted. Dimension limits are enforced
/// by the decoder before the pixel buffer is allocated.
pub fn decode(png: &[u8]) -> Result<RgbaImage, CodecError> {
    let mut reader = ImageReader::new(Cursor::new(png))
        .with_guessed_format()
        .map_err(|e| CodecError::Decode(ImageError::IoError(e)))?;
    if reader.format() != Some(ImageFormat::Png) {
        return Err(CodecError::NotPng);
    }

    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_DIMENSION);
    limits.max_image_height = Some(MAX_DIMENSION);
    limits.max_alloc = Some(MAX_ALLOC);
    reader.limits(limits);

    let decoded = reader.decode().map_err(|e| match e {
        ImageError::Limits(ref l) if matches!(l.kind(), LimitErrorKind::DimensionError) => {
            CodecError::TooLarge { max: MAX_DIMENSION }
        }
        other => CodecError::Decode(other),
    })?;

    Ok(decoded.into_rgba8())
}

/// Encode an RGBA buffer as PNG.
///
/// Compression and filter settings are pinned, so the same pixels always
/// produce the same bytes.
pub fn encode(image: &RgbaImage) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    PngEncoder::new_with_quality(&mut buf, CompressionType::Default, FilterType::Adaptive)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(CodecError::Encode)?;
    Ok(buf)
}
