//! CPU-bound image work. Call from `spawn_blocking`.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader, Limits};

use inkwell_core::ports::MediaError;

/// Decoder dimension cap; stops decompression bombs before allocation.
const MAX_IMAGE_DIMENSION: u32 = 16_384;

/// A re-encoded JPEG and its final dimensions.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decode `data`, shrink it to fit `max_width` x `max_height` keeping the
/// aspect ratio (never enlarging), and encode as JPEG at `quality`.
pub fn resize_to_jpeg(
    data: &[u8],
    max_width: u32,
    max_height: u32,
    quality: u8,
) -> Result<EncodedImage, MediaError> {
    let mut reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| MediaError::Processing(e.to_string()))?;
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_IMAGE_DIMENSION);
    limits.max_image_height = Some(MAX_IMAGE_DIMENSION);
    reader.limits(limits);

    let img = reader
        .decode()
        .map_err(|e| MediaError::Processing(e.to_string()))?;

    let (width, height) = img.dimensions();
    let img = if width > max_width || height > max_height {
        img.resize(max_width, max_height, FilterType::Lanczos3)
    } else {
        img
    };

    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let (width, height) = rgb.dimensions();

    let mut buf = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))
        .map_err(|e| MediaError::Processing(e.to_string()))?;

    Ok(EncodedImage {
        data: buf,
        width,
        height,
    })
}
