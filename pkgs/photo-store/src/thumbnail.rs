use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageFormat};
use tokio::task;

use crate::codec::PhotoBlob;
use crate::error::{CompressionError, Result};
use crate::{THUMBNAIL_HEIGHT, THUMBNAIL_QUALITY, THUMBNAIL_WIDTH};

/// Quality and bounding box for a compression pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressOptions {
    /// JPEG encoder quality in (0, 1]. PNG sources stay PNG and are only
    /// resized, so quality has no effect on them.
    pub quality: f32,
    pub max_width: u32,
    pub max_height: u32,
}

impl CompressOptions {
    pub fn new(quality: f32, max_width: u32, max_height: u32) -> Self {
        Self {
            quality,
            max_width,
            max_height,
        }
    }

    /// Defaults for full-size photos
    pub fn photo() -> Self {
        Self::new(0.9, 1500, 1500)
    }

    /// Defaults for thumbnail companions
    pub fn thumbnail() -> Self {
        Self::new(THUMBNAIL_QUALITY, THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT)
    }

    fn validate(&self) -> Result<(), CompressionError> {
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(CompressionError::InvalidQuality(self.quality));
        }
        if self.max_width == 0 || self.max_height == 0 {
            return Err(CompressionError::InvalidBounds {
                width: self.max_width,
                height: self.max_height,
            });
        }
        Ok(())
    }

    fn jpeg_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// Downscale an image to fit the bounds and re-encode it
///
/// The aspect ratio is kept and smaller images are never upscaled. PNG input
/// stays PNG; everything else is re-encoded as JPEG at the given quality.
pub async fn compress(blob: &PhotoBlob, options: CompressOptions) -> Result<PhotoBlob> {
    options.validate()?;
    let bytes = blob.read_all().await?;

    // Decoding and encoding are CPU bound
    let (encoded, mime) = task::spawn_blocking(move || compress_bytes(&bytes, options)).await??;

    Ok(PhotoBlob::from_bytes(encoded, mime))
}

fn compress_bytes(
    bytes: &[u8],
    options: CompressOptions,
) -> Result<(Vec<u8>, &'static str), CompressionError> {
    let format = image::guess_format(bytes).map_err(CompressionError::Decode)?;
    let img = image::load_from_memory_with_format(bytes, format).map_err(CompressionError::Decode)?;

    let img = if img.width() > options.max_width || img.height() > options.max_height {
        img.thumbnail(options.max_width, options.max_height)
    } else {
        img
    };

    let mut out = Vec::new();
    match format {
        ImageFormat::Png => {
            img.write_with_encoder(PngEncoder::new(&mut out))
                .map_err(CompressionError::Encode)?;
            Ok((out, "image/png"))
        }
        _ => {
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, options.jpeg_quality()))
                .map_err(CompressionError::Encode)?;
            Ok((out, "image/jpeg"))
        }
    }
}
