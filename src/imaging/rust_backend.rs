//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image::load_from_memory` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder::new_lossless` |
//!
//! The `image` crate's WebP encoder is lossless only, so WebP output ignores
//! quality here just as PNG does.

use super::backend::{BackendError, ImageBackend};
use super::params::{OutputFormat, Quality};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::DynamicImage;
use image::imageops::FilterType;
use std::io::Cursor;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        image::load_from_memory(bytes)
            .map_err(|e| BackendError::ProcessingFailed(format!("Failed to decode image: {e}")))
    }

    fn resize(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, BackendError> {
        if image.width() == width && image.height() == height {
            return Ok(image.clone());
        }
        Ok(image.resize_exact(width, height, FilterType::Lanczos3))
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        let mut buf = Cursor::new(Vec::new());

        match format {
            OutputFormat::Jpeg => {
                // JPEG has no alpha channel
                let encoder = JpegEncoder::new_with_quality(&mut buf, quality.as_percent());
                image
                    .to_rgb8()
                    .write_with_encoder(encoder)
                    .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {e}")))?;
            }
            OutputFormat::Png => {
                let encoder = PngEncoder::new(&mut buf);
                image
                    .to_rgba8()
                    .write_with_encoder(encoder)
                    .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {e}")))?;
            }
            OutputFormat::WebP => {
                let encoder = WebPEncoder::new_lossless(&mut buf);
                image
                    .to_rgba8()
                    .write_with_encoder(encoder)
                    .map_err(|e| BackendError::ProcessingFailed(format!("WebP encode failed: {e}")))?;
            }
        }

        Ok(buf.into_inner())
    }

    fn honours_quality(&self, format: OutputFormat) -> bool {
        format == OutputFormat::Jpeg
    }
}
