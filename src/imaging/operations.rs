//! High-level image operations.
//!
//! [`compress`] combines the calculations with backend execution: decode,
//! fit into the dimension envelope, classify transparency, pick a format,
//! then encode repeatedly at falling quality until the byte budget is met.
//!
//! Termination: an encode at or under budget, quality at the
//! [`MIN_QUALITY`](super::params::MIN_QUALITY) floor, or
//! [`MAX_ATTEMPTS`](super::params::MAX_ATTEMPTS) encodes, whichever comes
//! first. Formats the backend cannot shrink by lowering quality (PNG, and
//! lossless WebP) return their first encode regardless of size.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{choose_output_format, fit_within, has_transparent_pixel};
use super::params::{CompressParams, MAX_ATTEMPTS, OutputFormat, Quality, SourceFormat};
use tracing::debug;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// An image selected for upload: raw bytes plus the MIME type it claims.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    /// Declared MIME type; sniffed from the bytes when absent.
    pub mime_type: Option<String>,
}

impl SourceImage {
    pub fn new(bytes: Vec<u8>, mime_type: Option<String>) -> Self {
        Self { bytes, mime_type }
    }

    pub fn format(&self) -> SourceFormat {
        match self.mime_type.as_deref() {
            Some(mime) => SourceFormat::from_mime(mime),
            None => SourceFormat::sniff(&self.bytes),
        }
    }
}

/// Output of a compression run.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedImage {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    /// Quality of the encode that was kept.
    pub quality: Quality,
    /// Number of encodes performed.
    pub attempts: u32,
}

impl CompressedImage {
    /// File extension for the chosen format (`jpg`, `png`, `webp`).
    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }
}

/// Mutable state of one compression run.
struct CompressionJob {
    format: OutputFormat,
    target_bytes: usize,
    quality: Quality,
    attempts: u32,
    quality_sensitive: bool,
}

impl CompressionJob {
    /// Whether an encode of `size` bytes ends the run.
    fn is_done(&self, size: usize) -> bool {
        size <= self.target_bytes
            || !self.quality_sensitive
            || self.attempts >= MAX_ATTEMPTS
            || self.quality.at_floor()
    }
}

/// Compress an image into the dimension envelope and byte budget.
///
/// Zero bounds or a zero budget are rejected before decoding. Decode and
/// encode failures fail the whole run; no partial output is returned.
pub fn compress(
    backend: &impl ImageBackend,
    source: &SourceImage,
    params: &CompressParams,
) -> Result<CompressedImage> {
    params.validate()?;
    let decoded = backend.decode(&source.bytes)?;
    let (width, height) = fit_within(
        (decoded.width(), decoded.height()),
        (params.max_width, params.max_height),
    );
    let canvas = backend.resize(&decoded, width, height)?;
    drop(decoded);

    let transparent = canvas.color().has_alpha() && has_transparent_pixel(canvas.to_rgba8().as_raw());
    let format = choose_output_format(transparent, source.format());

    let mut job = CompressionJob {
        format,
        target_bytes: params.target_bytes(),
        quality: Quality::default(),
        attempts: 0,
        quality_sensitive: backend.honours_quality(format),
    };
    debug!(
        target_bytes = job.target_bytes,
        format = format.extension(),
        width,
        height,
        "compressing image"
    );

    loop {
        let bytes = backend.encode(&canvas, job.format, job.quality)?;
        job.attempts += 1;

        if job.is_done(bytes.len()) {
            debug!(
                size = bytes.len(),
                quality = job.quality.value(),
                attempts = job.attempts,
                "compression finished"
            );
            return Ok(CompressedImage {
                bytes,
                format: job.format,
                width,
                height,
                quality: job.quality,
                attempts: job.attempts,
            });
        }

        job.quality = job.quality.step_down();
        debug!(size = bytes.len(), next_quality = job.quality.value(), "over budget");
    }
}
