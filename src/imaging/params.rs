//! Parameter types for image compression.
//!
//! These describe *what* to produce, not *how*. The [`operations`](super::operations)
//! loop works in these terms and the [`backend`](super::backend) does the pixel
//! work, so the loop can be driven by a mock backend in tests.
//!
//! ## Types
//!
//! - [`Quality`]: encoder quality as a real number in `[0.1, 1.0]`, clamped on construction.
//! - [`OutputFormat`]: JPEG, PNG or WebP, with extension and MIME type.
//! - [`SourceFormat`]: what the uploaded file claims (or sniffs) to be.
//! - [`CompressParams`]: dimension envelope and byte budget.

use super::backend::BackendError;

/// Highest encoder quality, where every compression run starts.
pub const MAX_QUALITY: f32 = 1.0;
/// The loop never goes below this quality.
pub const MIN_QUALITY: f32 = 0.1;
/// Amount quality drops between two encodes.
pub const QUALITY_STEP: f32 = 0.05;
/// Upper bound on encodes per compression run.
pub const MAX_ATTEMPTS: u32 = 10;

/// Lossy encoding quality in `[0.1, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Quality(f32);

impl Quality {
    pub fn new(value: f32) -> Self {
        Self(value.clamp(MIN_QUALITY, MAX_QUALITY))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Quality on the 1-100 scale lossy encoders take.
    pub fn as_percent(self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }

    /// One step lower, floored at [`MIN_QUALITY`].
    pub fn step_down(self) -> Self {
        Self::new(self.0 - QUALITY_STEP)
    }

    /// True once quality has reached the floor. Compared on the percent
    /// scale so repeated `step_down` drift cannot skip it.
    pub fn at_floor(self) -> bool {
        self.as_percent() <= Quality::new(MIN_QUALITY).as_percent()
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(MAX_QUALITY)
    }
}

/// Encoded output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
}

impl OutputFormat {
    /// File extension used for the uploaded file name.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
        }
    }

    /// Whether the format takes a quality parameter at all.
    pub fn supports_quality(self) -> bool {
        !matches!(self, OutputFormat::Png)
    }
}

/// Format of the file the user selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Jpeg,
    Png,
    WebP,
    Other,
}

impl SourceFormat {
    /// Classify a MIME type such as `image/png`.
    pub fn from_mime(mime: &str) -> Self {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => SourceFormat::Jpeg,
            "image/png" => SourceFormat::Png,
            "image/webp" => SourceFormat::WebP,
            _ => SourceFormat::Other,
        }
    }

    /// Sniff the format from the leading bytes.
    pub fn sniff(bytes: &[u8]) -> Self {
        match image::guess_format(bytes) {
            Ok(image::ImageFormat::Jpeg) => SourceFormat::Jpeg,
            Ok(image::ImageFormat::Png) => SourceFormat::Png,
            Ok(image::ImageFormat::WebP) => SourceFormat::WebP,
            _ => SourceFormat::Other,
        }
    }
}

/// Dimension envelope and byte budget for one compression run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressParams {
    pub max_width: u32,
    pub max_height: u32,
    /// Byte budget in KiB.
    pub target_size_kb: u32,
}

impl CompressParams {
    pub fn target_bytes(&self) -> usize {
        self.target_size_kb as usize * 1024
    }

    /// Reject envelopes no image fits into.
    pub fn validate(&self) -> Result<(), BackendError> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(BackendError::InvalidParams(format!(
                "bounds must be non-zero, got {}x{}",
                self.max_width, self.max_height
            )));
        }
        if self.target_size_kb == 0 {
            return Err(BackendError::InvalidParams(
                "target size must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for CompressParams {
    fn default() -> Self {
        Self {
            max_width: 1200,
            max_height: 800,
            target_size_kb: 1000,
        }
    }
}

impl From<&crate::config::ImagesConfig> for CompressParams {
    fn from(config: &crate::config::ImagesConfig) -> Self {
        Self {
            max_width: config.max_width,
            max_height: config.max_height,
            target_size_kb: config.target_size_kb,
        }
    }
}
