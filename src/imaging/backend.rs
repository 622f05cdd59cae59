//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the decoder/canvas capability the compression
//! loop runs against: decode bytes into a pixel buffer, render it at a new
//! size, and re-encode it at a given quality.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate's pure-Rust codecs.

use super::params::{OutputFormat, Quality};
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Invalid compression parameters: {0}")]
    InvalidParams(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel size of a decoded or resized image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Every backend must implement decode, resize and encode so the
/// compression loop is backend-agnostic.
pub trait ImageBackend: Sync {
    /// Decode arbitrary image bytes at native dimensions.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError>;

    /// Render the image into a buffer of exactly `width` x `height`.
    fn resize(&self, image: &DynamicImage, width: u32, height: u32)
    -> Result<DynamicImage, BackendError>;

    /// Encode the pixel buffer. `quality` is ignored by formats without one.
    fn encode(
        &self,
        image: &DynamicImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError>;

    /// Whether re-encoding `format` at a lower quality can shrink the output.
    ///
    /// The compression loop stops after the first encode when this is false,
    /// since every further attempt would produce the same bytes.
    fn honours_quality(&self, format: OutputFormat) -> bool {
        format.supports_quality()
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::sync::Mutex;

    /// Mock backend that records operations without running any codec.
    ///
    /// `decode` hands back a blank image of the configured size. `encode`
    /// reports sizes from `encoded_sizes` in order, repeating the last one.
    #[derive(Default)]
    pub struct MockBackend {
        pub decode_dimensions: Option<Dimensions>,
        pub transparent: bool,
        pub encoded_sizes: Vec<usize>,
        pub fail_encode: bool,
        pub lossless_formats: Vec<OutputFormat>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode(usize),
        Resize {
            width: u32,
            height: u32,
        },
        Encode {
            format: OutputFormat,
            quality: u8,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_image(width: u32, height: u32) -> Self {
            Self {
                decode_dimensions: Some(Dimensions { width, height }),
                ..Self::default()
            }
        }

        pub fn transparent(mut self) -> Self {
            self.transparent = true;
            self
        }

        pub fn with_sizes(mut self, sizes: Vec<usize>) -> Self {
            self.encoded_sizes = sizes;
            self
        }

        pub fn failing_encode(mut self) -> Self {
            self.fail_encode = true;
            self
        }

        pub fn lossless(mut self, format: OutputFormat) -> Self {
            self.lossless_formats.push(format);
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn encode_qualities(&self) -> Vec<u8> {
            self.get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::Encode { quality, .. } => Some(quality),
                    _ => None,
                })
                .collect()
        }

        fn encode_count(&self) -> usize {
            self.encode_qualities().len()
        }
    }

    impl ImageBackend for MockBackend {
        fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Decode(bytes.len()));

            let dims = self
                .decode_dimensions
                .ok_or_else(|| BackendError::ProcessingFailed("No mock image".to_string()))?;
            let mut img = RgbaImage::from_pixel(dims.width, dims.height, Rgba([200, 100, 50, 255]));
            if self.transparent {
                img.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
            }
            Ok(DynamicImage::ImageRgba8(img))
        }

        fn resize(
            &self,
            image: &DynamicImage,
            width: u32,
            height: u32,
        ) -> Result<DynamicImage, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Resize { width, height });
            Ok(image.resize_exact(width, height, image::imageops::FilterType::Nearest))
        }

        fn encode(
            &self,
            _image: &DynamicImage,
            format: OutputFormat,
            quality: Quality,
        ) -> Result<Vec<u8>, BackendError> {
            let attempt = self.encode_count();
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                format,
                quality: quality.as_percent(),
            });
            if self.fail_encode {
                return Err(BackendError::ProcessingFailed("mock encode".to_string()));
            }
            let size = self
                .encoded_sizes
                .get(attempt)
                .or(self.encoded_sizes.last())
                .copied()
                .unwrap_or(0);
            Ok(vec![0u8; size])
        }

        fn honours_quality(&self, format: OutputFormat) -> bool {
            format.supports_quality() && !self.lossless_formats.contains(&format)
        }
    }

    #[test]
    fn mock_records_decode_and_resize() {
        let backend = MockBackend::with_image(8, 6);
        let img = backend.decode(&[1, 2, 3]).unwrap();
        assert_eq!((img.width(), img.height()), (8, 6));

        let resized = backend.resize(&img, 4, 3).unwrap();
        assert_eq!((resized.width(), resized.height()), (4, 3));

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(ops[0], RecordedOp::Decode(3)));
        assert!(matches!(
            ops[1],
            RecordedOp::Resize {
                width: 4,
                height: 3
            }
        ));
    }

    #[test]
    fn mock_without_image_fails_decode() {
        let backend = MockBackend::new();
        assert!(matches!(
            backend.decode(&[]),
            Err(BackendError::ProcessingFailed(_))
        ));
    }

    #[test]
    fn mock_encode_sizes_repeat_last() {
        let backend = MockBackend::with_image(2, 2).with_sizes(vec![30, 20]);
        let img = backend.decode(&[0]).unwrap();
        let sizes: Vec<usize> = (0..3)
            .map(|_| {
                backend
                    .encode(&img, OutputFormat::Jpeg, Quality::default())
                    .unwrap()
                    .len()
            })
            .collect();
        assert_eq!(sizes, vec![30, 20, 20]);
    }

    #[test]
    fn default_honours_quality_follows_format() {
        let backend = MockBackend::new();
        assert!(backend.honours_quality(OutputFormat::Jpeg));
        assert!(!backend.honours_quality(OutputFormat::Png));
        let lossless = MockBackend::new().lossless(OutputFormat::WebP);
        assert!(!lossless.honours_quality(OutputFormat::WebP));
    }
}
