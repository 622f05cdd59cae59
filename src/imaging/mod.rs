//! Image compression for uploads in pure Rust, no system codecs.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` |
//! | **Fit to envelope** | [`fit_within`] + Lanczos3 resize |
//! | **Transparency scan** | alpha channel check over every pixel |
//! | **Encode** | JPEG at quality, PNG, lossless WebP |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math and format choice (unit testable)
//! - **Parameters**: Quality, formats and the compression envelope
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: The compression loop combining calculations + backend
//! - **Upload**: File selection, validation and posting the result

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;
pub mod upload;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{choose_output_format, fit_within, has_transparent_pixel};
pub use operations::{CompressedImage, SourceImage, compress};
pub use params::{
    CompressParams, MAX_ATTEMPTS, MAX_QUALITY, MIN_QUALITY, OutputFormat, QUALITY_STEP, Quality,
    SourceFormat,
};
pub use rust_backend::RustBackend;
pub use upload::{DEFAULT_UPLOAD_ENDPOINT, ImageUpload, UploadError, UploadFile};
