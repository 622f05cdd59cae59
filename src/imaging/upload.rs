//! Upload flow for a recipe image: select, validate, compress, post.
//!
//! [`ImageUpload`] owns at most one compressed file. Selecting a new file
//! releases the previous result before the new one is produced; [`clear`]
//! drops it explicitly. Validation and processing failures are kept as a
//! user-facing message on the upload as well as returned to the caller.
//!
//! [`clear`]: ImageUpload::clear

use super::backend::{BackendError, ImageBackend};
use super::operations::{CompressedImage, SourceImage, compress};
use super::params::CompressParams;
use crate::api::{ApiClient, ApiError, MultipartFile, RequestBody, RequestOptions};
use crate::config::ImagesConfig;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

/// Default endpoint recipe images are posted to.
pub const DEFAULT_UPLOAD_ENDPOINT: &str = "/upload/recipe";

/// Multipart field carrying the file.
const UPLOAD_FIELD: &str = "image";

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Please select a valid image file")]
    NotAnImage,
    #[error("Image size must be less than {}MB", .max / (1024 * 1024))]
    TooLarge { size: u64, max: u64 },
    #[error("Failed to process image. Please try again.")]
    Processing(#[source] BackendError),
    #[error("Failed to upload image")]
    Upload(#[source] ApiError),
}

/// A compressed file ready to upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    /// `recipe.<ext>` for the chosen output format.
    pub file_name: String,
    pub mime_type: &'static str,
    pub image: CompressedImage,
}

impl UploadFile {
    pub fn size(&self) -> usize {
        self.image.bytes.len()
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

/// Selection + compression state for one image input.
pub struct ImageUpload<B: ImageBackend> {
    backend: B,
    params: CompressParams,
    max_upload_bytes: u64,
    file: Option<UploadFile>,
    error: Option<String>,
}

impl<B: ImageBackend> ImageUpload<B> {
    pub fn new(backend: B, config: &ImagesConfig) -> Self {
        Self {
            backend,
            params: CompressParams::from(config),
            max_upload_bytes: config.max_upload_bytes,
            file: None,
            error: None,
        }
    }

    /// The compressed file, if one is selected.
    pub fn file(&self) -> Option<&UploadFile> {
        self.file.as_ref()
    }

    /// Message from the last failed selection.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Validate and compress a newly selected file.
    ///
    /// The previously selected file is released first, so a failed
    /// selection leaves nothing selected.
    pub fn select_file(&mut self, mime_type: &str, bytes: Vec<u8>) -> Result<&UploadFile, UploadError> {
        self.file = None;
        self.error = None;

        match self.prepare(mime_type, bytes) {
            Ok(file) => {
                info!(
                    size_kb = file.size() as f64 / 1024.0,
                    format = file.image.extension(),
                    "image compressed"
                );
                Ok(&*self.file.insert(file))
            }
            Err(e) => {
                if let UploadError::Processing(source) = &e {
                    error!(error = %source, "error compressing image");
                }
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn prepare(&self, mime_type: &str, bytes: Vec<u8>) -> Result<UploadFile, UploadError> {
        if !mime_type.starts_with("image/") {
            return Err(UploadError::NotAnImage);
        }
        let size = bytes.len() as u64;
        if size > self.max_upload_bytes {
            return Err(UploadError::TooLarge {
                size,
                max: self.max_upload_bytes,
            });
        }

        let source = SourceImage::new(bytes, Some(mime_type.to_string()));
        let image =
            compress(&self.backend, &source, &self.params).map_err(UploadError::Processing)?;
        Ok(UploadFile {
            file_name: format!("recipe.{}", image.extension()),
            mime_type: image.format.mime_type(),
            image,
        })
    }

    /// Drop the selected file and any error.
    pub fn clear(&mut self) {
        self.file = None;
        self.error = None;
    }

    /// Post the selected file and return the stored URL.
    ///
    /// Returns `Ok(None)` when nothing is selected.
    pub async fn upload(&self, client: &ApiClient, endpoint: &str) -> Result<Option<String>, UploadError> {
        let Some(file) = &self.file else {
            return Ok(None);
        };
        info!(endpoint, "uploading image");

        let options = RequestOptions::post(RequestBody::Multipart(MultipartFile {
            field: UPLOAD_FIELD.to_string(),
            file_name: file.file_name.clone(),
            mime_type: file.mime_type.to_string(),
            bytes: file.image.bytes.clone(),
        }));
        let response: UploadResponse = client.execute(endpoint, options).await.map_err(|e| {
            error!(error = %e, "failed to upload image");
            UploadError::Upload(e)
        })?;
        Ok(Some(response.url))
    }
}
