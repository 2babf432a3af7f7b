//! Image storage port.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::{ImageDescriptor, ImagePurpose};

/// A file part that passed validation and sits in the staging directory.
///
/// Every staged upload must end in exactly one of `ImageStore::process` or
/// `ImageStore::discard`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedUpload {
    /// Multipart field the file arrived in.
    pub field: String,
    pub original_name: String,
    pub mime_type: String,
    pub temp_path: PathBuf,
    pub size: u64,
}

/// Turns staged uploads into permanent, resized images and removes them again.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Decode, resize and re-encode the staged file into the purpose directory.
    /// The staged file is removed whether or not processing succeeds.
    async fn process(
        &self,
        staged: StagedUpload,
        purpose: ImagePurpose,
    ) -> Result<ImageDescriptor, MediaError>;

    /// Drop a staged file without processing it.
    async fn discard(&self, staged: StagedUpload);

    /// Remove a stored image. Returns `false` if it was already gone.
    async fn delete(&self, path: &str) -> Result<bool, MediaError>;
}

/// Upload and image processing errors.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Only image files are allowed (got {0})")]
    UnsupportedType(String),

    #[error("File exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("At most {limit} files may be uploaded per request")]
    TooManyFiles { limit: usize },

    #[error("Image processing failed: {0}")]
    Processing(String),

    #[error("Path is outside the upload directory: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
