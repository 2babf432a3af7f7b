//! Local image storage.
//!
//! Uploads are staged under `staging_dir`, validated, then decoded, shrunk to
//! fit the configured box and re-encoded as JPEG under
//! `upload_dir/<purpose>/`, where the static file service picks them up.

mod processing;
mod store;

use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use inkwell_core::ports::MediaError;

pub use processing::{EncodedImage, resize_to_jpeg};
pub use store::LocalImageStore;

/// Extensions accepted for uploaded images.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif", "webp"];

/// Declared content types accepted for uploaded images.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// Image storage configuration.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Root of the permanent store, served under `/uploads`.
    pub upload_dir: PathBuf,
    /// Where multipart file parts are written before processing.
    pub staging_dir: PathBuf,
    /// Public origin used to build image URLs, without trailing slash.
    pub public_base_url: String,
    pub max_file_bytes: u64,
    pub max_files: usize,
    pub max_width: u32,
    pub max_height: u32,
    pub jpeg_quality: u8,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            staging_dir: PathBuf::from("temp-uploads"),
            public_base_url: "http://localhost:8080".to_string(),
            max_file_bytes: 10 * 1024 * 1024,
            max_files: 10,
            max_width: 1200,
            max_height: 800,
            jpeg_quality: 85,
        }
    }
}

impl MediaConfig {
    /// Read `UPLOAD_DIR` and `STAGING_DIR`; the public URL comes from the caller.
    pub fn from_env(public_base_url: impl Into<String>) -> Self {
        let defaults = Self::default();
        Self {
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            staging_dir: std::env::var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.staging_dir),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            ..defaults
        }
    }

    /// A fresh staging path that keeps the original extension.
    pub fn staging_path(&self, original_name: &str) -> PathBuf {
        let extension = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .unwrap_or_default();
        self.staging_dir.join(format!("{}{extension}", unique_stem()))
    }

    /// Both the file extension and the declared type must be on the allow-list.
    pub fn validate_upload(&self, original_name: &str, mime_type: &str) -> Result<(), MediaError> {
        let extension = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let extension_ok = extension
            .as_deref()
            .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext));
        let mime_ok = ALLOWED_MIME_TYPES.contains(&mime_type.to_ascii_lowercase().as_str());

        if extension_ok && mime_ok {
            Ok(())
        } else {
            Err(MediaError::UnsupportedType(format!(
                "{original_name} ({mime_type})"
            )))
        }
    }
}

/// `<unix-millis>-<uuid>`, unique across concurrent requests.
pub(crate) fn unique_stem() -> String {
    format!("{}-{}", Utc::now().timestamp_millis(), Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_upload_requires_extension_and_mime() {
        let config = MediaConfig::default();

        assert!(config.validate_upload("photo.PNG", "image/png").is_ok());
        assert!(config.validate_upload("photo.jpg", "image/jpeg").is_ok());
        assert!(config.validate_upload("anim.gif", "image/gif").is_ok());

        assert!(matches!(
            config.validate_upload("notes.pdf", "application/pdf"),
            Err(MediaError::UnsupportedType(_))
        ));
        assert!(config.validate_upload("photo.png", "application/pdf").is_err());
        assert!(config.validate_upload("script.sh", "image/png").is_err());
        assert!(config.validate_upload("no-extension", "image/png").is_err());
    }

    #[test]
    fn test_staging_paths_are_unique_and_keep_extension() {
        let config = MediaConfig::default();

        let a = config.staging_path("Photo.JPG");
        let b = config.staging_path("Photo.JPG");

        assert_ne!(a, b);
        assert!(a.starts_with("temp-uploads"));
        assert_eq!(a.extension().and_then(|e| e.to_str()), Some("jpg"));
    }

    #[test]
    fn test_public_base_url_is_normalized() {
        let config = MediaConfig::from_env("https://blog.example.com/");

        assert_eq!(config.public_base_url, "https://blog.example.com");
    }
}
