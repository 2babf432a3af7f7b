use std::path::{Component, Path, PathBuf};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;

use inkwell_core::domain::{ImageDescriptor, ImagePurpose};
use inkwell_core::ports::{ImageStore, MediaError, StagedUpload};

use super::{MediaConfig, unique_stem};
use super::processing::resize_to_jpeg;

/// Public URL prefix the upload directory is mounted under.
const PUBLIC_PREFIX: &str = "/uploads/";

/// Filesystem-backed image store.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    config: MediaConfig,
}

impl LocalImageStore {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    /// Create the staging directory and one directory per image purpose.
    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.config.staging_dir).await?;
        for purpose in ImagePurpose::ALL {
            tokio::fs::create_dir_all(self.config.upload_dir.join(purpose.dir_name())).await?;
        }
        Ok(())
    }

    /// Remove staged files older than `max_age`. Returns how many were removed.
    pub async fn sweep_staging(&self, max_age: Duration) -> Result<usize, MediaError> {
        let mut entries = match tokio::fs::read_dir(&self.config.staging_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let now = SystemTime::now();
        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or_default();
            if age >= max_age {
                match tokio::fs::remove_file(entry.path()).await {
                    Ok(()) => removed += 1,
                    Err(e) => tracing::warn!(path = %entry.path().display(), error = %e, "Failed to remove stale staged file"),
                }
            }
        }

        Ok(removed)
    }

    /// Map a stored path or public `/uploads/...` path onto the upload directory.
    fn resolve_stored(&self, path: &str) -> Result<PathBuf, MediaError> {
        let candidate = match path.strip_prefix(PUBLIC_PREFIX) {
            Some(relative) => self.config.upload_dir.join(relative),
            None => PathBuf::from(path),
        };

        let escapes = candidate
            .components()
            .any(|c| matches!(c, Component::ParentDir));
        if escapes || !candidate.starts_with(&self.config.upload_dir) {
            return Err(MediaError::InvalidPath(path.to_string()));
        }

        Ok(candidate)
    }

    async fn encode_and_store(
        &self,
        staged: &StagedUpload,
        purpose: ImagePurpose,
    ) -> Result<ImageDescriptor, MediaError> {
        let data = tokio::fs::read(&staged.temp_path).await?;
        let (max_width, max_height, quality) = (
            self.config.max_width,
            self.config.max_height,
            self.config.jpeg_quality,
        );

        let encoded =
            tokio::task::spawn_blocking(move || resize_to_jpeg(&data, max_width, max_height, quality))
                .await
                .map_err(|e| MediaError::Processing(e.to_string()))??;

        let dir = self.config.upload_dir.join(purpose.dir_name());
        tokio::fs::create_dir_all(&dir).await?;

        let filename = format!("{}.jpg", unique_stem());
        let destination = dir.join(&filename);

        if let Err(e) = tokio::fs::write(&destination, &encoded.data).await {
            remove_quietly(&destination).await;
            return Err(e.into());
        }

        Ok(ImageDescriptor {
            url: format!(
                "{}{PUBLIC_PREFIX}{}/{filename}",
                self.config.public_base_url,
                purpose.dir_name()
            ),
            path: destination.to_string_lossy().into_owned(),
            filename,
            original_name: staged.original_name.clone(),
            width: encoded.width,
            height: encoded.height,
            format: "jpeg".to_string(),
            size: encoded.data.len() as u64,
            mime_type: "image/jpeg".to_string(),
        })
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn process(
        &self,
        staged: StagedUpload,
        purpose: ImagePurpose,
    ) -> Result<ImageDescriptor, MediaError> {
        let result = self.encode_and_store(&staged, purpose).await;
        remove_quietly(&staged.temp_path).await;

        match &result {
            Ok(image) => tracing::debug!(
                original = %staged.original_name,
                stored = %image.path,
                width = image.width,
                height = image.height,
                "Image processed"
            ),
            Err(e) => tracing::warn!(original = %staged.original_name, error = %e, "Image processing failed"),
        }

        result
    }

    async fn discard(&self, staged: StagedUpload) {
        remove_quietly(&staged.temp_path).await;
    }

    async fn delete(&self, path: &str) -> Result<bool, MediaError> {
        let resolved = self.resolve_stored(path)?;
        match tokio::fs::remove_file(&resolved).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

async fn remove_quietly(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove file"),
    }
}
