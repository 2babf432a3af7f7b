//! Multipart intake: text fields into memory, file parts into the staging
//! directory.
//!
//! Every file part is checked against the allow-list and size limits while
//! it streams. On any rejection all files staged so far for the request are
//! removed, so nothing reaches permanent storage.

use std::collections::HashMap;
use std::path::Path;

use actix_multipart::{Field, Multipart};
use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use inkwell_core::ports::{ImageStore, MediaError, StagedUpload};
use inkwell_infra::MediaConfig;

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Upper bound for a single text field (post bodies are HTML).
const MAX_TEXT_FIELD_BYTES: usize = 1024 * 1024;
/// Upper bound for all text fields of one request together.
const MAX_TEXT_TOTAL_BYTES: usize = 4 * 1024 * 1024;
const MAX_TEXT_PARTS: usize = 100;

/// A parsed multipart request.
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, Vec<String>>,
    text_bytes: usize,
    text_parts: usize,
    files: Vec<StagedUpload>,
}

impl UploadForm {
    /// Trimmed value of a text field; empty values read as absent. A repeated
    /// field reads as its last value.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.raw(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Untrimmed value of a text field, if sent at all.
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    /// Every value sent under `name`, comma joined. Lets list fields arrive
    /// either as one `a,b` part or as one part per item.
    pub fn joined(&self, name: &str) -> Option<String> {
        self.fields.get(name).map(|values| values.join(","))
    }

    /// Take the staged file sent under `field`.
    pub fn take_file(&mut self, field: &str) -> Option<StagedUpload> {
        let index = self.files.iter().position(|f| f.field == field)?;
        Some(self.files.remove(index))
    }

    /// Discard every staged file still held by the form.
    pub async fn discard(self, images: &dyn ImageStore) {
        discard_all(images, self.files).await;
    }
}

/// Discard staged files that a handler decided not to process.
pub async fn discard_all(images: &dyn ImageStore, files: impl IntoIterator<Item = StagedUpload>) {
    for staged in files {
        images.discard(staged).await;
    }
}

/// Read the whole multipart body. `file_fields` lists the file parts the
/// route accepts; any other file part is rejected.
pub async fn read_upload_form(
    mut payload: Multipart,
    state: &AppState,
    file_fields: &[&str],
) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(item) = payload.next().await {
        let outcome = match item {
            Ok(field) => read_field(field, &state.media, file_fields, &mut form).await,
            Err(e) => Err(AppError::bad_request(format!("Malformed multipart body: {e}"))),
        };

        if let Err(e) = outcome {
            form.discard(state.images.as_ref()).await;
            return Err(e);
        }
    }

    Ok(form)
}

async fn read_field(
    mut field: Field,
    media: &MediaConfig,
    file_fields: &[&str],
    form: &mut UploadForm,
) -> AppResult<()> {
    let name = field.name().unwrap_or_default().to_string();
    let original_name = field
        .content_disposition()
        .and_then(|cd| cd.get_filename())
        .map(str::to_string);

    let Some(original_name) = original_name else {
        if form.text_parts >= MAX_TEXT_PARTS {
            return Err(AppError::bad_request("Too many form fields"));
        }
        let remaining = MAX_TEXT_TOTAL_BYTES.saturating_sub(form.text_bytes);
        let value = read_text(&mut field, &name, MAX_TEXT_FIELD_BYTES.min(remaining)).await?;
        form.text_bytes += value.len();
        form.text_parts += 1;
        form.fields.entry(name).or_default().push(value);
        return Ok(());
    };

    // A file input left empty still sends a part with an empty filename.
    if original_name.is_empty() {
        if drain(&mut field).await? == 0 {
            return Ok(());
        }
        return Err(AppError::bad_request(format!("File in {name} has no name")));
    }

    if !file_fields.contains(&name.as_str()) {
        return Err(AppError::bad_request(format!("Unexpected file field: {name}")));
    }
    if form.files.len() >= media.max_files {
        return Err(MediaError::TooManyFiles {
            limit: media.max_files,
        }
        .into());
    }

    let mime_type = field
        .content_type()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_default();
    media.validate_upload(&original_name, &mime_type)?;

    let temp_path = media.staging_path(&original_name);
    let size = match stream_to_file(&mut field, &temp_path, media.max_file_bytes).await {
        Ok(size) => size,
        Err(e) => {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e);
        }
    };

    tracing::debug!(
        field = %name,
        original = %original_name,
        size,
        "Staged upload"
    );

    form.files.push(StagedUpload {
        field: name,
        original_name,
        mime_type,
        temp_path,
        size,
    });
    Ok(())
}

async fn read_text(field: &mut Field, name: &str, limit: usize) -> AppResult<String> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk =
            chunk.map_err(|e| AppError::bad_request(format!("Malformed multipart body: {e}")))?;
        if buf.len() + chunk.len() > limit {
            return Err(AppError::bad_request(format!("Field {name} is too large")));
        }
        buf.extend_from_slice(&chunk);
    }
    String::from_utf8(buf).map_err(|_| AppError::bad_request(format!("Field {name} is not valid UTF-8")))
}

async fn drain(field: &mut Field) -> AppResult<usize> {
    let mut size = 0;
    while let Some(chunk) = field.next().await {
        let chunk =
            chunk.map_err(|e| AppError::bad_request(format!("Malformed multipart body: {e}")))?;
        size += chunk.len();
    }
    Ok(size)
}

async fn stream_to_file(field: &mut Field, path: &Path, max_bytes: u64) -> AppResult<u64> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(AppError::internal)?;
    }
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(AppError::internal)?;

    let mut size: u64 = 0;
    while let Some(chunk) = field.next().await {
        let chunk =
            chunk.map_err(|e| AppError::bad_request(format!("Malformed multipart body: {e}")))?;
        size += chunk.len() as u64;
        if size > max_bytes {
            return Err(MediaError::TooLarge { limit: max_bytes }.into());
        }
        file.write_all(&chunk).await.map_err(AppError::internal)?;
    }
    file.flush().await.map_err(AppError::internal)?;

    Ok(size)
}
