//! Image uploads attached to new posts
//!
//! Accepts a single `image` file part of a multipart form, streams it to the upload
//! directory under a generated name and hands back the public `/uploads/<name>` path.
//! Files are removed again when the post that would reference them is not created
//! or is later deleted.

use actix_multipart::{Field, Multipart};
use chrono::Utc;
use futures::StreamExt;
use mime::Mime;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

pub const IMAGE_FIELD: &str = "image";
pub const TEXT_FIELD: &str = "text";
pub const PUBLIC_PREFIX: &str = "/uploads/";

/// Upper bound for non-file form fields
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;
const MB: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("File size too large. Maximum size is {}", format_limit(.max_bytes))]
    TooLarge { max_bytes: usize },

    #[error("Unexpected field in file upload")]
    UnexpectedField(String),

    #[error("Only image files are allowed (jpeg, png, gif, webp)")]
    UnsupportedType(String),

    #[error("File upload error: {0}")]
    Malformed(String),

    #[error("File upload error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_limit(max_bytes: &usize) -> String {
    let max_bytes = *max_bytes;
    if max_bytes >= MB && max_bytes % MB == 0 {
        format!("{}MB", max_bytes / MB)
    } else {
        format!("{} bytes", max_bytes)
    }
}

/// File extension for an accepted image MIME type
fn image_extension(content_type: &Mime) -> Option<&'static str> {
    if content_type.type_() != mime::IMAGE {
        return None;
    }
    match content_type.subtype().as_str().to_ascii_lowercase().as_str() {
        "jpeg" | "jpg" => Some("jpg"),
        "png" => Some("png"),
        "gif" => Some("gif"),
        "webp" => Some("webp"),
        _ => None,
    }
}

/// Fields of a post-creation form
#[derive(Debug, Default)]
pub struct PostForm {
    pub text: Option<String>,
    /// Reference stored on the post, e.g. `/uploads/1700000000000-<uuid>.png`
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the upload directory if it does not exist yet
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Read a post-creation form. Any image already written is removed if a later part fails.
    pub async fn read_post_form(&self, mut payload: Multipart) -> Result<PostForm, UploadError> {
        let mut form = PostForm::default();

        if let Err(err) = self.collect_fields(&mut payload, &mut form).await {
            if let Some(image) = form.image.take() {
                self.discard(&image).await;
            }
            return Err(err);
        }

        Ok(form)
    }

    async fn collect_fields(
        &self,
        payload: &mut Multipart,
        form: &mut PostForm,
    ) -> Result<(), UploadError> {
        while let Some(item) = payload.next().await {
            let mut field = item.map_err(|e| UploadError::Malformed(e.to_string()))?;
            let name = field.name().unwrap_or_default().to_string();
            let is_file = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .is_some();

            if is_file {
                if name != IMAGE_FIELD || form.image.is_some() {
                    return Err(UploadError::UnexpectedField(name));
                }
                form.image = Some(self.store_image(&mut field).await?);
            } else {
                let value = read_text_field(&mut field).await?;
                if name == TEXT_FIELD {
                    form.text = Some(value);
                }
            }
        }
        Ok(())
    }

    async fn store_image(&self, field: &mut Field) -> Result<String, UploadError> {
        let content_type = field.content_type().cloned();
        let ext = content_type
            .as_ref()
            .and_then(image_extension)
            .ok_or_else(|| {
                UploadError::UnsupportedType(
                    content_type
                        .as_ref()
                        .map(|m| m.essence_str().to_string())
                        .unwrap_or_default(),
                )
            })?;

        let file_name = format!("{}-{}.{}", Utc::now().timestamp_millis(), Uuid::new_v4(), ext);
        let disk_path = self.dir.join(&file_name);

        match self.write_field(field, &disk_path).await {
            Ok(written) => {
                debug!(file = %file_name, bytes = written, "Stored uploaded image");
                Ok(format!("{}{}", PUBLIC_PREFIX, file_name))
            }
            Err(err) => {
                let _ = tokio::fs::remove_file(&disk_path).await;
                Err(err)
            }
        }
    }

    async fn write_field(&self, field: &mut Field, path: &Path) -> Result<usize, UploadError> {
        let mut file = tokio::fs::File::create(path).await?;
        let mut written = 0usize;

        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| UploadError::Malformed(e.to_string()))?;
            written += chunk.len();
            if written > self.max_bytes {
                return Err(UploadError::TooLarge {
                    max_bytes: self.max_bytes,
                });
            }
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        Ok(written)
    }

    /// Remove a previously stored image by its public path. Failures are only logged.
    pub async fn discard(&self, public_path: &str) {
        let Some(file_name) = public_path.strip_prefix(PUBLIC_PREFIX) else {
            return;
        };
        if file_name.is_empty() || file_name.contains('/') || file_name.contains("..") {
            return;
        }

        if let Err(e) = tokio::fs::remove_file(self.dir.join(file_name)).await {
            warn!(path = %public_path, error = %e, "Failed to remove uploaded image");
        }
    }
}

async fn read_text_field(field: &mut Field) -> Result<String, UploadError> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| UploadError::Malformed(e.to_string()))?;
        if buf.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
            return Err(UploadError::Malformed("form field too large".to_string()));
        }
        buf.extend_from_slice(&chunk);
    }
    String::from_utf8(buf)
        .map_err(|_| UploadError::Malformed("form field is not valid UTF-8".to_string()))
}
