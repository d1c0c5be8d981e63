//! Object storage client for product photos.
//!
//! Uploads go to `{url}/storage/v1/object/{bucket}/{name}` with the service
//! key as a bearer token. The public URL of an object is
//! `{url}/storage/v1/object/public/{bucket}/{name}`.

use std::sync::Arc;

use axum::body::Bytes;
use chrono::Utc;
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::{info, instrument};
use url::Url;

use crate::config::StorageConfig;

/// Name used when the uploaded file has no usable name.
const FALLBACK_FILE_NAME: &str = "image";

/// Errors that can occur when storing a product photo.
#[derive(Debug, Error)]
pub enum StorageError {
    /// HTTP request to the storage service failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The storage service refused the upload.
    #[error("storage service returned {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The file is not an image.
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    /// The file exceeds the configured limit.
    #[error("File is too large ({size} bytes, limit {limit})")]
    TooLarge { size: usize, limit: usize },

    /// The object URL could not be built.
    #[error("invalid storage URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Client for the object storage bucket holding product photos.
#[derive(Clone)]
pub struct StorageClient {
    inner: Arc<StorageClientInner>,
}

struct StorageClientInner {
    client: reqwest::Client,
    config: StorageConfig,
    max_bytes: usize,
}

impl StorageClient {
    /// Create a storage client that accepts images up to `max_bytes`.
    #[must_use]
    pub fn new(config: StorageConfig, max_bytes: usize) -> Self {
        Self {
            inner: Arc::new(StorageClientInner {
                client: reqwest::Client::new(),
                config,
                max_bytes,
            }),
        }
    }

    /// Largest accepted upload in bytes.
    #[must_use]
    pub fn max_bytes(&self) -> usize {
        self.inner.max_bytes
    }

    /// Store an image and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::UnsupportedType` or `StorageError::TooLarge`
    /// before any network call, or another error if the upload fails.
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn upload(
        &self,
        data: Bytes,
        original_name: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        validate_upload(content_type, data.len(), self.inner.max_bytes)?;

        let name = object_name(original_name, Utc::now().timestamp_millis());
        let upload_url = self.object_url(&["storage", "v1", "object"], &name)?;

        let response = self
            .inner
            .client
            .post(upload_url)
            .bearer_auth(self.inner.config.service_key.expose_secret())
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let public_url = self.object_url(&["storage", "v1", "object", "public"], &name)?;
        info!(object = %name, "Stored product image");
        Ok(public_url.into())
    }

    fn object_url(&self, prefix: &[&str], name: &str) -> Result<Url, StorageError> {
        let mut url = self.inner.config.url.clone();
        url.path_segments_mut()
            .map_err(|()| StorageError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(prefix)
            .push(&self.inner.config.bucket)
            .push(name);
        Ok(url)
    }
}

/// Check the MIME type and size of an upload.
///
/// # Errors
///
/// Returns `StorageError::UnsupportedType` for anything but `image/*`, or
/// `StorageError::TooLarge` above `limit`.
pub fn validate_upload(content_type: &str, size: usize, limit: usize) -> Result<(), StorageError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.split_once('/') {
        Some(("image", subtype)) if !subtype.is_empty() => {}
        _ => return Err(StorageError::UnsupportedType(content_type.to_string())),
    }

    if size > limit {
        return Err(StorageError::TooLarge { size, limit });
    }
    Ok(())
}

/// Object name for an upload: `<unix-millis>_<sanitized original name>`.
#[must_use]
pub fn object_name(original_name: &str, unix_millis: i64) -> String {
    format!("{unix_millis}_{}", sanitize_file_name(original_name))
}

/// Keep the final path component and replace anything outside
/// `[A-Za-z0-9._-]` with `_`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}
