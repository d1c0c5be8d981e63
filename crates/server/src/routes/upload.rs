//! Product photo upload handler.

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use serde::Serialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::storage::validate_upload;
use crate::state::AppState;

/// Multipart field carrying the file.
const IMAGE_FIELD: &str = "image";

/// Response from a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub image_url: String,
}

/// Store an uploaded product photo and return its public URL.
#[instrument(skip(state, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let storage = state
        .storage()
        .ok_or_else(|| AppError::Unavailable("Image storage is not configured".to_string()))?;
    let mut multipart = multipart?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();

        // Reject the wrong type before buffering the body
        validate_upload(&content_type, 0, storage.max_bytes())?;

        let data = field.bytes().await?;
        let image_url = storage.upload(data, &file_name, &content_type).await?;
        return Ok(Json(UploadResponse { image_url }));
    }

    Err(AppError::BadRequest("No file uploaded".to_string()))
}
