//! Attachment upload handler.
//!
//! POST /api/v1/uploads
//!
//! Accepts a multipart form with a single `file` field, stores it via the
//! attachment store, and returns the stable reference a message's
//! `metadata.file_url` can carry. Media-type and size rejections happen in
//! the store before any bytes land on disk.

use std::time::Instant;

use axum::extract::{Multipart, State};
use axum::Json;
use uuid::Uuid;

use studium_core::storage::AttachmentStore;
use studium_types::upload::StoredAttachment;

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/uploads - Store an uploaded file.
pub async fn upload_file(
    State(state): State<AppState>,
    _auth: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<StoredAttachment>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or("upload").to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;

        let stored = state
            .chat_service
            .attachments()
            .store(&data, &mime_type, &original_name)
            .await?;

        let elapsed = start.elapsed().as_millis() as u64;
        let resp = ApiResponse::success(stored, request_id, elapsed);
        return Ok(Json(resp));
    }

    Err(AppError::Validation("No file uploaded".to_string()))
}
