//! Audio transcription handler.
//!
//! POST /api/v1/transcriptions
//!
//! Accepts a multipart form with a single `audio` field and forwards it to
//! the answering service for transcription. No session state is touched;
//! the transcript comes straight back to the caller.

use std::time::Instant;

use axum::extract::{Multipart, State};
use axum::Json;
use uuid::Uuid;

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/transcriptions - Transcribe an uploaded audio clip.
pub async fn transcribe_audio(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("audio") {
            continue;
        }

        let filename = field.file_name().unwrap_or("audio").to_string();
        let mime_type = field.content_type().unwrap_or("audio/wav").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read audio: {e}")))?;

        let transcript = state
            .chat_service
            .transcribe(&data, &mime_type, &filename, &auth.relay_auth)
            .await?;

        let elapsed = start.elapsed().as_millis() as u64;
        let resp = ApiResponse::success(
            serde_json::json!({"transcribed": transcript}),
            request_id,
            elapsed,
        );
        return Ok(Json(resp));
    }

    Err(AppError::Validation("No audio file uploaded".to_string()))
}
