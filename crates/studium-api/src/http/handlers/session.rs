//! Session CRUD and message HTTP handlers.
//!
//! Endpoints:
//! - GET    /api/v1/sessions                - List the caller's sessions (summaries)
//! - POST   /api/v1/sessions                - Create an empty session
//! - GET    /api/v1/sessions/{id}           - Get one full session
//! - POST   /api/v1/sessions/{id}/messages  - Append a message (user messages
//!   trigger the answering relay; its failure yields 502 with both persisted
//!   messages in the body)
//! - DELETE /api/v1/sessions/{id}           - Delete a session + attachment cleanup

use std::time::Instant;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use studium_types::chat::{Attachment, Sender};

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for message appends.
#[derive(Debug, Deserialize)]
pub struct AddMessageRequest {
    #[serde(default)]
    pub content: String,
    pub sender: Sender,
    #[serde(default)]
    pub metadata: Option<Attachment>,
}

/// Parse a UUID from a path parameter, returning a 400 error on invalid format.
fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    s.parse::<Uuid>()
        .map_err(|_| AppError::Validation(format!("Invalid session id: {s}")))
}

/// GET /api/v1/sessions - List the caller's sessions, most recent first.
pub async fn list_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<serde_json::Value>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sessions = state.chat_service.list_sessions(&auth.id).await?;

    let elapsed = start.elapsed().as_millis() as u64;

    let sessions_json: Vec<serde_json::Value> = sessions
        .iter()
        .map(|s| serde_json::to_value(s).unwrap())
        .collect();

    let resp = ApiResponse::success(sessions_json, request_id, elapsed)
        .with_link("self", "/api/v1/sessions");

    Ok(Json(resp))
}

/// POST /api/v1/sessions - Create an empty session for the caller.
pub async fn create_session(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let session = state
        .chat_service
        .create_session(&auth.id, &auth.username)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;

    let session_json = serde_json::to_value(&session).unwrap();
    let resp = ApiResponse::success(session_json, request_id, elapsed)
        .with_link("self", &format!("/api/v1/sessions/{}", session.id))
        .with_link("messages", &format!("/api/v1/sessions/{}/messages", session.id));

    Ok(Json(resp))
}

/// GET /api/v1/sessions/{id} - Get a full session, ledger included.
pub async fn get_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sid = parse_uuid(&session_id)?;

    let full = state.chat_service.get_session(&auth.id, &sid).await?;

    let elapsed = start.elapsed().as_millis() as u64;

    let session_json = serde_json::to_value(&full).unwrap();
    let resp = ApiResponse::success(session_json, request_id, elapsed)
        .with_link("self", &format!("/api/v1/sessions/{}", full.session.id));

    Ok(Json(resp))
}

/// POST /api/v1/sessions/{id}/messages - Append a message.
///
/// A `sender=user` message triggers the relay orchestration: the user
/// message is persisted, the answering service is asked, and its reply (or
/// the fixed apology on failure) is persisted as the bot message. Relay
/// failure still returns both persisted messages, with 502 semantics so the
/// caller can distinguish it from success.
pub async fn add_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<String>,
    Json(body): Json<AddMessageRequest>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sid = parse_uuid(&session_id)?;

    match body.sender {
        Sender::User => {
            let outcome = state
                .chat_service
                .send_user_message(&auth.id, sid, body.content, body.metadata, &auth.relay_auth)
                .await?;

            let elapsed = start.elapsed().as_millis() as u64;
            let data = serde_json::json!({
                "user_message": outcome.user_message,
                "bot_message": outcome.bot_message,
            });

            let resp = ApiResponse::success(data, request_id, elapsed)
                .with_link("session", &format!("/api/v1/sessions/{sid}"));

            match outcome.relay_error {
                Some(err) => Ok(resp.with_error("UPSTREAM_UNAVAILABLE", &err.to_string())),
                None => Ok(resp),
            }
        }
        Sender::Bot => {
            let full = state
                .chat_service
                .append_message(&auth.id, sid, body.sender, body.content, body.metadata)
                .await?;

            let elapsed = start.elapsed().as_millis() as u64;
            let data = serde_json::to_value(&full).unwrap();

            Ok(ApiResponse::success(data, request_id, elapsed)
                .with_link("session", &format!("/api/v1/sessions/{sid}")))
        }
    }
}

/// DELETE /api/v1/sessions/{id} - Delete a session.
///
/// Attachment cleanup is scheduled after the record removal commits; its
/// outcome never affects this response.
pub async fn delete_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sid = parse_uuid(&session_id)?;

    state.chat_service.delete_session(&auth.id, &sid).await?;

    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(
        serde_json::json!({"deleted": true}),
        request_id,
        elapsed,
    );

    Ok(Json(resp))
}
