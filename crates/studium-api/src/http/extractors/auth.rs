//! Verified-identity extractor.
//!
//! Authentication lives outside this core: an upstream gate verifies
//! credentials and forwards the caller's identity via trusted headers:
//! - `X-User-Id` -- the verified owner identity (required)
//! - `X-User-Name` -- display name (falls back to the id when absent)
//!
//! A missing identity is a precondition violation rejected with 401, never
//! an internal error. The raw `Authorization` header is captured so relay
//! calls can forward it verbatim to the answering service.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use studium_types::relay::RelayAuth;

use crate::http::error::AppError;
use crate::state::AppState;

/// The authenticated caller, as asserted by the upstream gate.
pub struct AuthUser {
    pub id: String,
    pub username: String,
    pub relay_auth: RelayAuth,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let id = header_string(parts, "x-user-id")?.ok_or_else(|| {
            AppError::Unauthorized(
                "Missing identity. The authentication gate must supply 'X-User-Id'.".to_string(),
            )
        })?;

        if id.is_empty() {
            return Err(AppError::Unauthorized("Empty 'X-User-Id' header.".to_string()));
        }

        let username = header_string(parts, "x-user-name")?.unwrap_or_else(|| id.clone());

        let relay_auth = match header_string(parts, AUTHORIZATION.as_str())? {
            Some(value) => RelayAuth::bearer(value),
            None => RelayAuth::anonymous(),
        };

        Ok(AuthUser {
            id,
            username,
            relay_auth,
        })
    }
}

/// Read a header as an owned string, rejecting non-UTF-8 values.
fn header_string(parts: &Parts, name: &str) -> Result<Option<String>, AppError> {
    match parts.headers.get(name) {
        Some(value) => value
            .to_str()
            .map(|s| Some(s.trim().to_string()))
            .map_err(|_| AppError::Unauthorized(format!("Invalid '{name}' header encoding"))),
        None => Ok(None),
    }
}
