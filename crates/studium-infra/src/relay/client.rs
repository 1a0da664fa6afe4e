//! HttpAnsweringRelay -- concrete [`AnsweringRelay`] implementation.
//!
//! Forwards user messages and audio to the external answering service over
//! HTTP with a bounded per-call timeout. The caller's `Authorization` header
//! travels with the request verbatim; this layer adds no credentials of its
//! own. Failed calls are never retried here -- resubmission is the caller's
//! decision.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use studium_core::relay::AnsweringRelay;
use studium_types::chat::Attachment;
use studium_types::error::RelayError;
use studium_types::relay::RelayAuth;

/// Reply substituted when the answering service returns a malformed or
/// empty body.
pub const EMPTY_REPLY_FALLBACK: &str = "I didn't get a response";

/// Transcript substituted when transcription comes back empty.
pub const EMPTY_TRANSCRIPT_FALLBACK: &str = "Could not transcribe audio";

/// HTTP client for the external answering service.
pub struct HttpAnsweringRelay {
    client: reqwest::Client,
    base_url: String,
}

/// Request body for the answering endpoint.
#[derive(Debug, Serialize)]
struct AskRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_type: Option<&'a str>,
}

/// Answer payload; the service replies `{ "response": "..." }`.
#[derive(Debug, Deserialize)]
struct AskResponse {
    response: Option<String>,
}

/// Transcription payload; the service replies `{ "transcribed": "..." }`.
#[derive(Debug, Deserialize)]
struct TranscribeResponse {
    transcribed: Option<String>,
}

impl HttpAnsweringRelay {
    /// Create a new relay client.
    ///
    /// `timeout` bounds every call; on expiry the request is treated as a
    /// relay failure (no retry).
    pub fn new(base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to create reqwest client");

        Self { client, base_url }
    }

    /// Build the full URL for a given path.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the caller's `Authorization` header, if present.
    fn with_auth(
        request: reqwest::RequestBuilder,
        auth: &RelayAuth,
    ) -> reqwest::RequestBuilder {
        match &auth.authorization {
            Some(value) => request.header(reqwest::header::AUTHORIZATION, value),
            None => request,
        }
    }
}

/// Map a reqwest failure to the relay error taxonomy.
fn map_send_error(e: reqwest::Error) -> RelayError {
    if e.is_timeout() {
        RelayError::Timeout
    } else {
        RelayError::Network(e.to_string())
    }
}

/// A present, non-empty reply passes through; anything else becomes the
/// given fallback.
fn reply_or_fallback(reply: Option<String>, fallback: &str) -> String {
    match reply {
        Some(text) if !text.is_empty() => text,
        _ => fallback.to_string(),
    }
}

impl AnsweringRelay for HttpAnsweringRelay {
    async fn ask(
        &self,
        query: &str,
        attachment: Option<&Attachment>,
        auth: &RelayAuth,
    ) -> Result<String, RelayError> {
        let body = AskRequest {
            query,
            file_url: attachment.map(|a| a.file_url.as_str()),
            file_type: attachment.map(|a| a.file_type.as_str()),
        };

        let request = Self::with_auth(self.client.post(self.url("/api/chat")), auth).json(&body);

        let response = request.send().await.map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::UpstreamStatus(status.as_u16()));
        }

        // A body that fails to parse is treated like an empty reply, not an
        // error: the service answered, just not usably.
        let parsed = response.json::<AskResponse>().await.ok();
        Ok(reply_or_fallback(
            parsed.and_then(|p| p.response),
            EMPTY_REPLY_FALLBACK,
        ))
    }

    async fn transcribe(
        &self,
        audio: &[u8],
        mime_type: &str,
        filename: &str,
        auth: &RelayAuth,
    ) -> Result<String, RelayError> {
        let part = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name(filename.to_string())
            .mime_str(mime_type)
            .map_err(|e| RelayError::Network(format!("invalid mime type: {e}")))?;
        let form = reqwest::multipart::Form::new().part("audio", part);

        let request =
            Self::with_auth(self.client.post(self.url("/api/chat")), auth).multipart(form);

        let response = request.send().await.map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::UpstreamStatus(status.as_u16()));
        }

        let parsed = response.json::<TranscribeResponse>().await.ok();
        Ok(reply_or_fallback(
            parsed.and_then(|p| p.transcribed),
            EMPTY_TRANSCRIPT_FALLBACK,
        ))
    }
}
