//! AnsweringRelay trait definition.
//!
//! The relay is the boundary call from this core to the external answering
//! service. Implementations live in studium-infra (`HttpAnsweringRelay`).
//! Calls are bounded by a timeout; the relay never retries on its own --
//! callers resubmit if they want another attempt.

use studium_types::chat::Attachment;
use studium_types::error::RelayError;
use studium_types::relay::RelayAuth;

/// Boundary to the external answering service.
pub trait AnsweringRelay: Send + Sync {
    /// Forward a user message (and attachment reference, if present) and
    /// return the service's textual reply.
    ///
    /// Implementations substitute a fixed fallback string when the reply
    /// body is malformed or empty; timeout, non-success status, and network
    /// failure surface as [`RelayError`].
    fn ask(
        &self,
        query: &str,
        attachment: Option<&Attachment>,
        auth: &RelayAuth,
    ) -> impl std::future::Future<Output = Result<String, RelayError>> + Send;

    /// Forward raw audio for transcription and return the best-effort
    /// transcript, substituting a fixed placeholder when empty.
    fn transcribe(
        &self,
        audio: &[u8],
        mime_type: &str,
        filename: &str,
        auth: &RelayAuth,
    ) -> impl std::future::Future<Output = Result<String, RelayError>> + Send;
}
