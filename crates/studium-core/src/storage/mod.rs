//! AttachmentStore trait definition.
//!
//! Persists uploaded binary content and hands back a stable reference path.
//! Implementations live in studium-infra (`LocalAttachmentStore`).

use studium_types::error::UploadError;
use studium_types::upload::StoredAttachment;

/// Store for uploaded attachment content.
pub trait AttachmentStore: Send + Sync {
    /// Persist uploaded bytes under a collision-free storage name.
    ///
    /// Rejects media types outside the allowed set and payloads over the
    /// size limit before any content is written.
    fn store(
        &self,
        data: &[u8],
        mime_type: &str,
        original_name: &str,
    ) -> impl std::future::Future<Output = Result<StoredAttachment, UploadError>> + Send;

    /// Remove previously stored content by its reference path.
    ///
    /// Idempotent: content that is already gone is success, not an error.
    /// Only genuine I/O failures surface, and callers log rather than
    /// propagate them.
    fn delete(
        &self,
        file_url: &str,
    ) -> impl std::future::Future<Output = Result<(), UploadError>> + Send;
}
