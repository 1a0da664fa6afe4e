//! Attachment upload types and limits.

use serde::{Deserialize, Serialize};

/// Maximum accepted upload size: 10 MiB.
pub const MAX_UPLOAD_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Media types accepted by the attachment store.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "application/pdf",
    "text/plain",
    "audio/mpeg",
    "audio/wav",
];

/// Result of storing an uploaded file: a stable reference path, the stored
/// media type, and the filename the client originally supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAttachment {
    pub file_url: String,
    pub file_type: String,
    pub original_name: String,
}

/// Whether a declared media type is accepted by the attachment store.
pub fn is_allowed_mime(mime: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&mime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_mime_types() {
        assert!(is_allowed_mime("image/png"));
        assert!(is_allowed_mime("application/pdf"));
        assert!(is_allowed_mime("audio/wav"));
        assert!(!is_allowed_mime("application/x-msdownload"));
        assert!(!is_allowed_mime("text/html"));
        assert!(!is_allowed_mime(""));
    }

    #[test]
    fn test_stored_attachment_serde() {
        let stored = StoredAttachment {
            file_url: "/uploads/1700000000000-abc.png".to_string(),
            file_type: "image/png".to_string(),
            original_name: "diagram.png".to_string(),
        };
        let json = serde_json::to_string(&stored).unwrap();
        assert!(json.contains("\"file_url\""));
        assert!(json.contains("diagram.png"));
    }
}
