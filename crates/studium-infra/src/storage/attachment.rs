//! Local filesystem attachment store implementation.
//!
//! Implements the `AttachmentStore` trait from `studium-core` with uploaded
//! content stored flat under `{uploads_dir}/`. Storage names combine the
//! upload timestamp with a UUID suffix so concurrent uploads of identically
//! named files never collide, preserving the original extension so served
//! content keeps a usable type hint.

use std::path::{Path, PathBuf};

use chrono::Utc;
use studium_core::storage::AttachmentStore;
use studium_types::error::UploadError;
use studium_types::upload::{is_allowed_mime, StoredAttachment, MAX_UPLOAD_SIZE_BYTES};
use uuid::Uuid;

/// Prefix of every reference path handed out by this store.
const URL_PREFIX: &str = "/uploads/";

/// Local filesystem-backed attachment store.
pub struct LocalAttachmentStore {
    uploads_dir: PathBuf,
}

impl LocalAttachmentStore {
    /// Create a new store rooted at `uploads_dir`.
    pub fn new(uploads_dir: PathBuf) -> Self {
        Self { uploads_dir }
    }

    /// Directory holding the stored content (for static serving).
    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Generate a collision-free storage name: upload timestamp plus a
    /// unique suffix, keeping the original extension.
    fn storage_name(original_name: &str) -> String {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();

        format!(
            "{}-{}{}",
            Utc::now().timestamp_millis(),
            Uuid::now_v7().simple(),
            ext
        )
    }

    /// Resolve a reference path back to a file inside the uploads directory.
    ///
    /// Returns `None` for references outside the uploads namespace or
    /// containing path separators -- those cannot point at stored content.
    fn resolve(&self, file_url: &str) -> Option<PathBuf> {
        let name = file_url.strip_prefix(URL_PREFIX)?;
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return None;
        }
        Some(self.uploads_dir.join(name))
    }
}

impl AttachmentStore for LocalAttachmentStore {
    async fn store(
        &self,
        data: &[u8],
        mime_type: &str,
        original_name: &str,
    ) -> Result<StoredAttachment, UploadError> {
        if !is_allowed_mime(mime_type) {
            return Err(UploadError::UnsupportedMediaType(mime_type.to_string()));
        }

        if data.len() as u64 > MAX_UPLOAD_SIZE_BYTES {
            return Err(UploadError::FileTooLarge {
                limit: MAX_UPLOAD_SIZE_BYTES,
                actual: data.len() as u64,
            });
        }

        tokio::fs::create_dir_all(&self.uploads_dir)
            .await
            .map_err(|e| UploadError::Io(format!("failed to create uploads dir: {e}")))?;

        let name = Self::storage_name(original_name);
        let path = self.uploads_dir.join(&name);

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| UploadError::Io(format!("failed to write upload: {e}")))?;

        tracing::debug!(file = %name, bytes = data.len(), "Attachment stored");

        Ok(StoredAttachment {
            file_url: format!("{URL_PREFIX}{name}"),
            file_type: mime_type.to_string(),
            original_name: original_name.to_string(),
        })
    }

    async fn delete(&self, file_url: &str) -> Result<(), UploadError> {
        let Some(path) = self.resolve(file_url) else {
            tracing::warn!(%file_url, "Ignoring attachment reference outside uploads namespace");
            return Ok(());
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            // Idempotent: already-gone content is success.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(UploadError::Io(format!(
                "failed to delete {}: {e}",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_store() -> (LocalAttachmentStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalAttachmentStore::new(dir.path().to_path_buf());
        (store, dir)
    }

    #[tokio::test]
    async fn test_store_writes_content_and_returns_reference() {
        let (store, dir) = make_store();

        let stored = store
            .store(b"fake png bytes", "image/png", "diagram.png")
            .await
            .unwrap();

        assert!(stored.file_url.starts_with("/uploads/"));
        assert!(stored.file_url.ends_with(".png"));
        assert_eq!(stored.file_type, "image/png");
        assert_eq!(stored.original_name, "diagram.png");

        let name = stored.file_url.strip_prefix("/uploads/").unwrap();
        let content = tokio::fs::read(dir.path().join(name)).await.unwrap();
        assert_eq!(content, b"fake png bytes");
    }

    #[tokio::test]
    async fn test_storage_names_never_collide() {
        let (store, _dir) = make_store();

        let a = store.store(b"a", "text/plain", "notes.txt").await.unwrap();
        let b = store.store(b"b", "text/plain", "notes.txt").await.unwrap();
        assert_ne!(a.file_url, b.file_url);
    }

    #[tokio::test]
    async fn test_disallowed_mime_rejected_without_side_effect() {
        let (store, dir) = make_store();

        let result = store
            .store(b"MZ...", "application/x-msdownload", "setup.exe")
            .await;
        assert!(matches!(result, Err(UploadError::UnsupportedMediaType(_))));

        // Nothing was written.
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oversized_upload_rejected() {
        let (store, _dir) = make_store();

        let data = vec![0u8; (MAX_UPLOAD_SIZE_BYTES + 1) as usize];
        let result = store.store(&data, "application/pdf", "huge.pdf").await;
        assert!(matches!(result, Err(UploadError::FileTooLarge { .. })));
    }

    #[tokio::test]
    async fn test_extension_preserved_and_unusual_names_flattened() {
        let (store, _dir) = make_store();

        let stored = store
            .store(b"x", "image/jpeg", "holiday photo.JPG")
            .await
            .unwrap();
        assert!(stored.file_url.ends_with(".jpg"));

        let stored = store.store(b"x", "text/plain", "no_extension").await.unwrap();
        assert!(!stored.file_url.contains('.'));
    }

    #[tokio::test]
    async fn test_delete_removes_stored_content() {
        let (store, dir) = make_store();

        let stored = store.store(b"bye", "text/plain", "note.txt").await.unwrap();
        store.delete(&stored.file_url).await.unwrap();

        let name = stored.file_url.strip_prefix("/uploads/").unwrap();
        assert!(!dir.path().join(name).exists());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (store, _dir) = make_store();

        let stored = store.store(b"bye", "text/plain", "note.txt").await.unwrap();
        store.delete(&stored.file_url).await.unwrap();
        // Second delete of the same reference is still success.
        store.delete(&stored.file_url).await.unwrap();
        // As is deleting something that never existed.
        store.delete("/uploads/never-was-here.txt").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_ignores_references_outside_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalAttachmentStore::new(dir.path().join("uploads"));

        // A file next to the uploads dir must be unreachable.
        let secret = dir.path().join("secret.txt");
        tokio::fs::write(&secret, b"keep me").await.unwrap();

        store.delete("/uploads/../secret.txt").await.unwrap();
        store.delete("/etc/passwd").await.unwrap();
        store.delete("/uploads/").await.unwrap();

        assert!(secret.exists());
    }
}
