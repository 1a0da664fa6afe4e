use thiserror::Error;

/// Errors from repository operations (used by trait definitions in studium-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors surfaced by the session service.
///
/// `NotFound` covers both an unknown session id and a session owned by a
/// different identity -- the two are indistinguishable to the caller.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat session not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<RepositoryError> for ChatError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => ChatError::NotFound,
            other => ChatError::Storage(other.to_string()),
        }
    }
}

/// Errors related to attachment upload and removal.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("unsupported media type: '{0}'")]
    UnsupportedMediaType(String),

    #[error("file exceeds maximum size of {limit} bytes (got {actual} bytes)")]
    FileTooLarge { limit: u64, actual: u64 },

    #[error("i/o error: {0}")]
    Io(String),
}

/// Errors from the answering-service relay.
///
/// Carries the upstream status when known. The relay never retries; callers
/// resubmit if they want another attempt.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("answering service timed out")]
    Timeout,

    #[error("answering service returned status {0}")]
    UpstreamStatus(u16),

    #[error("network error: {0}")]
    Network(String),
}
