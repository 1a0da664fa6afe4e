//! SessionRepository trait definition.
//!
//! Provides CRUD operations for chat sessions and their message ledgers.
//! Every operation is gated on the owning user's identity: a session that
//! exists but belongs to someone else is reported exactly like one that
//! does not exist at all.

use studium_types::chat::{ChatMessage, ChatSession, SessionWithMessages};
use studium_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for chat session and message persistence.
///
/// Implementations live in studium-infra (e.g., `SqliteSessionRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait SessionRepository: Send + Sync {
    /// Persist a new chat session with an empty ledger.
    ///
    /// The session id must be globally unique; a collision is rejected with
    /// `Conflict`, never silently overwritten.
    fn create_session(
        &self,
        session: &ChatSession,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    /// List all sessions for an owner, without ledgers, ordered by
    /// `updated_at` descending. An empty result is a valid outcome.
    fn list_sessions(
        &self,
        owner_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSession>, RepositoryError>> + Send;

    /// Fetch a full session record, including the ledger.
    ///
    /// Returns `None` when the session is absent or owned by a different
    /// user -- the two cases are indistinguishable.
    fn get_session(
        &self,
        owner_id: &str,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<SessionWithMessages>, RepositoryError>> + Send;

    /// Atomically remove a session and return the deleted record so the
    /// caller can enumerate its attachments for cleanup.
    fn delete_session(
        &self,
        owner_id: &str,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<SessionWithMessages>, RepositoryError>> + Send;

    /// Append a message to a session's ledger as one indivisible update:
    /// push the message, refresh `updated_at`, and -- only when this is a
    /// user message landing on a previously empty ledger -- derive the
    /// session title from the message content. The emptiness check and the
    /// append commit together, so two racing first-sends cannot both win
    /// the title.
    ///
    /// Returns the updated full record, or `None` on owner/session mismatch.
    fn append_message(
        &self,
        owner_id: &str,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<Option<SessionWithMessages>, RepositoryError>> + Send;
}
