//! SQLite session repository implementation.
//!
//! Implements `SessionRepository` from `studium-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, reader pool for
//! queries and writer pool (single connection) for mutations.
//!
//! The append path runs as one transaction on the writer pool: the
//! pre-append ledger count, the message insert, and the session touch (with
//! conditional title derivation) commit together, so two racing first-sends
//! cannot both derive the title.

use studium_core::chat::repository::SessionRepository;
use studium_types::chat::{derive_title, Attachment, ChatMessage, ChatSession, Sender, SessionWithMessages};
use studium_types::error::RepositoryError;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `SessionRepository`.
pub struct SqliteSessionRepository {
    pool: DatabasePool,
}

impl SqliteSessionRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

/// Internal row type for mapping SQLite rows to domain ChatSession.
struct ChatSessionRow {
    id: String,
    owner_id: String,
    owner_name: String,
    title: String,
    created_at: String,
    updated_at: String,
}

impl ChatSessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            owner_name: row.try_get("owner_name")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_session(self) -> Result<ChatSession, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid session id: {e}")))?;
        let created_at = parse_datetime(&self.created_at)?;
        let updated_at = parse_datetime(&self.updated_at)?;

        Ok(ChatSession {
            id,
            owner_id: self.owner_id,
            owner_name: self.owner_name,
            title: self.title,
            created_at,
            updated_at,
        })
    }
}

/// Internal row type for mapping SQLite rows to domain ChatMessage.
struct ChatMessageRow {
    id: String,
    session_id: String,
    sender: String,
    content: String,
    created_at: String,
    file_type: Option<String>,
    file_url: Option<String>,
}

impl ChatMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            sender: row.try_get("sender")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
            file_type: row.try_get("file_type")?,
            file_url: row.try_get("file_url")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?;
        let session_id = Uuid::parse_str(&self.session_id)
            .map_err(|e| RepositoryError::Query(format!("invalid session_id: {e}")))?;
        let sender: Sender = self
            .sender
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let created_at = parse_datetime(&self.created_at)?;

        let metadata = self.file_url.map(|file_url| Attachment {
            file_type: self.file_type.unwrap_or_default(),
            file_url,
        });

        Ok(ChatMessage {
            id,
            session_id,
            sender,
            content: self.content,
            created_at,
            metadata,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn query_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

impl SqliteSessionRepository {
    /// Load a full session record (ledger included) from the reader pool.
    ///
    /// The rowid tiebreaker keeps insertion order stable for messages
    /// appended within the same millisecond.
    async fn fetch_full(
        &self,
        owner_id: &str,
        session_id: &Uuid,
    ) -> Result<Option<SessionWithMessages>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_sessions WHERE id = ? AND owner_id = ?")
            .bind(session_id.to_string())
            .bind(owner_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let session = ChatSessionRow::from_row(&row)
            .map_err(query_error)?
            .into_session()?;

        let rows = sqlx::query(
            "SELECT * FROM chat_messages WHERE session_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let msg_row = ChatMessageRow::from_row(row).map_err(query_error)?;
            messages.push(msg_row.into_message()?);
        }

        Ok(Some(SessionWithMessages { session, messages }))
    }
}

// ---------------------------------------------------------------------------
// SessionRepository implementation
// ---------------------------------------------------------------------------

impl SessionRepository for SqliteSessionRepository {
    async fn create_session(
        &self,
        session: &ChatSession,
    ) -> Result<ChatSession, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO chat_sessions (id, owner_id, owner_name, title, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(session.id.to_string())
        .bind(&session.owner_id)
        .bind(&session.owner_name)
        .bind(&session.title)
        .bind(format_datetime(&session.created_at))
        .bind(format_datetime(&session.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Conflict(
                format!("session '{}' already exists", session.id),
            ),
            _ => query_error(e),
        })?;

        Ok(session.clone())
    }

    async fn list_sessions(&self, owner_id: &str) -> Result<Vec<ChatSession>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM chat_sessions WHERE owner_id = ? ORDER BY updated_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            let session_row = ChatSessionRow::from_row(row).map_err(query_error)?;
            sessions.push(session_row.into_session()?);
        }

        Ok(sessions)
    }

    async fn get_session(
        &self,
        owner_id: &str,
        session_id: &Uuid,
    ) -> Result<Option<SessionWithMessages>, RepositoryError> {
        self.fetch_full(owner_id, session_id).await
    }

    async fn delete_session(
        &self,
        owner_id: &str,
        session_id: &Uuid,
    ) -> Result<Option<SessionWithMessages>, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let row = sqlx::query("SELECT * FROM chat_sessions WHERE id = ? AND owner_id = ?")
            .bind(session_id.to_string())
            .bind(owner_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let session = ChatSessionRow::from_row(&row)
            .map_err(query_error)?
            .into_session()?;

        let rows = sqlx::query(
            "SELECT * FROM chat_messages WHERE session_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(session_id.to_string())
        .fetch_all(&mut *tx)
        .await
        .map_err(query_error)?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let msg_row = ChatMessageRow::from_row(row).map_err(query_error)?;
            messages.push(msg_row.into_message()?);
        }

        // FK cascade removes the ledger with the session record.
        sqlx::query("DELETE FROM chat_sessions WHERE id = ? AND owner_id = ?")
            .bind(session_id.to_string())
            .bind(owner_id)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;

        Ok(Some(SessionWithMessages { session, messages }))
    }

    async fn append_message(
        &self,
        owner_id: &str,
        message: &ChatMessage,
    ) -> Result<Option<SessionWithMessages>, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let session = sqlx::query("SELECT id FROM chat_sessions WHERE id = ? AND owner_id = ?")
            .bind(message.session_id.to_string())
            .bind(owner_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_error)?;

        if session.is_none() {
            return Ok(None);
        }

        // Pre-append ledger length, read inside the same transaction as the
        // insert: only the first message ever appended can derive the title.
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM chat_messages WHERE session_id = ?")
                .bind(message.session_id.to_string())
                .fetch_one(&mut *tx)
                .await
                .map_err(query_error)?;

        let (file_type, file_url) = match &message.metadata {
            Some(a) => (Some(a.file_type.as_str()), Some(a.file_url.as_str())),
            None => (None, None),
        };

        sqlx::query(
            r#"INSERT INTO chat_messages (id, session_id, sender, content, created_at, file_type, file_url)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(message.id.to_string())
        .bind(message.session_id.to_string())
        .bind(message.sender.to_string())
        .bind(&message.content)
        .bind(format_datetime(&message.created_at))
        .bind(file_type)
        .bind(file_url)
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        let touched_at = format_datetime(&message.created_at);
        if count == 0 && message.sender == Sender::User {
            sqlx::query("UPDATE chat_sessions SET title = ?, updated_at = ? WHERE id = ?")
                .bind(derive_title(&message.content))
                .bind(&touched_at)
                .bind(message.session_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(query_error)?;
        } else {
            sqlx::query("UPDATE chat_sessions SET updated_at = ? WHERE id = ?")
                .bind(&touched_at)
                .bind(message.session_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(query_error)?;
        }

        tx.commit().await.map_err(query_error)?;

        self.fetch_full(owner_id, &message.session_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::DatabasePool;
    use studium_types::chat::DEFAULT_SESSION_TITLE;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn make_session(owner_id: &str) -> ChatSession {
        let now = Utc::now();
        ChatSession {
            id: Uuid::now_v7(),
            owner_id: owner_id.to_string(),
            owner_name: "Alice".to_string(),
            title: DEFAULT_SESSION_TITLE.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn make_message(session_id: Uuid, sender: Sender, content: &str) -> ChatMessage {
        ChatMessage {
            id: Uuid::now_v7(),
            session_id,
            sender,
            content: content.to_string(),
            created_at: Utc::now(),
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool);

        let session = make_session("user-1");
        let created = repo.create_session(&session).await.unwrap();
        assert_eq!(created.id, session.id);
        assert_eq!(created.title, DEFAULT_SESSION_TITLE);

        let found = repo.get_session("user-1", &session.id).await.unwrap().unwrap();
        assert_eq!(found.session.id, session.id);
        assert_eq!(found.session.owner_name, "Alice");
        assert!(found.messages.is_empty());
    }

    #[tokio::test]
    async fn test_create_duplicate_id_is_conflict() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool);

        let session = make_session("user-1");
        repo.create_session(&session).await.unwrap();

        let result = repo.create_session(&session).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_owner_mismatch_indistinguishable_from_absent() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool);

        let session = make_session("user-1");
        repo.create_session(&session).await.unwrap();

        // Wrong owner and unknown id produce the identical outcome.
        let foreign = repo.get_session("user-2", &session.id).await.unwrap();
        let absent = repo.get_session("user-1", &Uuid::now_v7()).await.unwrap();
        assert!(foreign.is_none());
        assert!(absent.is_none());
    }

    #[tokio::test]
    async fn test_list_sessions_most_recent_first() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool);

        let s1 = make_session("user-1");
        let s2 = make_session("user-1");
        let s3 = make_session("user-2");
        repo.create_session(&s1).await.unwrap();
        repo.create_session(&s2).await.unwrap();
        repo.create_session(&s3).await.unwrap();

        // Touch s1 so it becomes the most recently updated.
        let msg = make_message(s1.id, Sender::User, "bump");
        repo.append_message("user-1", &msg).await.unwrap();

        let sessions = repo.list_sessions("user-1").await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, s1.id);
        assert_eq!(sessions[1].id, s2.id);

        let empty = repo.list_sessions("user-3").await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_first_user_message_derives_title() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool);

        let session = make_session("user-1");
        repo.create_session(&session).await.unwrap();

        let msg = make_message(session.id, Sender::User, "What is 2+2?");
        let updated = repo.append_message("user-1", &msg).await.unwrap().unwrap();

        assert_eq!(updated.session.title, "What is 2+2?");
        assert_eq!(updated.messages.len(), 1);
        assert!(updated.session.updated_at > session.updated_at);
    }

    #[tokio::test]
    async fn test_title_truncated_to_fifty_chars() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool);

        let session = make_session("user-1");
        repo.create_session(&session).await.unwrap();

        let long = "a".repeat(80);
        let msg = make_message(session.id, Sender::User, &long);
        let updated = repo.append_message("user-1", &msg).await.unwrap().unwrap();

        assert_eq!(updated.session.title.chars().count(), 50);
    }

    #[tokio::test]
    async fn test_later_messages_never_change_title() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool);

        let session = make_session("user-1");
        repo.create_session(&session).await.unwrap();

        let first = make_message(session.id, Sender::User, "first question");
        repo.append_message("user-1", &first).await.unwrap();

        let reply = make_message(session.id, Sender::Bot, "an answer");
        repo.append_message("user-1", &reply).await.unwrap();

        let second = make_message(session.id, Sender::User, "second question");
        let updated = repo.append_message("user-1", &second).await.unwrap().unwrap();

        assert_eq!(updated.session.title, "first question");
        assert_eq!(updated.messages.len(), 3);
    }

    #[tokio::test]
    async fn test_bot_message_on_empty_ledger_keeps_default_title() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool);

        let session = make_session("user-1");
        repo.create_session(&session).await.unwrap();

        let greeting = make_message(session.id, Sender::Bot, "Welcome!");
        repo.append_message("user-1", &greeting).await.unwrap();

        // The ledger is no longer empty, so the next user message does not
        // derive the title either.
        let question = make_message(session.id, Sender::User, "a question");
        let updated = repo.append_message("user-1", &question).await.unwrap().unwrap();
        assert_eq!(updated.session.title, DEFAULT_SESSION_TITLE);
    }

    #[tokio::test]
    async fn test_append_preserves_insertion_order() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool);

        let session = make_session("user-1");
        repo.create_session(&session).await.unwrap();

        for i in 0..5 {
            let msg = make_message(session.id, Sender::User, &format!("message {i}"));
            repo.append_message("user-1", &msg).await.unwrap();
        }

        let full = repo.get_session("user-1", &session.id).await.unwrap().unwrap();
        let contents: Vec<&str> = full.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["message 0", "message 1", "message 2", "message 3", "message 4"]
        );
    }

    #[tokio::test]
    async fn test_append_persists_attachment_metadata() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool);

        let session = make_session("user-1");
        repo.create_session(&session).await.unwrap();

        let mut msg = make_message(session.id, Sender::User, "see attached");
        msg.metadata = Some(Attachment {
            file_type: "application/pdf".to_string(),
            file_url: "/uploads/1700000000000-abc.pdf".to_string(),
        });
        repo.append_message("user-1", &msg).await.unwrap();

        let full = repo.get_session("user-1", &session.id).await.unwrap().unwrap();
        let stored = full.messages[0].metadata.as_ref().unwrap();
        assert_eq!(stored.file_type, "application/pdf");
        assert_eq!(stored.file_url, "/uploads/1700000000000-abc.pdf");
    }

    #[tokio::test]
    async fn test_append_to_absent_session_returns_none() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool);

        let msg = make_message(Uuid::now_v7(), Sender::User, "lost");
        let result = repo.append_message("user-1", &msg).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_append_with_wrong_owner_returns_none_and_leaves_ledger() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool);

        let session = make_session("user-1");
        repo.create_session(&session).await.unwrap();

        let msg = make_message(session.id, Sender::User, "intruder");
        let result = repo.append_message("user-2", &msg).await.unwrap();
        assert!(result.is_none());

        let full = repo.get_session("user-1", &session.id).await.unwrap().unwrap();
        assert!(full.messages.is_empty());
    }

    #[tokio::test]
    async fn test_delete_returns_record_and_cascades_messages() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool.clone());

        let session = make_session("user-1");
        repo.create_session(&session).await.unwrap();

        let mut msg = make_message(session.id, Sender::User, "with file");
        msg.metadata = Some(Attachment {
            file_type: "image/png".to_string(),
            file_url: "/uploads/1-a.png".to_string(),
        });
        repo.append_message("user-1", &msg).await.unwrap();

        let deleted = repo
            .delete_session("user-1", &session.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(deleted.messages.len(), 1);
        assert_eq!(
            deleted.messages[0].metadata.as_ref().unwrap().file_url,
            "/uploads/1-a.png"
        );

        let found = repo.get_session("user-1", &session.id).await.unwrap();
        assert!(found.is_none());

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM chat_messages WHERE session_id = ?")
                .bind(session.id.to_string())
                .fetch_one(&pool.reader)
                .await
                .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_delete_with_wrong_owner_returns_none() {
        let pool = test_pool().await;
        let repo = SqliteSessionRepository::new(pool);

        let session = make_session("user-1");
        repo.create_session(&session).await.unwrap();

        let result = repo.delete_session("user-2", &session.id).await.unwrap();
        assert!(result.is_none());

        // Still present for the real owner.
        let found = repo.get_session("user-1", &session.id).await.unwrap();
        assert!(found.is_some());
    }
}
