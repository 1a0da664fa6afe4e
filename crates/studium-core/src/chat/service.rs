//! Chat service orchestrating session lifecycle, relay calls, and
//! attachment cleanup.
//!
//! Message-send path: validate -> persist user message -> relay -> persist
//! bot reply (or the fixed apology on relay failure). The user's message is
//! durably persisted regardless of relay outcome; content durability takes
//! precedence over answer availability.

use std::sync::Arc;

use chrono::Utc;
use studium_types::chat::{
    Attachment, ChatMessage, ChatSession, Sender, SessionWithMessages, DEFAULT_SESSION_TITLE,
};
use studium_types::error::{ChatError, RelayError};
use studium_types::relay::RelayAuth;
use tracing::{info, warn};
use uuid::Uuid;

use crate::chat::repository::SessionRepository;
use crate::relay::AnsweringRelay;
use crate::storage::AttachmentStore;

/// Bot reply persisted when the answering service is unreachable.
pub const RELAY_FAILURE_REPLY: &str = "Sorry, I'm having trouble responding.";

/// Result of a user message send: both persisted messages, plus the relay
/// failure (if any) so the caller can signal upstream unavailability while
/// the fallback reply stays persisted.
#[derive(Debug)]
pub struct SendOutcome {
    pub user_message: ChatMessage,
    pub bot_message: ChatMessage,
    pub relay_error: Option<RelayError>,
}

/// Orchestrates session lifecycle, message persistence, relay calls, and
/// best-effort attachment cleanup.
///
/// Generic over the repository, relay, and attachment-store traits so
/// studium-core never depends on studium-infra. Handles are injected once
/// at startup and live for the serving process.
pub struct ChatService<R, A, S>
where
    R: SessionRepository,
    A: AnsweringRelay,
    S: AttachmentStore + 'static,
{
    sessions: R,
    relay: A,
    attachments: Arc<S>,
}

impl<R, A, S> ChatService<R, A, S>
where
    R: SessionRepository,
    A: AnsweringRelay,
    S: AttachmentStore + 'static,
{
    /// Create a new chat service with the given handles.
    pub fn new(sessions: R, relay: A, attachments: Arc<S>) -> Self {
        Self {
            sessions,
            relay,
            attachments,
        }
    }

    /// Access the attachment store.
    pub fn attachments(&self) -> &Arc<S> {
        &self.attachments
    }

    // --- Session lifecycle ---

    /// Create a new empty session for the given owner.
    pub async fn create_session(
        &self,
        owner_id: &str,
        owner_name: &str,
    ) -> Result<ChatSession, ChatError> {
        let now = Utc::now();
        let session = ChatSession {
            id: Uuid::now_v7(),
            owner_id: owner_id.to_string(),
            owner_name: owner_name.to_string(),
            title: DEFAULT_SESSION_TITLE.to_string(),
            created_at: now,
            updated_at: now,
        };

        let created = self.sessions.create_session(&session).await?;
        info!(session_id = %created.id, "Chat session created");
        Ok(created)
    }

    /// List the owner's sessions as summaries, most recently updated first.
    pub async fn list_sessions(&self, owner_id: &str) -> Result<Vec<ChatSession>, ChatError> {
        Ok(self.sessions.list_sessions(owner_id).await?)
    }

    /// Fetch one full session, ledger included.
    pub async fn get_session(
        &self,
        owner_id: &str,
        session_id: &Uuid,
    ) -> Result<SessionWithMessages, ChatError> {
        self.sessions
            .get_session(owner_id, session_id)
            .await?
            .ok_or(ChatError::NotFound)
    }

    /// Delete a session, then schedule best-effort cleanup of every
    /// attachment its messages referenced.
    ///
    /// Cleanup runs after the record removal commits and never affects the
    /// delete's result; individual failures are logged only.
    pub async fn delete_session(
        &self,
        owner_id: &str,
        session_id: &Uuid,
    ) -> Result<(), ChatError> {
        let deleted = self
            .sessions
            .delete_session(owner_id, session_id)
            .await?
            .ok_or(ChatError::NotFound)?;

        let refs: Vec<String> = deleted
            .messages
            .iter()
            .filter_map(|m| m.metadata.as_ref().map(|a| a.file_url.clone()))
            .collect();

        info!(session_id = %session_id, attachments = refs.len(), "Chat session deleted");

        if !refs.is_empty() {
            let store = Arc::clone(&self.attachments);
            tokio::spawn(cleanup_attachments(store, refs));
        }

        Ok(())
    }

    // --- Message persistence ---

    /// Append a message to a session without relay involvement (used for
    /// bot messages posted directly by the surface).
    pub async fn append_message(
        &self,
        owner_id: &str,
        session_id: Uuid,
        sender: Sender,
        content: String,
        metadata: Option<Attachment>,
    ) -> Result<SessionWithMessages, ChatError> {
        validate_message(&content, metadata.as_ref())?;

        let message = ChatMessage {
            id: Uuid::now_v7(),
            session_id,
            sender,
            content,
            created_at: Utc::now(),
            metadata,
        };

        self.sessions
            .append_message(owner_id, &message)
            .await?
            .ok_or(ChatError::NotFound)
    }

    /// Send a user message: persist it, ask the answering service, and
    /// persist the reply.
    ///
    /// On relay failure the fixed apology is persisted as the bot message
    /// and the failure is carried in the outcome so the caller can signal
    /// upstream unavailability. No automatic retry is attempted.
    pub async fn send_user_message(
        &self,
        owner_id: &str,
        session_id: Uuid,
        content: String,
        metadata: Option<Attachment>,
        auth: &RelayAuth,
    ) -> Result<SendOutcome, ChatError> {
        validate_message(&content, metadata.as_ref())?;

        let user_message = ChatMessage {
            id: Uuid::now_v7(),
            session_id,
            sender: Sender::User,
            content,
            created_at: Utc::now(),
            metadata,
        };

        self.sessions
            .append_message(owner_id, &user_message)
            .await?
            .ok_or(ChatError::NotFound)?;

        let (reply, relay_error) = match self
            .relay
            .ask(&user_message.content, user_message.metadata.as_ref(), auth)
            .await
        {
            Ok(reply) => (reply, None),
            Err(err) => {
                warn!(session_id = %session_id, error = %err, "Answering relay failed");
                (RELAY_FAILURE_REPLY.to_string(), Some(err))
            }
        };

        let bot_message = ChatMessage {
            id: Uuid::now_v7(),
            session_id,
            sender: Sender::Bot,
            content: reply,
            created_at: Utc::now(),
            metadata: None,
        };

        self.sessions
            .append_message(owner_id, &bot_message)
            .await?
            .ok_or(ChatError::NotFound)?;

        Ok(SendOutcome {
            user_message,
            bot_message,
            relay_error,
        })
    }

    // --- Transcription ---

    /// Forward audio to the answering service for transcription.
    pub async fn transcribe(
        &self,
        audio: &[u8],
        mime_type: &str,
        filename: &str,
        auth: &RelayAuth,
    ) -> Result<String, RelayError> {
        self.relay.transcribe(audio, mime_type, filename, auth).await
    }
}

/// A message must carry text content or an attachment reference.
fn validate_message(content: &str, metadata: Option<&Attachment>) -> Result<(), ChatError> {
    let has_file = metadata.is_some_and(|a| !a.file_url.is_empty());
    if content.is_empty() && !has_file {
        return Err(ChatError::Validation(
            "Message content or file is required".to_string(),
        ));
    }
    Ok(())
}

/// Delete each attachment reference, logging failures without propagating.
async fn cleanup_attachments<S: AttachmentStore>(store: Arc<S>, refs: Vec<String>) {
    for file_url in refs {
        if let Err(err) = store.delete(&file_url).await {
            warn!(%file_url, error = %err, "Attachment cleanup failed");
        }
    }
}
