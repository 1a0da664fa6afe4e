//! Chat session and message types for Studium.
//!
//! These types model conversations between a user and the answering
//! service: sessions, their ordered message ledgers, and attachment
//! descriptors carried on individual messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Title assigned to a session at creation, before any user message
/// has been appended.
pub const DEFAULT_SESSION_TITLE: &str = "New Chat";

/// Number of characters of the first user message used as the derived
/// session title.
pub const TITLE_MAX_CHARS: usize = 50;

/// Who authored a message.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (sender IN ('user', 'bot'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Bot => write!(f, "bot"),
        }
    }
}

impl FromStr for Sender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Sender::User),
            "bot" => Ok(Sender::Bot),
            other => Err(format!("invalid sender: '{other}'")),
        }
    }
}

/// Reference to previously stored binary content, carried on the message
/// that created the link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_type: String,
    pub file_url: String,
}

/// A single message within a chat session.
///
/// Messages are append-only: created exactly once, never edited or
/// individually removed, and ordered by `created_at` within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub sender: Sender,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Attachment descriptor; absent for plain-text messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Attachment>,
}

/// A chat session between a user and the answering service.
///
/// This struct is the summary projection used by listings -- the message
/// ledger lives in [`SessionWithMessages`]. `owner_id` is set once at
/// creation and gates every subsequent read and write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub owner_id: String,
    pub owner_name: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A full session record: metadata plus its ordered message ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionWithMessages {
    #[serde(flatten)]
    pub session: ChatSession,
    pub messages: Vec<ChatMessage>,
}

/// Derive a session title from the first user message.
///
/// Takes the first [`TITLE_MAX_CHARS`] characters of `content`, falling back
/// to [`DEFAULT_SESSION_TITLE`] when the content is empty (attachment-only
/// first message).
pub fn derive_title(content: &str) -> String {
    if content.is_empty() {
        DEFAULT_SESSION_TITLE.to_string()
    } else {
        content.chars().take(TITLE_MAX_CHARS).collect()
    }
}
