//! Session domain model.
//!
//! This module contains the ChatSession entity that represents one persisted
//! conversation in the application's domain layer.

use super::message::Message;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder title given to a session before its first user message.
pub const UNTITLED_SESSION: &str = "New conversation";

/// Maximum number of characters taken from the first user message when
/// auto-titling a session.
pub const TITLE_MAX_CHARS: usize = 30;

/// One persisted conversation: an ordered, append-only sequence of messages.
///
/// The message sequence only grows within one run; individual messages are
/// never removed, only the whole session can be deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Unique session identifier (UUID format)
    pub id: String,
    /// Human-readable session title
    pub title: String,
    /// Ordered conversation messages
    pub messages: Vec<Message>,
    /// Timestamp when the session was created (ISO 8601 format)
    pub created_at: String,
}

impl ChatSession {
    /// Creates an empty session with a placeholder title.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: UNTITLED_SESSION.to_string(),
            messages: Vec::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Derives the auto-title from the first user message, truncated to
    /// [`TITLE_MAX_CHARS`] on a character boundary.
    pub(crate) fn derive_title(content: &str) -> String {
        content.chars().take(TITLE_MAX_CHARS).collect()
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_untitled_and_empty() {
        let session = ChatSession::new();
        assert_eq!(session.title, UNTITLED_SESSION);
        assert!(session.messages.is_empty());
        assert!(!session.id.is_empty());
    }

    #[test]
    fn test_derive_title_truncates_to_thirty_chars() {
        let long = "a".repeat(64);
        assert_eq!(ChatSession::derive_title(&long).chars().count(), 30);
        assert_eq!(ChatSession::derive_title("short"), "short");
    }

    #[test]
    fn test_derive_title_is_char_boundary_safe() {
        let multibyte = "é".repeat(40);
        let title = ChatSession::derive_title(&multibyte);
        assert_eq!(title.chars().count(), 30);
        assert_eq!(title, "é".repeat(30));
    }
}
