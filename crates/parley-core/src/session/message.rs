//! Conversation message types.
//!
//! This module contains types for representing messages in a conversation,
//! including roles, grounding citations, and the patch applied while an
//! assistant response is streaming in.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message from the user.
    User,
    /// Message from the AI assistant.
    Assistant,
}

/// A web citation attached to an assistant response.
///
/// Within one message the `uri` is the dedup key: a source with a
/// previously-seen URI is never stored twice, even under a different title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub title: String,
    pub uri: String,
}

/// A single message in a conversation.
///
/// User messages are immutable after creation. Assistant messages start as
/// an empty placeholder and have their content replaced wholesale by each
/// cumulative stream chunk until the stream ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier (UUID format), stable for the message's lifetime.
    pub id: String,
    /// The role of the message sender. Immutable after creation.
    pub role: Role,
    /// The message text.
    pub content: String,
    /// Timestamp when the message was created (ISO 8601 format), display only.
    pub timestamp: String,
    /// Citations attached to an assistant response. `None` means no grounding
    /// metadata has arrived yet, which is distinct from an empty list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<GroundingSource>>,
}

impl Message {
    /// Creates a user message with the given content.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::User,
            content: content.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            sources: None,
        }
    }

    /// Creates an empty assistant placeholder to be filled in by the stream.
    pub fn assistant_placeholder() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: String::new(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            sources: None,
        }
    }

    /// Applies a stream patch: content is replaced wholesale, sources are
    /// merged with dedup by URI (first-seen title retained).
    pub(crate) fn apply(&mut self, patch: MessagePatch) {
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(incoming) = patch.sources {
            self.merge_sources(incoming);
        }
    }

    fn merge_sources(&mut self, incoming: Vec<GroundingSource>) {
        let existing = self.sources.get_or_insert_with(Vec::new);
        for source in incoming {
            if !existing.iter().any(|s| s.uri == source.uri) {
                existing.push(source);
            }
        }
    }
}

/// A partial update to an in-flight assistant message.
///
/// `None` fields leave the corresponding message field untouched.
#[derive(Debug, Clone, Default)]
pub struct MessagePatch {
    pub content: Option<String>,
    pub sources: Option<Vec<GroundingSource>>,
}

impl MessagePatch {
    /// Patch carrying only replacement content.
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            sources: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(title: &str, uri: &str) -> GroundingSource {
        GroundingSource {
            title: title.to_string(),
            uri: uri.to_string(),
        }
    }

    #[test]
    fn test_apply_replaces_content_wholesale() {
        let mut message = Message::assistant_placeholder();
        message.apply(MessagePatch::content("Recu"));
        message.apply(MessagePatch::content("Recursion is..."));
        assert_eq!(message.content, "Recursion is...");
    }

    #[test]
    fn test_merge_sources_dedupes_by_uri_keeping_first_title() {
        let mut message = Message::assistant_placeholder();
        message.apply(MessagePatch {
            content: None,
            sources: Some(vec![source("A", "u1")]),
        });
        message.apply(MessagePatch {
            content: None,
            sources: Some(vec![source("A2", "u1"), source("B", "u2")]),
        });
        assert_eq!(
            message.sources,
            Some(vec![source("A", "u1"), source("B", "u2")])
        );
    }

    #[test]
    fn test_absent_sources_leave_message_undecided() {
        let mut message = Message::assistant_placeholder();
        message.apply(MessagePatch::content("hello"));
        assert_eq!(message.sources, None);

        // An explicitly empty list is a decision, not absence.
        message.apply(MessagePatch {
            content: None,
            sources: Some(Vec::new()),
        });
        assert_eq!(message.sources, Some(Vec::new()));
    }
}
