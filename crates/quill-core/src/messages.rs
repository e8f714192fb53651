//! Conversation message types.
//!
//! Messages form the conversation history passed to the language model.
//! Three roles: system, user, and assistant. Ordering is insertion order;
//! a message is immutable once appended (ledger-level truncation during
//! compression is the only way content leaves the window).

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Role
// ─────────────────────────────────────────────────────────────────────────────

/// Message role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions.
    System,
    /// User input.
    User,
    /// Model output.
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ConversationMessage
// ─────────────────────────────────────────────────────────────────────────────

/// A single conversation message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    /// Message role.
    pub role: Role,
    /// Content text.
    pub content: String,
    /// Creation timestamp (RFC3339).
    pub timestamp: String,
}

impl ConversationMessage {
    /// Create a message with the current timestamp.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_display() {
        assert_eq!(Role::System.to_string(), "system");
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }

    #[test]
    fn role_serde_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn message_constructors_set_role() {
        assert_eq!(ConversationMessage::system("s").role, Role::System);
        assert_eq!(ConversationMessage::user("u").role, Role::User);
        assert_eq!(ConversationMessage::assistant("a").role, Role::Assistant);
    }

    #[test]
    fn message_timestamp_is_set() {
        let msg = ConversationMessage::user("hello");
        assert!(!msg.timestamp.is_empty());
        assert!(chrono::DateTime::parse_from_rfc3339(&msg.timestamp).is_ok());
    }

    #[test]
    fn message_serde_camel_case() {
        let msg = ConversationMessage::user("hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("\"content\":\"hello\""));
        assert!(json.contains("\"timestamp\""));
    }

    #[test]
    fn message_serde_roundtrip() {
        let msg = ConversationMessage::assistant("done");
        let json = serde_json::to_string(&msg).unwrap();
        let back: ConversationMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
