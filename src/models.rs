use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A text file accepted into the active document set.
///
/// Immutable after creation; removed only by an explicit user action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestedDocument {
    pub id: Uuid,
    pub name: String,
    /// Full decoded text, never truncated by ingestion.
    pub content: String,
    /// Declared or guessed media type; may be empty when neither is known.
    pub mime_hint: String,
    pub size_bytes: u64,
}

/// Speaker of a conversation turn.
///
/// Serialized with the Gemini role vocabulary (`user` / `model`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "model")]
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "model",
        }
    }
}

/// A single entry in the conversation log.
///
/// A pending turn is a placeholder awaiting the model's response; it is
/// mutated exactly once, at reconciliation, and never again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub is_pending: bool,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            text: text.into(),
            created_at: Utc::now(),
            is_pending: false,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            text: text.into(),
            created_at: Utc::now(),
            is_pending: false,
        }
    }

    /// Placeholder assistant turn reserved for a forthcoming response.
    pub fn pending() -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            text: String::new(),
            created_at: Utc::now(),
            is_pending: true,
        }
    }
}

/// Role/text pair handed to the model adapter as prior history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub text: String,
}

impl From<&Turn> for HistoryEntry {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role,
            text: turn.text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_with_gemini_vocabulary() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"model\"");
        assert_eq!(Role::Assistant.as_str(), "model");
    }

    #[test]
    fn pending_turn_starts_empty() {
        let turn = Turn::pending();
        assert!(turn.is_pending);
        assert!(turn.text.is_empty());
        assert_eq!(turn.role, Role::Assistant);
    }

    #[test]
    fn history_entry_from_turn_keeps_role_and_text() {
        let turn = Turn::user("What is the refund policy?");
        let entry = HistoryEntry::from(&turn);
        assert_eq!(entry.role, Role::User);
        assert_eq!(entry.text, "What is the refund policy?");
    }
}
