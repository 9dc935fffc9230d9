//! Wire and domain types for the messaging API
//!
//! These structs mirror the REST service's JSON shapes (camelCase field
//! names) and double as the in-memory domain model. Identifiers are
//! opaque server-assigned strings; timestamps are UTC.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A candidate correspondent from the user directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// Opaque user identifier
    pub id: String,
    /// Human-readable name for display
    #[serde(default)]
    pub display_name: String,
}

/// The unique channel between an unordered pair of participants
///
/// The server guarantees at most one conversation per unordered pair;
/// a conversation is created on first message-intent and never deleted.
/// The struct is immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Server-assigned unique identifier
    pub id: String,
    /// First participant (order carries no meaning)
    pub participant1_id: String,
    /// Second participant (order carries no meaning)
    pub participant2_id: String,
    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Conversation {
    /// Returns true if the given user is one of the two participants
    pub fn involves(&self, user_id: &str) -> bool {
        self.participant1_id == user_id || self.participant2_id == user_id
    }

    /// Returns the participant other than `user_id`, if `user_id` is a member
    ///
    /// # Examples
    ///
    /// ```
    /// use peerchat::models::Conversation;
    ///
    /// let conv = Conversation {
    ///     id: "c1".to_string(),
    ///     participant1_id: "u1".to_string(),
    ///     participant2_id: "u2".to_string(),
    ///     created_at: None,
    /// };
    /// assert_eq!(conv.other_participant("u1"), Some("u2"));
    /// assert_eq!(conv.other_participant("u3"), None);
    /// ```
    pub fn other_participant(&self, user_id: &str) -> Option<&str> {
        if self.participant1_id == user_id {
            Some(&self.participant2_id)
        } else if self.participant2_id == user_id {
            Some(&self.participant1_id)
        } else {
            None
        }
    }
}

/// A single message inside a conversation
///
/// Messages are exclusively owned by their conversation. Within a
/// conversation they are totally ordered by `sent_at`, with ties broken
/// by `id` (see [`crate::store::MessageStore`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Server-assigned unique identifier
    pub id: String,
    /// Owning conversation
    pub conversation_id: String,
    /// Author of the message
    pub sender_id: String,
    /// The other participant
    pub recipient_id: String,
    /// Message text; mutable through edits
    pub content: String,
    /// Creation timestamp, immutable
    pub sent_at: DateTime<Utc>,
    /// Set true on first successful edit, never reset
    #[serde(default)]
    pub is_edited: bool,
    /// Read-receipt timestamp, stamped when the recipient displays it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Sort key implementing the ordering invariant: `sent_at`, ties by id
    pub(crate) fn sort_key(&self) -> (DateTime<Utc>, &str) {
        (self.sent_at, &self.id)
    }
}

/// Request body for sending a new message
///
/// The server assigns `id` and `sentAt`; the returned [`Message`] is the
/// authoritative record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub sender_id: String,
    pub recipient_id: String,
    pub content: String,
    pub conversation_id: String,
}
