//! Transport boundary for the messaging service
//!
//! This module defines the [`ChatTransport`] trait that the resolver,
//! store, and session controller consume, plus the HTTP implementation
//! talking to the platform's REST API. Keeping the boundary behind a
//! trait lets tests substitute an in-memory service.

mod http;

pub use http::HttpTransport;

use crate::error::Result;
use crate::models::{Conversation, Message, NewMessage, UserSummary};
use async_trait::async_trait;

/// Remote service operations consumed by the messaging core
///
/// All methods are request/response; there is no push channel. Failures
/// are transport- or status-level errors — mapping onto the operation
/// taxonomy (`SendFailed`, `HistoryLoadFailed`, ...) happens in the
/// callers, which know which user action was in flight.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Query for an existing conversation between an unordered pair
    ///
    /// Returns `Ok(None)` when the pair has never had contact.
    async fn find_conversation(
        &self,
        user1_id: &str,
        user2_id: &str,
    ) -> Result<Option<Conversation>>;

    /// Create a conversation for a pair
    ///
    /// When the server reports a uniqueness conflict (another client
    /// created the conversation first), implementations must return
    /// [`crate::error::PeerchatError::ConversationConflict`] so callers
    /// can fetch the existing record instead of failing.
    async fn create_conversation(&self, user1_id: &str, user2_id: &str) -> Result<Conversation>;

    /// Fetch the full ordered history of a conversation
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>>;

    /// Send a message; the returned record carries the server-assigned
    /// id and timestamp
    async fn send_message(&self, message: NewMessage) -> Result<Message>;

    /// Replace the content of an existing message
    async fn update_message(&self, message_id: &str, content: &str) -> Result<Message>;

    /// Delete a message
    async fn delete_message(&self, message_id: &str) -> Result<()>;

    /// List candidate correspondents, excluding the given user
    async fn list_candidates(&self, excluding_user_id: &str) -> Result<Vec<UserSummary>>;

    /// Fetch messages addressed to the user that have no read receipt yet
    async fn unread_messages(&self, user_id: &str) -> Result<Vec<Message>>;

    /// Stamp read receipts on the given messages
    async fn mark_read(&self, message_ids: &[String]) -> Result<()>;
}
