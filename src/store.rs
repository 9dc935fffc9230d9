//! Client-side message store
//!
//! Holds the ordered message history for one active conversation and
//! applies create/edit/delete deltas. The server is the source of truth:
//! a `load` replaces the list wholesale, while `append` is an optimistic
//! approximation whose placement the next load corrects. The list is
//! kept sorted by `(sent_at, id)` after every mutation; callers must not
//! assume element positions survive a mutation.

use crate::api::ChatTransport;
use crate::error::{PeerchatError, Result};
use crate::models::Message;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Ordered in-memory history for a single conversation
pub struct MessageStore {
    transport: Arc<dyn ChatTransport>,
    conversation_id: Option<String>,
    messages: Vec<Message>,
}

impl MessageStore {
    /// Create an empty store over the given transport
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            conversation_id: None,
            messages: Vec::new(),
        }
    }

    /// The conversation this store currently holds, if any
    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// The ordered message list
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Look up a message by id
    pub fn get(&self, message_id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == message_id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop all held state (used on correspondent re-selection)
    pub fn clear(&mut self) {
        self.conversation_id = None;
        self.messages.clear();
    }

    /// Bind the store to a conversation without fetching
    ///
    /// Used when a conversation was just created: it has no history on
    /// the server, so there is nothing to load, but subsequent appends
    /// must be accepted. Switching to a different conversation drops any
    /// held messages.
    pub fn activate(&mut self, conversation_id: &str) {
        if self.conversation_id.as_deref() != Some(conversation_id) {
            self.conversation_id = Some(conversation_id.to_string());
            self.messages.clear();
        }
    }

    /// Fetch the full history for a conversation and replace the list
    ///
    /// On transport failure the store keeps its previous contents and
    /// conversation; there is no partial overwrite.
    ///
    /// # Errors
    ///
    /// `HistoryLoadFailed` on any transport error.
    pub async fn load(&mut self, conversation_id: &str) -> Result<()> {
        let history = self
            .transport
            .list_messages(conversation_id)
            .await
            .map_err(|e| PeerchatError::HistoryLoadFailed(e.to_string()))?;

        tracing::debug!(
            "Loaded {} messages for conversation {}",
            history.len(),
            conversation_id
        );
        self.conversation_id = Some(conversation_id.to_string());
        self.messages = history;
        self.sort();
        Ok(())
    }

    /// Insert a newly created message
    ///
    /// The message is expected to belong to the active conversation; a
    /// message for any other conversation is a stale completion and is
    /// dropped. The list is re-sorted, so a message whose server
    /// timestamp predates the tail still lands in order.
    pub fn append(&mut self, message: Message) {
        match &self.conversation_id {
            Some(active) if *active == message.conversation_id => {
                self.messages.push(message);
                self.sort();
            }
            _ => {
                tracing::warn!(
                    "Dropping message {} for inactive conversation {}",
                    message.id,
                    message.conversation_id
                );
            }
        }
    }

    /// Replace a message's content and mark it edited
    ///
    /// Returns false (and does nothing) when the id is absent, which
    /// happens when an edit completes after a concurrent delete. The
    /// edited flag is never reset once set.
    pub fn apply_edit(&mut self, message_id: &str, new_content: &str) -> bool {
        let found = self.messages.iter_mut().find(|m| m.id == message_id);
        match found {
            Some(message) => {
                message.content = new_content.to_string();
                message.is_edited = true;
                self.sort();
                true
            }
            None => {
                tracing::debug!("Edit for unknown message {} ignored", message_id);
                false
            }
        }
    }

    /// Remove a message if present; no-op otherwise
    pub fn apply_delete(&mut self, message_id: &str) -> bool {
        let before = self.messages.len();
        self.messages.retain(|m| m.id != message_id);
        let removed = self.messages.len() != before;
        if !removed {
            tracing::debug!("Delete for unknown message {} ignored", message_id);
        }
        removed
    }

    /// Stamp read receipts on the given messages
    ///
    /// Missing ids and already-read messages are skipped.
    pub fn apply_read(&mut self, message_ids: &[String], at: DateTime<Utc>) {
        for message in self.messages.iter_mut() {
            if message.read_at.is_none() && message_ids.contains(&message.id) {
                message.read_at = Some(at);
            }
        }
    }

    fn sort(&mut self) {
        self.messages
            .sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    }
}
