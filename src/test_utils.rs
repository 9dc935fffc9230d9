//! Shared test helpers
//!
//! Provides [`FakeTransport`], an in-memory stand-in for the messaging
//! service used by resolver, store, and session unit tests. It mimics
//! the server's contract: pair uniqueness on conversations, assigned
//! ids, monotonically increasing timestamps, and injectable failures
//! per operation.

use crate::api::ChatTransport;
use crate::error::{PeerchatError, Result};
use crate::models::{Conversation, Message, NewMessage, UserSummary};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Mutex;

#[derive(Default)]
struct FakeState {
    users: Vec<UserSummary>,
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
    next_conversation: usize,
    next_message: usize,
    ticks: i64,
    create_calls: usize,
    conflict_pair: Option<(String, String)>,
    fail_find: bool,
    fail_create: bool,
    fail_list: bool,
    fail_send: bool,
    fail_update: bool,
    fail_delete: bool,
    fail_directory: bool,
    fail_mark_read: bool,
    deny_update: bool,
    deny_delete: bool,
}

/// In-memory chat service for tests
pub struct FakeTransport {
    state: Mutex<FakeState>,
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn pair_matches(conv: &Conversation, a: &str, b: &str) -> bool {
    (conv.participant1_id == a && conv.participant2_id == b)
        || (conv.participant1_id == b && conv.participant2_id == a)
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn with_users(users: &[(&str, &str)]) -> Self {
        let transport = Self::new();
        {
            let mut state = transport.state.lock().unwrap();
            state.users = users
                .iter()
                .map(|(id, name)| UserSummary {
                    id: id.to_string(),
                    display_name: name.to_string(),
                })
                .collect();
        }
        transport
    }

    /// Seed an existing conversation, as if created by a previous session
    pub fn seed_conversation(&self, user_a: &str, user_b: &str) -> Conversation {
        let mut state = self.state.lock().unwrap();
        state.next_conversation += 1;
        let conversation = Conversation {
            id: format!("conv-{}", state.next_conversation),
            participant1_id: user_a.to_string(),
            participant2_id: user_b.to_string(),
            created_at: Some(base_time()),
        };
        state.conversations.push(conversation.clone());
        conversation
    }

    /// Seed a message with a server-assigned id and the next timestamp
    pub fn seed_message(
        &self,
        conversation_id: &str,
        sender_id: &str,
        recipient_id: &str,
        content: &str,
    ) -> Message {
        let mut state = self.state.lock().unwrap();
        state.next_message += 1;
        state.ticks += 1;
        let message = Message {
            id: format!("msg-{}", state.next_message),
            conversation_id: conversation_id.to_string(),
            sender_id: sender_id.to_string(),
            recipient_id: recipient_id.to_string(),
            content: content.to_string(),
            sent_at: base_time() + Duration::seconds(state.ticks),
            is_edited: false,
            read_at: None,
        };
        state.messages.push(message.clone());
        message
    }

    /// Simulate another client creating the conversation between our
    /// existence check and our create: the create call for this pair
    /// materializes the conversation, then reports a conflict.
    pub fn inject_conflict_on_create(&self, user_a: &str, user_b: &str) {
        self.state.lock().unwrap().conflict_pair = Some((user_a.to_string(), user_b.to_string()));
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().unwrap().create_calls
    }

    pub fn message_count(&self) -> usize {
        self.state.lock().unwrap().messages.len()
    }

    pub fn fail_find(&self) {
        self.state.lock().unwrap().fail_find = true;
    }

    pub fn fail_create(&self) {
        self.state.lock().unwrap().fail_create = true;
    }

    pub fn fail_list_messages(&self) {
        self.state.lock().unwrap().fail_list = true;
    }

    pub fn restore_list_messages(&self) {
        self.state.lock().unwrap().fail_list = false;
    }

    pub fn fail_send(&self) {
        self.state.lock().unwrap().fail_send = true;
    }

    pub fn fail_update(&self) {
        self.state.lock().unwrap().fail_update = true;
    }

    pub fn fail_delete(&self) {
        self.state.lock().unwrap().fail_delete = true;
    }

    pub fn fail_directory(&self) {
        self.state.lock().unwrap().fail_directory = true;
    }

    pub fn fail_mark_read(&self) {
        self.state.lock().unwrap().fail_mark_read = true;
    }

    /// Make the server reject edits as not-owned (403)
    pub fn deny_update(&self) {
        self.state.lock().unwrap().deny_update = true;
    }

    /// Make the server reject deletes as not-owned (403)
    pub fn deny_delete(&self) {
        self.state.lock().unwrap().deny_delete = true;
    }
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatTransport for FakeTransport {
    async fn find_conversation(
        &self,
        user1_id: &str,
        user2_id: &str,
    ) -> Result<Option<Conversation>> {
        let state = self.state.lock().unwrap();
        if state.fail_find {
            return Err(PeerchatError::Transport("injected find failure".to_string()).into());
        }
        Ok(state
            .conversations
            .iter()
            .find(|c| pair_matches(c, user1_id, user2_id))
            .cloned())
    }

    async fn create_conversation(&self, user1_id: &str, user2_id: &str) -> Result<Conversation> {
        let mut state = self.state.lock().unwrap();
        state.create_calls += 1;
        if state.fail_create {
            return Err(PeerchatError::Transport("injected create failure".to_string()).into());
        }

        let conflicted = state
            .conflict_pair
            .take()
            .map(|(a, b)| {
                (a == user1_id && b == user2_id) || (a == user2_id && b == user1_id)
            })
            .unwrap_or(false);

        if conflicted
            || state
                .conversations
                .iter()
                .any(|c| pair_matches(c, user1_id, user2_id))
        {
            if conflicted {
                // The racing client's record wins; make it visible for
                // the follow-up lookup.
                state.next_conversation += 1;
                let conversation = Conversation {
                    id: format!("conv-{}", state.next_conversation),
                    participant1_id: user2_id.to_string(),
                    participant2_id: user1_id.to_string(),
                    created_at: Some(base_time()),
                };
                state.conversations.push(conversation);
            }
            return Err(PeerchatError::ConversationConflict.into());
        }

        state.next_conversation += 1;
        let conversation = Conversation {
            id: format!("conv-{}", state.next_conversation),
            participant1_id: user1_id.to_string(),
            participant2_id: user2_id.to_string(),
            created_at: Some(base_time()),
        };
        state.conversations.push(conversation.clone());
        Ok(conversation)
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let state = self.state.lock().unwrap();
        if state.fail_list {
            return Err(PeerchatError::Transport("injected list failure".to_string()).into());
        }
        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Ok(messages)
    }

    async fn send_message(&self, message: NewMessage) -> Result<Message> {
        let mut state = self.state.lock().unwrap();
        if state.fail_send {
            return Err(PeerchatError::Transport("injected send failure".to_string()).into());
        }
        state.next_message += 1;
        state.ticks += 1;
        let stored = Message {
            id: format!("msg-{}", state.next_message),
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            recipient_id: message.recipient_id,
            content: message.content,
            sent_at: base_time() + Duration::seconds(state.ticks),
            is_edited: false,
            read_at: None,
        };
        state.messages.push(stored.clone());
        Ok(stored)
    }

    async fn update_message(&self, message_id: &str, content: &str) -> Result<Message> {
        let mut state = self.state.lock().unwrap();
        if state.deny_update {
            return Err(
                PeerchatError::Unauthorized("not the sender of this message".to_string()).into(),
            );
        }
        if state.fail_update {
            return Err(PeerchatError::Transport("injected update failure".to_string()).into());
        }
        let message = state
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| PeerchatError::Transport("message not found".to_string()))?;
        message.content = content.to_string();
        message.is_edited = true;
        Ok(message.clone())
    }

    async fn delete_message(&self, message_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.deny_delete {
            return Err(
                PeerchatError::Unauthorized("not the sender of this message".to_string()).into(),
            );
        }
        if state.fail_delete {
            return Err(PeerchatError::Transport("injected delete failure".to_string()).into());
        }
        state.messages.retain(|m| m.id != message_id);
        Ok(())
    }

    async fn list_candidates(&self, excluding_user_id: &str) -> Result<Vec<UserSummary>> {
        let state = self.state.lock().unwrap();
        if state.fail_directory {
            return Err(PeerchatError::Directory("injected directory failure".to_string()).into());
        }
        Ok(state
            .users
            .iter()
            .filter(|u| u.id != excluding_user_id)
            .cloned()
            .collect())
    }

    async fn unread_messages(&self, user_id: &str) -> Result<Vec<Message>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .messages
            .iter()
            .filter(|m| m.recipient_id == user_id && m.read_at.is_none())
            .cloned()
            .collect())
    }

    async fn mark_read(&self, message_ids: &[String]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_mark_read {
            return Err(PeerchatError::Transport("injected mark-read failure".to_string()).into());
        }
        let now = Utc::now();
        for message in state.messages.iter_mut() {
            if message_ids.contains(&message.id) && message.read_at.is_none() {
                message.read_at = Some(now);
            }
        }
        Ok(())
    }
}
