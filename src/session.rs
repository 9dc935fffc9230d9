//! Chat session controller
//!
//! One [`ChatSession`] exists per active chat view. It owns the
//! resolver and message store, tracks which correspondent is selected,
//! and dispatches send/edit/delete against the remote service. All
//! remote failures are recovered here: each sets `last_error` and
//! leaves prior state intact, so the layer above decides whether to
//! retry.
//!
//! History loading is split into `select_correspondent` (which returns
//! a [`LoadRequest`] tagged with the correspondent it was issued for)
//! and `load_history` (which applies it). A request whose tag no longer
//! matches the current selection is discarded at apply time, so a slow
//! load for a previous correspondent can never overwrite the state of
//! the one selected after it.

use crate::api::ChatTransport;
use crate::error::{PeerchatError, Result};
use crate::models::{Conversation, Message, NewMessage, UserSummary};
use crate::resolver::ConversationResolver;
use crate::store::MessageStore;

use chrono::Utc;
use std::sync::Arc;

/// Session state machine
///
/// `Failed` is reachable from any loading transition; send/edit/delete
/// failures do not change the phase, only `last_error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No correspondent selected yet
    Idle,
    /// Correspondent selected, conversation not resolved yet
    CorrespondentSelected,
    /// Conversation resolved, history fetch in flight
    HistoryLoading,
    /// History (possibly empty) is current
    HistoryReady,
    /// A loading transition failed; see `last_error`
    Failed,
}

/// Stale-response guard token
///
/// Issued by [`ChatSession::select_correspondent`] and consumed by
/// [`ChatSession::load_history`]. Carries the correspondent id that was
/// current when the load was requested.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    correspondent_id: String,
}

impl LoadRequest {
    /// The correspondent this load was issued for
    pub fn correspondent_id(&self) -> &str {
        &self.correspondent_id
    }
}

/// Controller for one chat view
///
/// Constructed with the current user's identity and the transport; no
/// ambient globals. Dropped on view teardown.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use peerchat::api::HttpTransport;
/// use peerchat::config::ApiConfig;
/// use peerchat::session::ChatSession;
///
/// # async fn example() -> peerchat::error::Result<()> {
/// let config = ApiConfig {
///     base_url: "http://localhost:8080".to_string(),
///     timeout_secs: 30,
/// };
/// let transport = Arc::new(HttpTransport::new(&config)?);
/// let mut session = ChatSession::new("user-1", transport);
///
/// let request = session.select_correspondent("user-2")?;
/// session.load_history(&request).await?;
/// session.send_message("hello!").await?;
/// # Ok(())
/// # }
/// ```
pub struct ChatSession {
    current_user_id: String,
    transport: Arc<dyn ChatTransport>,
    resolver: ConversationResolver,
    store: MessageStore,
    selected_correspondent: Option<String>,
    active_conversation: Option<Conversation>,
    phase: SessionPhase,
    last_error: Option<PeerchatError>,
}

impl ChatSession {
    /// Create a session for the given user
    pub fn new(current_user_id: impl Into<String>, transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            current_user_id: current_user_id.into(),
            resolver: ConversationResolver::new(transport.clone()),
            store: MessageStore::new(transport.clone()),
            transport,
            selected_correspondent: None,
            active_conversation: None,
            phase: SessionPhase::Idle,
            last_error: None,
        }
    }

    pub fn current_user_id(&self) -> &str {
        &self.current_user_id
    }

    /// The currently selected correspondent, if any
    pub fn correspondent(&self) -> Option<&str> {
        self.selected_correspondent.as_deref()
    }

    /// The resolved conversation for the selection; absent when the
    /// pair has never had contact (or nothing is selected)
    pub fn active_conversation(&self) -> Option<&Conversation> {
        self.active_conversation.as_ref()
    }

    /// The ordered message list for the active conversation
    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// The most recent operation failure, if any
    pub fn last_error(&self) -> Option<&PeerchatError> {
        self.last_error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Record a failure and produce the error to return
    fn fail(&mut self, error: PeerchatError) -> anyhow::Error {
        tracing::warn!("Session operation failed: {}", error);
        let report = anyhow::anyhow!("{}", error);
        self.last_error = Some(error);
        report
    }

    /// Collapse a transport/resolver error into a taxonomy variant,
    /// preserving `Unauthorized` and already-classified errors
    fn classify(error: anyhow::Error, fallback: fn(String) -> PeerchatError) -> PeerchatError {
        match error.downcast::<PeerchatError>() {
            Ok(classified @ PeerchatError::Unauthorized(_)) => classified,
            Ok(PeerchatError::LookupFailed(m)) => PeerchatError::LookupFailed(m),
            Ok(PeerchatError::CreateFailed(m)) => PeerchatError::CreateFailed(m),
            Ok(PeerchatError::HistoryLoadFailed(m)) => PeerchatError::HistoryLoadFailed(m),
            Ok(other) => fallback(other.to_string()),
            Err(other) => fallback(other.to_string()),
        }
    }

    /// List candidate correspondents, excluding the current user
    pub async fn list_candidates(&mut self) -> Result<Vec<UserSummary>> {
        match self.transport.list_candidates(&self.current_user_id).await {
            Ok(users) => Ok(users),
            Err(e) => Err(self.fail(PeerchatError::Directory(e.to_string()))),
        }
    }

    /// Select a correspondent and reset session state
    ///
    /// Clears the prior message list and error, enters
    /// `CorrespondentSelected`, and returns the guard token to pass to
    /// [`load_history`](Self::load_history). Loads issued for any
    /// earlier selection become stale immediately.
    pub fn select_correspondent(&mut self, user_id: &str) -> Result<LoadRequest> {
        if user_id == self.current_user_id {
            return Err(self.fail(PeerchatError::LookupFailed(
                "cannot open a conversation with yourself".to_string(),
            )));
        }

        tracing::info!("Selected correspondent {}", user_id);
        self.selected_correspondent = Some(user_id.to_string());
        self.active_conversation = None;
        self.store.clear();
        self.last_error = None;
        self.phase = SessionPhase::CorrespondentSelected;

        Ok(LoadRequest {
            correspondent_id: user_id.to_string(),
        })
    }

    /// Resolve the conversation for a selection and load its history
    ///
    /// Uses lookup, not find-or-create: selecting someone must not
    /// create a conversation. When none exists the session becomes
    /// `HistoryReady` with an empty list and no history fetch. A stale
    /// request (its correspondent is no longer the selected one) is
    /// discarded without touching state.
    pub async fn load_history(&mut self, request: &LoadRequest) -> Result<()> {
        if !self.is_current(request) {
            tracing::debug!(
                "Discarding stale load for {} (current selection: {:?})",
                request.correspondent_id,
                self.selected_correspondent
            );
            return Ok(());
        }

        let correspondent = request.correspondent_id.clone();
        let conversation = match self
            .resolver
            .lookup(&self.current_user_id, &correspondent)
            .await
        {
            Ok(found) => found,
            Err(e) => {
                self.phase = SessionPhase::Failed;
                return Err(self.fail(Self::classify(e, PeerchatError::LookupFailed)));
            }
        };

        // The selection may have moved on while the lookup was in
        // flight; apply nothing in that case.
        if !self.is_current(request) {
            tracing::debug!("Selection changed during lookup; result discarded");
            return Ok(());
        }

        let Some(conversation) = conversation else {
            // First contact: nothing to load.
            self.active_conversation = None;
            self.phase = SessionPhase::HistoryReady;
            return Ok(());
        };

        self.phase = SessionPhase::HistoryLoading;
        if let Err(e) = self.store.load(&conversation.id).await {
            self.phase = SessionPhase::Failed;
            return Err(self.fail(Self::classify(e, PeerchatError::HistoryLoadFailed)));
        }

        self.active_conversation = Some(conversation);
        self.phase = SessionPhase::HistoryReady;
        Ok(())
    }

    /// Re-resolve and reload history for the current selection
    pub async fn refresh(&mut self) -> Result<()> {
        let Some(correspondent) = self.selected_correspondent.clone() else {
            return Ok(());
        };
        let request = LoadRequest {
            correspondent_id: correspondent,
        };
        self.load_history(&request).await
    }

    /// Send a message to the selected correspondent
    ///
    /// Resolves the conversation with find-or-create when none is
    /// active yet. The message is appended only after the server
    /// confirms it; on failure the list is unchanged and no placeholder
    /// entry is invented.
    pub async fn send_message(&mut self, content: &str) -> Result<Message> {
        let Some(correspondent) = self.selected_correspondent.clone() else {
            return Err(self.fail(PeerchatError::SendFailed(
                "no correspondent selected".to_string(),
            )));
        };
        let content = content.trim();
        if content.is_empty() {
            return Err(self.fail(PeerchatError::SendFailed(
                "message content is empty".to_string(),
            )));
        }

        let conversation_id = match &self.active_conversation {
            Some(conversation) => conversation.id.clone(),
            None => {
                let conversation = match self
                    .resolver
                    .find_or_create(&self.current_user_id, &correspondent)
                    .await
                {
                    Ok(conversation) => conversation,
                    Err(e) => {
                        return Err(self.fail(Self::classify(e, PeerchatError::CreateFailed)))
                    }
                };
                let id = conversation.id.clone();
                self.store.activate(&id);
                self.active_conversation = Some(conversation);
                self.phase = SessionPhase::HistoryReady;
                id
            }
        };

        let outgoing = NewMessage {
            sender_id: self.current_user_id.clone(),
            recipient_id: correspondent,
            content: content.to_string(),
            conversation_id,
        };

        match self.transport.send_message(outgoing).await {
            Ok(message) => {
                self.store.append(message.clone());
                Ok(message)
            }
            Err(e) => Err(self.fail(PeerchatError::SendFailed(e.to_string()))),
        }
    }

    /// True when the current user may edit or delete the message
    ///
    /// Pure affordance gating: the server re-validates ownership on
    /// every edit/delete regardless.
    pub fn can_modify(&self, message_id: &str) -> bool {
        self.store
            .get(message_id)
            .map(|m| m.sender_id == self.current_user_id)
            .unwrap_or(false)
    }

    /// Edit a message's content
    ///
    /// Rejected locally with `Unauthorized` for messages the current
    /// user did not send, without a network call. On success the store
    /// takes the server's returned content; on failure the message is
    /// left as it was.
    pub async fn edit_message(&mut self, message_id: &str, new_content: &str) -> Result<Message> {
        let Some(existing) = self.store.get(message_id) else {
            return Err(self.fail(PeerchatError::EditFailed(format!(
                "unknown message {}",
                message_id
            ))));
        };
        if existing.sender_id != self.current_user_id {
            return Err(self.fail(PeerchatError::Unauthorized(
                "only the sender can edit a message".to_string(),
            )));
        }

        match self.transport.update_message(message_id, new_content).await {
            Ok(updated) => {
                self.store.apply_edit(message_id, &updated.content);
                Ok(updated)
            }
            Err(e) => Err(self.fail(Self::classify(e, PeerchatError::EditFailed))),
        }
    }

    /// Delete a message
    ///
    /// Same ownership gating as [`edit_message`](Self::edit_message).
    /// On failure the message remains visible.
    pub async fn delete_message(&mut self, message_id: &str) -> Result<()> {
        let Some(existing) = self.store.get(message_id) else {
            return Err(self.fail(PeerchatError::DeleteFailed(format!(
                "unknown message {}",
                message_id
            ))));
        };
        if existing.sender_id != self.current_user_id {
            return Err(self.fail(PeerchatError::Unauthorized(
                "only the sender can delete a message".to_string(),
            )));
        }

        match self.transport.delete_message(message_id).await {
            Ok(()) => {
                self.store.apply_delete(message_id);
                Ok(())
            }
            Err(e) => Err(self.fail(Self::classify(e, PeerchatError::DeleteFailed))),
        }
    }

    /// Stamp read receipts on unread incoming messages in the active
    /// history
    ///
    /// Returns how many messages were marked.
    pub async fn mark_displayed(&mut self) -> Result<usize> {
        let unread_ids: Vec<String> = self
            .store
            .messages()
            .iter()
            .filter(|m| m.recipient_id == self.current_user_id && m.read_at.is_none())
            .map(|m| m.id.clone())
            .collect();

        if unread_ids.is_empty() {
            return Ok(0);
        }

        match self.transport.mark_read(&unread_ids).await {
            Ok(()) => {
                self.store.apply_read(&unread_ids, Utc::now());
                Ok(unread_ids.len())
            }
            Err(e) => Err(self.fail(PeerchatError::Transport(e.to_string()))),
        }
    }

    /// All messages addressed to the current user that have no read
    /// receipt yet, across conversations (unread badge)
    pub async fn unread_messages(&mut self) -> Result<Vec<Message>> {
        match self.transport.unread_messages(&self.current_user_id).await {
            Ok(messages) => Ok(messages),
            Err(e) => Err(self.fail(PeerchatError::Transport(e.to_string()))),
        }
    }

    fn is_current(&self, request: &LoadRequest) -> bool {
        self.selected_correspondent.as_deref() == Some(request.correspondent_id.as_str())
    }
}
