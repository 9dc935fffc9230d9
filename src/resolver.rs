//! Conversation resolution for participant pairs
//!
//! Maps an unordered pair of participants to exactly one conversation,
//! creating it on first contact. The query-then-create sequence is racy
//! when two clients first message each other simultaneously; the server
//! enforces pair uniqueness and answers the loser with a conflict, which
//! the resolver turns into "fetch the existing conversation".

use crate::api::ChatTransport;
use crate::error::{PeerchatError, Result};
use crate::models::Conversation;
use std::sync::Arc;

/// Resolves participant pairs to conversations
pub struct ConversationResolver {
    transport: Arc<dyn ChatTransport>,
}

impl ConversationResolver {
    /// Create a resolver over the given transport
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self { transport }
    }

    /// Query for an existing conversation between the unordered pair
    ///
    /// Returns `Ok(None)` when the pair has never had contact. Never
    /// creates anything. Errors surface as `LookupFailed`; retrying is
    /// the caller's decision.
    pub async fn lookup(&self, user_a: &str, user_b: &str) -> Result<Option<Conversation>> {
        self.transport
            .find_conversation(user_a, user_b)
            .await
            .map_err(|e| PeerchatError::LookupFailed(e.to_string()).into())
    }

    /// Return the conversation for the pair, creating it if none exists
    ///
    /// Repeated calls with the same pair (in either argument order)
    /// always return the same conversation id once one exists. A
    /// creation conflict means another client won the race; the existing
    /// conversation is fetched and returned instead.
    ///
    /// # Errors
    ///
    /// `CreateFailed` when the two users are the same, when creation
    /// fails for a non-conflict reason, or when a conflicted create
    /// cannot be resolved to an existing conversation. `LookupFailed`
    /// when the initial query fails.
    pub async fn find_or_create(&self, user_a: &str, user_b: &str) -> Result<Conversation> {
        if user_a == user_b {
            return Err(PeerchatError::CreateFailed(
                "a user cannot start a conversation with themselves".to_string(),
            )
            .into());
        }

        if let Some(existing) = self.lookup(user_a, user_b).await? {
            return Ok(existing);
        }

        match self.transport.create_conversation(user_a, user_b).await {
            Ok(created) => {
                tracing::info!(
                    "Created conversation {} for ({}, {})",
                    created.id,
                    user_a,
                    user_b
                );
                Ok(created)
            }
            Err(e)
                if matches!(
                    e.downcast_ref::<PeerchatError>(),
                    Some(PeerchatError::ConversationConflict)
                ) =>
            {
                // Lost the first-contact race; the other client's
                // conversation is the one of record.
                tracing::debug!("Create conflict for ({}, {}); re-fetching", user_a, user_b);
                self.lookup(user_a, user_b).await?.ok_or_else(|| {
                    PeerchatError::CreateFailed(
                        "conflict reported but no conversation found".to_string(),
                    )
                    .into()
                })
            }
            Err(e) => Err(PeerchatError::CreateFailed(e.to_string()).into()),
        }
    }
}
