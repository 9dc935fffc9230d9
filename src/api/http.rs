//! HTTP implementation of the chat transport
//!
//! Talks to the platform's REST API (`/api/chat/...`, `/api/users`)
//! using `reqwest`. Status codes are mapped to error variants here so
//! the core never inspects HTTP details: 401/403 become `Unauthorized`,
//! a conflict on conversation creation becomes `ConversationConflict`,
//! and everything else non-2xx becomes `Transport`.

use crate::config::ApiConfig;
use crate::error::{PeerchatError, Result};
use crate::models::{Conversation, Message, NewMessage, UserSummary};

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use std::time::Duration;
use url::Url;

use super::ChatTransport;

/// REST client for the messaging service
///
/// # Examples
///
/// ```no_run
/// use peerchat::api::{ChatTransport, HttpTransport};
/// use peerchat::config::ApiConfig;
///
/// # async fn example() -> peerchat::error::Result<()> {
/// let config = ApiConfig {
///     base_url: "http://localhost:8080".to_string(),
///     timeout_secs: 30,
/// };
/// let transport = HttpTransport::new(&config)?;
/// let candidates = transport.list_candidates("user-1").await?;
/// # Ok(())
/// # }
/// ```
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

/// Request body for `POST /api/chat/conversations`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConversationRequest<'a> {
    participant1_id: &'a str,
    participant2_id: &'a str,
}

/// Request body for `PUT /api/chat/messages/{id}`
#[derive(Debug, Serialize)]
struct MessageUpdateRequest<'a> {
    content: &'a str,
}

impl HttpTransport {
    /// Create a new transport from API configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or HTTP client
    /// initialization fails.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| PeerchatError::Config(format!("Invalid API base URL: {}", e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("peerchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                PeerchatError::Transport(format!("Failed to create HTTP client: {}", e))
            })?;

        tracing::info!("Initialized chat transport: base_url={}", base_url);

        Ok(Self { client, base_url })
    }

    /// Join a path onto the base URL
    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| PeerchatError::Transport(format!("Invalid endpoint {}: {}", path, e)).into())
    }

    /// Map a non-success response to an error, preserving the server's
    /// message body when present
    async fn fail_for_status(response: Response) -> PeerchatError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                PeerchatError::Unauthorized(format!("server returned {}", status))
            }
            _ => PeerchatError::Transport(format!("server returned {}: {}", status, body)),
        }
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn find_conversation(
        &self,
        user1_id: &str,
        user2_id: &str,
    ) -> Result<Option<Conversation>> {
        let url = self.endpoint("/api/chat/conversations")?;

        tracing::debug!("Looking up conversation for ({}, {})", user1_id, user2_id);
        let response = self
            .client
            .get(url)
            .query(&[("user1Id", user1_id), ("user2Id", user2_id)])
            .send()
            .await
            .map_err(|e| PeerchatError::Transport(format!("Lookup request failed: {}", e)))?;

        // The service answers an unknown pair with 404 or an empty body.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::fail_for_status(response).await.into());
        }

        let body = response.text().await?;
        if body.trim().is_empty() || body.trim() == "null" {
            return Ok(None);
        }
        let conversation: Conversation = serde_json::from_str(&body)
            .map_err(|e| PeerchatError::Transport(format!("Malformed conversation body: {}", e)))?;
        Ok(Some(conversation))
    }

    async fn create_conversation(&self, user1_id: &str, user2_id: &str) -> Result<Conversation> {
        let url = self.endpoint("/api/chat/conversations")?;

        tracing::debug!("Creating conversation for ({}, {})", user1_id, user2_id);
        let response = self
            .client
            .post(url)
            .json(&ConversationRequest {
                participant1_id: user1_id,
                participant2_id: user2_id,
            })
            .send()
            .await
            .map_err(|e| PeerchatError::Transport(format!("Create request failed: {}", e)))?;

        if response.status() == StatusCode::CONFLICT {
            return Err(PeerchatError::ConversationConflict.into());
        }
        if !response.status().is_success() {
            return Err(Self::fail_for_status(response).await.into());
        }

        Ok(response.json::<Conversation>().await?)
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let url = self.endpoint(&format!("/api/chat/messages/conversation/{}", conversation_id))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PeerchatError::Transport(format!("History request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::fail_for_status(response).await.into());
        }

        Ok(response.json::<Vec<Message>>().await?)
    }

    async fn send_message(&self, message: NewMessage) -> Result<Message> {
        let url = self.endpoint("/api/chat/messages")?;

        tracing::debug!(
            "Sending message in conversation {}",
            message.conversation_id
        );
        let response = self
            .client
            .post(url)
            .json(&message)
            .send()
            .await
            .map_err(|e| PeerchatError::Transport(format!("Send request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::fail_for_status(response).await.into());
        }

        Ok(response.json::<Message>().await?)
    }

    async fn update_message(&self, message_id: &str, content: &str) -> Result<Message> {
        let url = self.endpoint(&format!("/api/chat/messages/{}", message_id))?;

        let response = self
            .client
            .put(url)
            .json(&MessageUpdateRequest { content })
            .send()
            .await
            .map_err(|e| PeerchatError::Transport(format!("Update request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::fail_for_status(response).await.into());
        }

        Ok(response.json::<Message>().await?)
    }

    async fn delete_message(&self, message_id: &str) -> Result<()> {
        let url = self.endpoint(&format!("/api/chat/messages/{}", message_id))?;

        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|e| PeerchatError::Transport(format!("Delete request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::fail_for_status(response).await.into());
        }

        Ok(())
    }

    async fn list_candidates(&self, excluding_user_id: &str) -> Result<Vec<UserSummary>> {
        let url = self.endpoint("/api/users")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PeerchatError::Directory(format!("Directory request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::fail_for_status(response).await.into());
        }

        // The directory returns every user; the current user is filtered
        // out client-side, matching the service contract.
        let users = response.json::<Vec<UserSummary>>().await?;
        Ok(users
            .into_iter()
            .filter(|u| u.id != excluding_user_id)
            .collect())
    }

    async fn unread_messages(&self, user_id: &str) -> Result<Vec<Message>> {
        let url = self.endpoint(&format!("/api/chat/messages/unread/{}", user_id))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PeerchatError::Transport(format!("Unread request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::fail_for_status(response).await.into());
        }

        Ok(response.json::<Vec<Message>>().await?)
    }

    async fn mark_read(&self, message_ids: &[String]) -> Result<()> {
        let url = self.endpoint("/api/chat/messages/mark-read")?;

        let response = self
            .client
            .put(url)
            .json(&message_ids)
            .send()
            .await
            .map_err(|e| PeerchatError::Transport(format!("Mark-read request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::fail_for_status(response).await.into());
        }

        Ok(())
    }
}
