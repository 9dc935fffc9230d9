//! Peerchat - direct messaging client library
//!
//! This library implements the client-side direct-messaging core of the
//! peer learning platform, plus a small CLI front-end that drives it.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `api`: transport boundary (trait + REST implementation)
//! - `resolver`: unordered participant pair -> unique conversation
//! - `store`: ordered in-memory message history with delta application
//! - `session`: per-view controller tying selection, loading, and
//!   send/edit/delete together, with a stale-response guard
//! - `models`: wire/domain types
//! - `config`: configuration loading and validation
//! - `error`: error types and result alias
//! - `cli` / `commands`: command-line front-end
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use peerchat::api::HttpTransport;
//! use peerchat::config::ApiConfig;
//! use peerchat::session::ChatSession;
//!
//! # async fn example() -> peerchat::error::Result<()> {
//! let api = ApiConfig {
//!     base_url: "http://localhost:8080".to_string(),
//!     timeout_secs: 30,
//! };
//! let transport = Arc::new(HttpTransport::new(&api)?);
//! let mut session = ChatSession::new("user-1", transport);
//!
//! let request = session.select_correspondent("user-2")?;
//! session.load_history(&request).await?;
//! session.send_message("hello!").await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod resolver;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use api::{ChatTransport, HttpTransport};
pub use config::Config;
pub use error::{PeerchatError, Result};
pub use models::{Conversation, Message, NewMessage, UserSummary};
pub use resolver::ConversationResolver;
pub use session::{ChatSession, LoadRequest, SessionPhase};
pub use store::MessageStore;

#[cfg(test)]
pub mod test_utils;
