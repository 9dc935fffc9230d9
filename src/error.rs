//! Error types for Peerchat
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Peerchat operations
///
/// The first group mirrors the messaging operations: each remote
/// operation that can fail has its own variant so the session
/// controller (and the UI above it) can tell what went wrong and
/// leave prior state intact. The second group covers ambient
/// concerns: configuration, transport plumbing, and serialization.
#[derive(Error, Debug)]
pub enum PeerchatError {
    /// Conversation lookup failed (query for an existing pair)
    #[error("Conversation lookup failed: {0}")]
    LookupFailed(String),

    /// Conversation creation failed
    #[error("Conversation creation failed: {0}")]
    CreateFailed(String),

    /// Message history could not be loaded
    #[error("History load failed: {0}")]
    HistoryLoadFailed(String),

    /// Sending a message failed; nothing was appended locally
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Editing a message failed; content is unchanged
    #[error("Edit failed: {0}")]
    EditFailed(String),

    /// Deleting a message failed; the message remains visible
    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    /// Edit/delete attempted on a message the current user does not own
    ///
    /// Surfaced distinctly from the generic failures so callers can hide
    /// the affordance instead of offering a retry.
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// Conversation already exists for the pair (creation conflict)
    ///
    /// Raised by the transport when the server rejects a create with a
    /// uniqueness conflict; the resolver treats this as "fetch the
    /// existing conversation", never as a user-visible error.
    #[error("Conversation already exists for this pair")]
    ConversationConflict,

    /// Directory (candidate listing) errors
    #[error("Directory error: {0}")]
    Directory(String),

    /// Transport-level errors (unexpected status, malformed body)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl PeerchatError {
    /// Returns true when the error is an ownership violation
    ///
    /// Used by callers that need to decide between "hide the affordance"
    /// and "offer a retry".
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, PeerchatError::Unauthorized(_))
    }
}

/// Result type alias for Peerchat operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
