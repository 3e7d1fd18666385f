use crate::{feed::FeedName, mutation::MutationAction};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// All errors generated in `dashboard-sync`.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize, Error)]
pub enum SyncError {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("remote rejected request: {}", message.as_deref().unwrap_or("no message"))]
    RemoteRejected { message: Option<String> },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl SyncError {
    /// Human readable message supplied by the backend, if it sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            SyncError::RemoteRejected { message } => message.as_deref(),
            SyncError::Transport(TransportError::Status { message, .. }) => message.as_deref(),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, SyncError::Transport(_))
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, SyncError::RemoteRejected { .. })
    }
}

/// Failures below the JSON envelope: the request never produced a usable body.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP {status}: {}", message.as_deref().unwrap_or("no message"))]
    Status { status: u16, message: Option<String> },

    #[error("malformed response body: {0}")]
    Decode(String),

    #[error("failed to encode request body: {0}")]
    Encode(String),

    #[error("no response within {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            TransportError::Decode(error.to_string())
        } else {
            TransportError::Request(error.to_string())
        }
    }
}

/// Misuse of the synchronizer or invalid settings. Never produced by the backend.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize, Error)]
pub enum ConfigError {
    #[error("feed already registered: {0}")]
    DuplicateFeed(FeedName),

    #[error("feed not registered: {0}")]
    FeedNotRegistered(FeedName),

    #[error("poll interval for {0} must be non-zero")]
    InvalidInterval(FeedName),

    #[error("invalid base url {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: String, value: String },
}

/// A failed [`Mutation`](crate::mutation::Mutation), carrying the message to show the user.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("{message}")]
pub struct MutationFailure {
    pub action: MutationAction,
    pub message: String,
    #[source]
    pub error: SyncError,
}

impl MutationFailure {
    /// Prefers the backend's own message, falling back to a description of the failure kind.
    pub fn new(action: MutationAction, error: SyncError) -> Self {
        let message = match (error.server_message(), &error) {
            (Some(message), _) => message.to_string(),
            (None, SyncError::RemoteRejected { .. }) => format!("Failed to {action}"),
            (None, other) => format!("Error {}: {other}", action.progressive()),
        };

        Self {
            action,
            message,
            error,
        }
    }
}
