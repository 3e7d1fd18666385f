use crate::{error::SyncError, feed::FeedName};
use chrono::{DateTime, Utc};
use derive_more::{Constructor, Display};
use serde::Serialize;

/// Everything the host UI may want to react to, broadcast by the
/// [`Synchronizer`](crate::Synchronizer).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    FeedUpdated {
        feed: FeedName,
        time: DateTime<Utc>,
    },
    FeedFailed {
        feed: FeedName,
        error: SyncError,
    },
    Notification(Notification),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    #[display("success")]
    Success,
    #[display("error")]
    Error,
}

/// User-facing message, the toast the dashboard shows after a form submission.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Constructor)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message.into())
    }
}
