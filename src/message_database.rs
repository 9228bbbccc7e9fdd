//! The message log: the stored `Message` type and the storage contract every
//! backend satisfies.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// A chat message as stored and served.
///
/// Field order is the wire order: `{id, user, text, timestamp}`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(Serialize)]
pub struct Message {
    pub id: u64,
    pub user: String,
    pub text: String,
    pub timestamp: i64, // unix seconds
}

/// A message that passed validation but has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub user: String,
    pub text: String,
    pub timestamp: Option<i64>,
}

impl NewMessage {
    pub fn new(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            text: text.into(),
            timestamp: None,
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

pub type Messages = Vec<Message>;

/// Errors reported by a message store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The persistence call failed: network error, timeout or a non-success
    /// response from the backend.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl StoreError {
    pub fn unavailable(reason: impl std::fmt::Display) -> Self {
        Self::BackendUnavailable(reason.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Ordered, append-only message log.
///
/// Implementations must ensure:
/// - ids are assigned by the store, never taken from the caller
/// - messages are never modified or reordered once appended
/// - `read_all` returns messages in insertion order
/// - a batch is appended entirely or not at all
#[async_trait]
pub trait MessageDatabase: Send + Sync {
    /// Appends a batch of messages to the end of the log, in order.
    ///
    /// Returns the stored messages with their assigned ids.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::BackendUnavailable`] if the backend could not
    /// persist the batch. Nothing from the batch is stored in that case.
    async fn append_all(&self, messages: Vec<NewMessage>) -> StoreResult<Messages>;

    /// Returns every stored message, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::BackendUnavailable`] if the backend could not be
    /// read.
    async fn read_all(&self) -> StoreResult<Messages>;

    /// Appends a single message.
    ///
    /// # Errors
    ///
    /// Same as [`MessageDatabase::append_all`].
    async fn append(&self, message: NewMessage) -> StoreResult<Message> {
        let mut stored = self.append_all(vec![message]).await?;
        stored
            .pop()
            .ok_or_else(|| StoreError::unavailable("backend stored no message"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_serializes_in_wire_shape() {
        let msg = Message {
            id: 3,
            user: "alice".to_string(),
            text: "hi".to_string(),
            timestamp: 1_700_000_000,
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"id": 3, "user": "alice", "text": "hi", "timestamp": 1_700_000_000})
        );
    }

    #[test]
    fn store_error_names_cause() {
        let err = StoreError::unavailable("connection refused");
        assert_eq!(err.to_string(), "backend unavailable: connection refused");
    }
}
