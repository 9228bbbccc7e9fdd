//! Message log kept in a named list of a remote key-value store.
//!
//! Each message is stored as a JSON string `{user, text, timestamp}`. The id
//! is not stored: it is the message's 1-based position in the list, which the
//! backend reports back as the list length after each append.

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assign::Assigner;
use crate::message_database::{
    Message, MessageDatabase, Messages, NewMessage, StoreError, StoreResult,
};

/// Errors from a key-value list backend.
#[derive(Debug, Error)]
pub enum KvError {
    /// The request never got a response: connection failure or timeout.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success HTTP status.
    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The backend rejected the command.
    #[error("backend error: {0}")]
    Command(String),

    /// The response did not have the expected shape.
    #[error("unexpected response: {0}")]
    Response(String),
}

impl From<KvError> for StoreError {
    fn from(err: KvError) -> Self {
        StoreError::unavailable(err)
    }
}

/// The two list primitives the remote store needs.
///
/// `push` must append all `values` in one atomic call.
#[async_trait]
pub trait KeyValueList: Send + Sync {
    /// Appends `values` to the end of the list at `key` and returns the list
    /// length afterwards.
    async fn push(&self, key: &str, values: &[String]) -> Result<u64, KvError>;

    /// Returns the whole list at `key`, oldest first.
    async fn range_all(&self, key: &str) -> Result<Vec<String>, KvError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    user: String,
    text: String,
    timestamp: i64,
}

/// [`MessageDatabase`] backed by a [`KeyValueList`].
///
/// Reads that fail are reported as [`StoreError::BackendUnavailable`]; they
/// never degrade to an empty list. List elements that do not decode are
/// skipped with a warning and do not shift the ids of the others.
pub struct RemoteMessageDatabase<K, C = DefaultClock> {
    client: K,
    key: String,
    assigner: Assigner<C>,
}

impl<K: KeyValueList> RemoteMessageDatabase<K, DefaultClock> {
    pub fn new(client: K, key: impl Into<String>) -> Self {
        Self::with_clock(client, key, DefaultClock)
    }
}

impl<K: KeyValueList, C: Clock> RemoteMessageDatabase<K, C> {
    pub fn with_clock(client: K, key: impl Into<String>, clock: C) -> Self {
        Self {
            client,
            key: key.into(),
            assigner: Assigner::with_clock(clock),
        }
    }
}

#[async_trait]
impl<K, C> MessageDatabase for RemoteMessageDatabase<K, C>
where
    K: KeyValueList,
    C: Clock + Send + Sync,
{
    async fn append_all(&self, messages: Vec<NewMessage>) -> StoreResult<Messages> {
        if messages.is_empty() {
            return Ok(Vec::new());
        }

        let stamped: Vec<NewMessage> = messages
            .into_iter()
            .map(|m| self.assigner.stamp(m))
            .collect();
        let encoded = stamped
            .iter()
            .map(|m| {
                serde_json::to_string(&StoredRecord {
                    user: m.user.clone(),
                    text: m.text.clone(),
                    timestamp: m.timestamp.unwrap_or_default(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::unavailable)?;

        let len = self.client.push(&self.key, &encoded).await?;
        let count = stamped.len() as u64;
        if len < count {
            return Err(StoreError::unavailable(format!(
                "list length {len} after pushing {count} messages"
            )));
        }

        // ids of the pushed batch are len-count+1 ..= len
        let last_before = len - count;
        Ok(stamped
            .into_iter()
            .zip(last_before..)
            .map(|(m, last_id)| self.assigner.assign(m, last_id))
            .collect())
    }

    async fn read_all(&self) -> StoreResult<Messages> {
        let items = self.client.range_all(&self.key).await?;
        let mut messages = Vec::with_capacity(items.len());
        for (position, raw) in items.iter().enumerate() {
            match serde_json::from_str::<StoredRecord>(raw) {
                Ok(record) => messages.push(Message {
                    id: position as u64 + 1,
                    user: record.user,
                    text: record.text,
                    timestamp: record.timestamp,
                }),
                Err(err) => {
                    log::warn!(
                        "Skipping malformed entry {} in list {}: {err}",
                        position + 1,
                        self.key
                    );
                }
            }
        }
        Ok(messages)
    }
}
