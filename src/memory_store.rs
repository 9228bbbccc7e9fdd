//! Process-local message log. Nothing survives a restart.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};

use crate::assign::Assigner;
use crate::message_database::{MessageDatabase, Messages, NewMessage, StoreResult};

#[derive(Debug, Default)]
struct MessageLog {
    messages: Messages,
    last_id: u64,
}

/// In-memory implementation of [`MessageDatabase`].
///
/// The message list and the id counter live behind one lock, so assigning
/// ids and appending is a single step for concurrent callers.
#[derive(Debug)]
pub struct InMemoryMessageDatabase<C = DefaultClock> {
    assigner: Assigner<C>,
    mlock: Mutex<MessageLog>,
}

impl InMemoryMessageDatabase<DefaultClock> {
    pub fn new() -> Self {
        Self::with_clock(DefaultClock)
    }
}

impl Default for InMemoryMessageDatabase<DefaultClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> InMemoryMessageDatabase<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            assigner: Assigner::with_clock(clock),
            mlock: Mutex::new(MessageLog::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.log().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding the lock cannot leave the log half-written:
    // the id counter is only bumped after the push succeeds.
    fn log(&self) -> MutexGuard<'_, MessageLog> {
        self.mlock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<C> MessageDatabase for InMemoryMessageDatabase<C>
where
    C: Clock + Send + Sync,
{
    async fn append_all(&self, messages: Vec<NewMessage>) -> StoreResult<Messages> {
        let mut log = self.log();
        let mut added = Vec::with_capacity(messages.len());
        for input in messages {
            let msg = self.assigner.assign(input, log.last_id);
            log.messages.push(msg.clone());
            log.last_id = msg.id;
            added.push(msg);
        }
        Ok(added)
    }

    async fn read_all(&self) -> StoreResult<Messages> {
        Ok(self.log().messages.clone())
    }
}
