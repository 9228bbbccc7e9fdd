//! Id and timestamp assignment.
//!
//! Timestamps are Unix seconds, both when the caller supplies one and when
//! the server fills it in.

use mockable::{Clock, DefaultClock};

use crate::message_database::{Message, NewMessage};

/// Turns validated input into a stored [`Message`].
#[derive(Debug, Clone)]
pub struct Assigner<C = DefaultClock> {
    clock: C,
}

impl Assigner<DefaultClock> {
    pub fn new() -> Self {
        Self {
            clock: DefaultClock,
        }
    }
}

impl Default for Assigner<DefaultClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Assigner<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    /// Fixes the timestamp of `input`, reading the clock only if the caller
    /// did not send one.
    pub fn stamp(&self, mut input: NewMessage) -> NewMessage {
        if input.timestamp.is_none() {
            input.timestamp = Some(self.now());
        }
        input
    }

    /// Builds the message that follows `last_id` in the log.
    pub fn assign(&self, input: NewMessage, last_id: u64) -> Message {
        let stamped = self.stamp(input);
        Message {
            id: last_id + 1,
            user: stamped.user,
            text: stamped.text,
            timestamp: stamped.timestamp.unwrap_or_default(),
        }
    }

    pub fn now(&self) -> i64 {
        self.clock.utc().timestamp()
    }
}
