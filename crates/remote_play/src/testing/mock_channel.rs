//! In-memory channel.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::ChannelError;
use crate::event::Event;
use crate::platform::{Channel, ReadyState};
use crate::wire;

#[derive(Debug, Default)]
struct ChannelState {
    ready_state: ReadyState,
    fail_sends: bool,
    closed: bool,
    sent: Vec<String>,
}

/// A [`Channel`] that keeps every accepted payload.
///
/// Clones share state, so a test can hand one clone to the session and
/// inspect the other.
#[derive(Clone, Debug, Default)]
pub struct MockChannel {
    state: Arc<Mutex<ChannelState>>,
}

impl MockChannel {
    /// A channel still connecting.
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel that is already open.
    pub fn open() -> Self {
        let channel = Self::new();
        channel.set_ready_state(ReadyState::Open);
        channel
    }

    pub fn set_ready_state(&self, ready_state: ReadyState) {
        self.state.lock().ready_state = ready_state;
    }

    /// Make subsequent sends fail (or succeed again).
    pub fn set_fail_sends(&self, fail: bool) {
        self.state.lock().fail_sends = fail;
    }

    /// Raw payloads accepted so far.
    pub fn sent(&self) -> Vec<String> {
        self.state.lock().sent.clone()
    }

    /// Accepted payloads decoded back into events.
    ///
    /// Payloads that fail to decode are skipped.
    pub fn sent_batches(&self) -> Vec<Vec<Event>> {
        self.sent()
            .iter()
            .filter_map(|payload| wire::decode_batch(payload).ok())
            .collect()
    }

    pub fn send_count(&self) -> usize {
        self.state.lock().sent.len()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl Channel for MockChannel {
    fn send(&mut self, payload: String) -> Result<(), ChannelError> {
        let mut state = self.state.lock();
        if !state.ready_state.is_open() {
            return Err(ChannelError::Closed);
        }
        if state.fail_sends {
            return Err(ChannelError::Send("mock send failure".into()));
        }
        state.sent.push(payload);
        Ok(())
    }

    fn ready_state(&self) -> ReadyState {
        self.state.lock().ready_state
    }

    fn close(&mut self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.ready_state = ReadyState::Closed;
    }
}
