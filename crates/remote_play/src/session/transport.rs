//! Transport queue.
//!
//! Once per animation frame the whole log is serialized as one batch and
//! handed to the channel. Nothing is sent while the channel is not open, and
//! the log is cleared only after the channel accepted the batch. There is no
//! acknowledgement or retry.

use super::Session;
use crate::error::{ChannelError, Result, SessionError};
use crate::wire;

/// Result of one transport tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// A batch was handed to the channel.
    Flushed { events: usize, bytes: usize },
    /// The log was empty.
    Empty,
    /// The channel is not open; the log keeps growing.
    NotReady,
    /// No channel attached.
    NotConnected,
    /// Encoding or sending failed; the log is kept.
    Failed,
}

impl Session {
    /// Flush the log to the channel now.
    ///
    /// Returns the number of events sent, `0` when the log was empty. On
    /// error the log is left untouched.
    pub fn flush(&self) -> Result<usize> {
        self.flush_batch().map(|sent| sent.map_or(0, |(events, _)| events))
    }

    /// Per-frame flush; failures are logged and reported as an outcome.
    pub fn transport_tick(&self) -> TickOutcome {
        match self.flush_batch() {
            Ok(Some((events, bytes))) => TickOutcome::Flushed { events, bytes },
            Ok(None) => TickOutcome::Empty,
            Err(SessionError::NotConnected) => TickOutcome::NotConnected,
            Err(SessionError::Channel(ChannelError::Closed)) => TickOutcome::NotReady,
            Err(SessionError::Channel(_)) => TickOutcome::Failed,
            Err(e) => {
                tracing::error!("transport tick failed: {}", e);
                TickOutcome::Failed
            }
        }
    }

    /// Send the whole log as one batch; `(events, bytes)` when something was sent.
    fn flush_batch(&self) -> Result<Option<(usize, usize)>> {
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;

        let Some(channel) = state.channel.as_mut() else {
            return Err(SessionError::NotConnected);
        };
        if !channel.ready_state().is_open() {
            return Err(ChannelError::Closed.into());
        }
        if state.log.is_empty() {
            return Ok(None);
        }

        let payload = wire::encode_batch(state.log.events())?;
        let events = state.log.len();
        let bytes = payload.len();
        if let Err(e) = channel.send(payload) {
            state.stats.send_failures += 1;
            tracing::error!("channel send failed, keeping {} events: {}", events, e);
            return Err(e.into());
        }

        state.log.clear();
        state.stats.batches_sent += 1;
        state.stats.events_sent += events as u64;
        tracing::debug!("flushed {} events ({} bytes)", events, bytes);
        Ok(Some((events, bytes)))
    }

    /// Schedule the self-rescheduling transport tick.
    ///
    /// The scheduled callback only holds a weak reference, so dropping every
    /// session handle ends the loop; so does any later connect or close.
    pub(super) fn schedule_transport(&self, generation: u64) {
        let weak = self.downgrade();
        self.shared
            .platform
            .request_animation_frame(Box::new(move |_timestamp| {
                let Some(session) = Session::upgrade(&weak) else {
                    return;
                };
                if session.shared.state.lock().transport_generation != generation {
                    return;
                }
                session.transport_tick();
                session.schedule_transport(generation);
            }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::event::{EventData, EventKind};
    use crate::platform::ReadyState;
    use crate::testing::{ManualPlatform, MockChannel};
    use std::sync::Arc;

    fn new_session() -> (Arc<ManualPlatform>, Session) {
        let platform = ManualPlatform::new();
        let session = Session::new(SessionConfig::new("localhost:3005", "tx"), platform.clone());
        (platform, session)
    }

    #[test]
    fn test_tick_without_channel() {
        let (_, session) = new_session();
        session.start_play(800, 600);
        assert_eq!(session.transport_tick(), TickOutcome::NotConnected);
        assert_eq!(session.pending_len(), 2);
    }

    #[test]
    fn test_flush_and_clear() {
        let (_, session) = new_session();
        let channel = MockChannel::open();
        session.connect(Box::new(channel.clone()));
        session.start_play(800, 600);
        let before = session.pending_events();

        let outcome = session.transport_tick();
        assert!(matches!(outcome, TickOutcome::Flushed { events: 2, .. }));
        assert_eq!(session.pending_len(), 0);
        assert_eq!(channel.sent_batches(), vec![before]);

        assert_eq!(session.transport_tick(), TickOutcome::Empty);
        assert_eq!(channel.send_count(), 1);

        let stats = session.stats();
        assert_eq!(stats.batches_sent, 1);
        assert_eq!(stats.events_sent, 2);
    }

    #[test]
    fn test_no_flush_when_not_open() {
        let (_, session) = new_session();
        let channel = MockChannel::new();
        session.connect(Box::new(channel.clone()));
        session.start_play(800, 600);

        for i in 0..5 {
            assert_eq!(session.transport_tick(), TickOutcome::NotReady);
            session.send_event(EventData::FrameTick, Some(i as f64));
        }
        assert_eq!(channel.send_count(), 0);
        assert_eq!(session.pending_len(), 7);

        channel.set_ready_state(ReadyState::Open);
        assert!(matches!(
            session.transport_tick(),
            TickOutcome::Flushed { events: 7, .. }
        ));
    }

    #[test]
    fn test_failed_send_keeps_log() {
        let (_, session) = new_session();
        let channel = MockChannel::open();
        channel.set_fail_sends(true);
        session.connect(Box::new(channel.clone()));
        session.start_play(800, 600);

        assert_eq!(session.transport_tick(), TickOutcome::Failed);
        assert_eq!(session.pending_len(), 2);
        assert_eq!(session.stats().send_failures, 1);

        channel.set_fail_sends(false);
        assert!(matches!(
            session.transport_tick(),
            TickOutcome::Flushed { events: 2, .. }
        ));
        assert_eq!(channel.send_count(), 1);
    }

    #[test]
    fn test_tick_runs_every_frame() {
        let (platform, session) = new_session();
        let channel = MockChannel::open();
        session.connect(Box::new(channel.clone()));
        session.start_play(800, 600);

        platform.run_frame(16.0);
        assert_eq!(channel.send_count(), 1);
        assert_eq!(platform.pending_frames(), 1);

        session.send_event(EventData::FrameTick, None);
        session.send_event(EventData::FrameTick, None);
        platform.run_frame(32.0);
        assert_eq!(channel.send_count(), 2);
        let batches = channel.sent_batches();
        assert_eq!(batches[1].len(), 2);
        assert!(batches[1].iter().all(|e| e.kind() == EventKind::FrameTick));

        // empty frames send nothing
        platform.run_frame(48.0);
        assert_eq!(channel.send_count(), 2);
    }

    #[test]
    fn test_flush_reports_errors() {
        let (_, session) = new_session();
        session.start_play(800, 600);
        assert!(matches!(session.flush(), Err(SessionError::NotConnected)));

        let channel = MockChannel::new();
        session.connect(Box::new(channel.clone()));
        assert!(matches!(
            session.flush(),
            Err(SessionError::Channel(ChannelError::Closed))
        ));

        channel.set_ready_state(ReadyState::Open);
        channel.set_fail_sends(true);
        assert!(matches!(
            session.flush(),
            Err(SessionError::Channel(ChannelError::Send(_)))
        ));
        assert_eq!(session.pending_len(), 2);

        channel.set_fail_sends(false);
        assert_eq!(session.flush().unwrap(), 2);
        assert_eq!(session.flush().unwrap(), 0);
    }

    #[test]
    fn test_close_stops_ticking() {
        let (platform, session) = new_session();
        session.connect(Box::new(MockChannel::open()));
        assert_eq!(platform.pending_frames(), 1);

        session.close();
        platform.run_frame(16.0);
        assert_eq!(platform.pending_frames(), 0);
    }

    #[test]
    fn test_reconnect_keeps_single_tick_loop() {
        let (platform, session) = new_session();
        session.connect(Box::new(MockChannel::open()));
        session.connect(Box::new(MockChannel::open()));
        assert_eq!(platform.pending_frames(), 2);

        platform.run_frame(16.0);
        assert_eq!(platform.pending_frames(), 1);
    }

    #[test]
    fn test_dropped_session_stops_ticking() {
        let (platform, session) = new_session();
        session.connect(Box::new(MockChannel::open()));
        drop(session);

        platform.run_frame(16.0);
        assert_eq!(platform.pending_frames(), 0);
    }
}
