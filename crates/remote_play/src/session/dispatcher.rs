//! Replication dispatcher.
//!
//! Inbound batches are dispatched in channel order and, within a batch, in
//! array order, which reproduces the capture order on the playing side.
//! Events without a registered handler are logged and dropped; the first
//! miss per handler key is logged at warn, repeats at trace.

use super::{Session, SessionState};
use crate::error::{ChannelError, WireError};
use crate::event::{Event, EventData, EventKind, ListenerInput, PointerInput, Target, Viewport};
use crate::mode::Mode;
use crate::random::SeededRandom;
use crate::registry::{
    FrameHandler, Handler, HandlerKey, ListenerHandler, PointerHandler, ViewportHandler,
};
use crate::wire;

/// Why an inbound event was not dispatched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// The session is not replicating.
    NotReplicating,
    /// Nothing is registered for the event's key.
    NoHandler,
    /// The listener's object could not be resolved on this side.
    UnresolvedTarget,
    /// The batch element could not be decoded.
    Malformed,
}

/// What happened to one inbound event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A registered handler ran.
    Handled(EventKind),
    /// The random source was reseeded.
    Reseeded,
    Dropped(DropReason),
}

/// Summary of one dispatched batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub handled: usize,
    pub reseeded: usize,
    pub dropped: usize,
}

impl BatchReport {
    fn add(&mut self, outcome: DispatchOutcome) {
        match outcome {
            DispatchOutcome::Handled(_) => self.handled += 1,
            DispatchOutcome::Reseeded => self.reseeded += 1,
            DispatchOutcome::Dropped(_) => self.dropped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.handled + self.reseeded + self.dropped
    }
}

/// A handler paired with the payload rebuilt from the event.
enum Invocation {
    Frame(FrameHandler, f64),
    Pointer(PointerHandler, PointerInput),
    Viewport(ViewportHandler, Viewport),
    Listener(ListenerHandler, ListenerInput),
}

impl Invocation {
    fn build(handler: Handler, event: &Event, target: Option<Target>) -> Option<Self> {
        match (handler, &event.data) {
            (Handler::Frame(h), EventData::FrameTick) => {
                Some(Invocation::Frame(h, event.timestamp))
            }
            (
                Handler::Pointer(h),
                EventData::PointerDown(p) | EventData::PointerUp(p) | EventData::PointerMove(p),
            ) => Some(Invocation::Pointer(h, *p)),
            (Handler::Viewport(h), EventData::SessionStart(v) | EventData::ViewportSet(v)) => {
                Some(Invocation::Viewport(h, *v))
            }
            (Handler::Listener(h), EventData::Listener(record)) => Some(Invocation::Listener(
                h,
                ListenerInput::new(target, record.key_code),
            )),
            _ => None,
        }
    }

    fn run(self) {
        match self {
            Invocation::Frame(h, timestamp) => h(timestamp),
            Invocation::Pointer(h, input) => h(&input),
            Invocation::Viewport(h, viewport) => h(viewport),
            Invocation::Listener(h, input) => h(&input),
        }
    }
}

impl SessionState {
    fn drop_event(&mut self, reason: DropReason) -> DispatchOutcome {
        self.stats.events_dropped += 1;
        DispatchOutcome::Dropped(reason)
    }

    fn note_missing(&mut self, key: &HandlerKey) {
        if self.warned_missing.insert(key.clone()) {
            tracing::warn!("no replication handler for {}, dropping event", key);
        } else {
            tracing::trace!("no replication handler for {}, dropping event", key);
        }
    }
}

impl Session {
    /// Handle one inbound channel message.
    ///
    /// The configured score-submitted signal asks the host page to refresh
    /// after the configured delay. Anything else is decoded as a batch and
    /// replicated. Errors are logged, never returned.
    pub fn on_message(&self, payload: &str) {
        let config = &self.shared.config;
        if payload == config.score_submitted_signal {
            tracing::info!("score submitted, requesting host refresh");
            self.shared
                .platform
                .notify_host_after(config.refresh_delay(), &config.refresh_message);
            return;
        }

        let mode = self.mode();
        if mode != Mode::Replicating {
            tracing::warn!("ignoring inbound batch while {}", mode);
            return;
        }

        let elements = match wire::decode_events(payload) {
            Ok(elements) => elements,
            Err(e) => {
                tracing::error!("dropping undecodable batch: {}", e);
                return;
            }
        };

        let mut report = BatchReport::default();
        for (index, element) in elements.into_iter().enumerate() {
            let outcome = match element {
                Ok(event) => self.replicate(&event),
                Err(e) => self.drop_malformed(index, &e),
            };
            report.add(outcome);
        }
        tracing::debug!(
            "replicated batch of {}: {} handled, {} reseeded, {} dropped",
            report.total(),
            report.handled,
            report.reseeded,
            report.dropped
        );
    }

    fn drop_malformed(&self, index: usize, error: &WireError) -> DispatchOutcome {
        tracing::error!("dropping malformed batch element {}: {}", index, error);
        self.shared.state.lock().drop_event(DropReason::Malformed)
    }

    /// Log a channel error notification. The session keeps running.
    pub fn on_channel_error(&self, error: ChannelError) {
        tracing::error!("channel error on session {}: {}", self.session_id(), error);
    }

    /// Replicate a decoded batch, in order.
    pub fn replicate_batch(&self, events: &[Event]) -> BatchReport {
        let mut report = BatchReport::default();
        for event in events {
            report.add(self.replicate(event));
        }
        report
    }

    /// Replicate one event.
    ///
    /// A random seed event reseeds the random source; every other kind runs
    /// the handler registered for it with a payload rebuilt from the event.
    pub fn replicate(&self, event: &Event) -> DispatchOutcome {
        // The resolver is host code; it runs before the session lock is taken.
        let key = self.handler_key(event);
        let target = self.listener_target(event);

        let invocation = {
            let mut state = self.shared.state.lock();
            if !state.mode.is_in(Mode::Replicating) {
                return state.drop_event(DropReason::NotReplicating);
            }

            if let EventData::RandomSeed { seed } = &event.data {
                state.random = Some(SeededRandom::new(seed.as_str()));
                state.stats.events_dispatched += 1;
                return DispatchOutcome::Reseeded;
            }

            let Some(key) = key else {
                if let EventData::Listener(record) = &event.data {
                    tracing::warn!(
                        "cannot resolve object of {} listener event (oid {:?})",
                        record.event_name,
                        record.object_id
                    );
                }
                return state.drop_event(DropReason::UnresolvedTarget);
            };

            let invocation = state
                .registry
                .get(&key)
                .and_then(|handler| Invocation::build(handler, event, target));
            match invocation {
                Some(invocation) => {
                    state.stats.events_dispatched += 1;
                    invocation
                }
                None => {
                    state.note_missing(&key);
                    return state.drop_event(DropReason::NoHandler);
                }
            }
        };

        invocation.run();
        DispatchOutcome::Handled(event.kind())
    }

    /// Registry key for an event; `None` when a listener's object cannot be resolved.
    fn handler_key(&self, event: &Event) -> Option<HandlerKey> {
        match &event.data {
            EventData::Listener(record) => {
                let object = if record.window {
                    Target::Window
                } else {
                    let id = record.object_id.as_ref()?;
                    self.shared.resolver.resolve(id)?
                };
                Some(HandlerKey::listener(object, record.event_name.clone()))
            }
            data => Some(HandlerKey::Kind(data.kind())),
        }
    }

    /// Live target of a listener event's platform event, if it resolves.
    fn listener_target(&self, event: &Event) -> Option<Target> {
        let EventData::Listener(record) = &event.data else {
            return None;
        };
        let id = record.target_id.as_ref()?;
        self.shared.resolver.resolve(id)
    }
}
