//! Capture wrappers.
//!
//! Every input source the game listens to goes through one of these entry
//! points. While playing, the game's handler is wrapped so that each call
//! first appends an event to the log. While replicating, the handler is
//! stored in the registry instead, to be driven by inbound events.

use std::sync::Arc;

use super::Session;
use crate::event::{
    Event, EventData, EventKind, ListenerInput, ListenerRecord, PointerInput, Target, Viewport,
};
use crate::mode::Mode;
use crate::registry::{HandlerKey, ListenerHandler, PointerHandler};

/// Where a captured handler ended up.
#[derive(Clone)]
pub enum Wiring<H> {
    /// Install this on the live input source.
    Live(H),
    /// Stored for replication; nothing to install.
    Replicated,
}

impl<H> Wiring<H> {
    /// The live handler, if any.
    pub fn into_live(self) -> Option<H> {
        match self {
            Wiring::Live(handler) => Some(handler),
            Wiring::Replicated => None,
        }
    }

    pub fn is_replicated(&self) -> bool {
        matches!(self, Wiring::Replicated)
    }
}

impl<H> std::fmt::Debug for Wiring<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Wiring::Live(_) => f.write_str("Wiring::Live(..)"),
            Wiring::Replicated => f.write_str("Wiring::Replicated"),
        }
    }
}

impl Session {
    /// Append an event to the log if playing.
    ///
    /// The event is stamped with the platform clock when no timestamp is
    /// given. Events with a non-finite timestamp or coordinate are refused.
    /// Returns whether the event was recorded.
    pub fn send_event(&self, data: EventData, timestamp: Option<f64>) -> bool {
        let timestamp = timestamp.unwrap_or_else(|| self.shared.platform.now());
        self.shared.state.lock().record(Event::new(timestamp, data))
    }

    /// Record a viewport change.
    pub fn set_viewport(&self, width: u32, height: u32) -> bool {
        self.send_event(EventData::ViewportSet(Viewport::new(width, height)), None)
    }

    /// Run `handler` on the next animation frame.
    ///
    /// Playing/idle: forwarded to the platform scheduler; when the frame fires
    /// a frame tick with the platform's timestamp is recorded (playing only)
    /// before `handler` runs. Replicating: `handler` becomes the frame
    /// handler and runs for every replicated frame tick.
    pub fn request_animation_frame<F>(&self, handler: F) -> Wiring<()>
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        {
            let mut state = self.shared.state.lock();
            if state.mode.is_in(Mode::Replicating) {
                state.registry.register_frame(Arc::new(handler));
                return Wiring::Replicated;
            }
        }

        let session = self.clone();
        self.shared
            .platform
            .request_animation_frame(Box::new(move |timestamp| {
                session.send_event(EventData::FrameTick, Some(timestamp));
                handler(timestamp);
            }));
        Wiring::Live(())
    }

    /// Capture pointer-down input.
    pub fn on_pointer_down<F>(&self, handler: F) -> Wiring<PointerHandler>
    where
        F: Fn(&PointerInput) + Send + Sync + 'static,
    {
        self.capture_pointer(EventKind::PointerDown, Arc::new(handler))
    }

    /// Capture pointer-up input.
    pub fn on_pointer_up<F>(&self, handler: F) -> Wiring<PointerHandler>
    where
        F: Fn(&PointerInput) + Send + Sync + 'static,
    {
        self.capture_pointer(EventKind::PointerUp, Arc::new(handler))
    }

    /// Capture pointer-move input.
    pub fn on_pointer_move<F>(&self, handler: F) -> Wiring<PointerHandler>
    where
        F: Fn(&PointerInput) + Send + Sync + 'static,
    {
        self.capture_pointer(EventKind::PointerMove, Arc::new(handler))
    }

    fn capture_pointer(&self, kind: EventKind, handler: PointerHandler) -> Wiring<PointerHandler> {
        {
            let mut state = self.shared.state.lock();
            if state.mode.is_in(Mode::Replicating) {
                state.registry.register_pointer(kind, handler);
                return Wiring::Replicated;
            }
        }

        let session = self.clone();
        Wiring::Live(Arc::new(move |input: &PointerInput| {
            if let Some(data) = EventData::pointer(kind, *input) {
                session.send_event(data, None);
            }
            handler(input);
        }))
    }

    /// Capture a generic listener for `event_name` on `target`.
    pub fn add_event_listener<F>(
        &self,
        target: Target,
        event_name: &str,
        handler: F,
    ) -> Wiring<ListenerHandler>
    where
        F: Fn(&ListenerInput) + Send + Sync + 'static,
    {
        {
            let mut state = self.shared.state.lock();
            if state.mode.is_in(Mode::Replicating) {
                state
                    .registry
                    .register_listener(target, event_name, Arc::new(handler));
                return Wiring::Replicated;
            }
        }

        let session = self.clone();
        let event_name = event_name.to_string();
        Wiring::Live(Arc::new(move |input: &ListenerInput| {
            let record = ListenerRecord::capture(&target, &event_name, input);
            session.send_event(EventData::Listener(record), None);
            handler(input);
        }))
    }

    /// Register a handler for replicated session starts and viewport changes.
    ///
    /// Only meaningful while replicating; returns whether it was registered.
    pub fn on_viewport<F>(&self, handler: F) -> bool
    where
        F: Fn(Viewport) + Send + Sync + 'static,
    {
        let mut state = self.shared.state.lock();
        if !state.mode.is_in(Mode::Replicating) {
            return false;
        }
        state.registry.register_viewport(Arc::new(handler));
        true
    }

    /// Remove the replication handler for a simple event kind.
    pub fn unregister(&self, kind: EventKind) -> bool {
        let mut state = self.shared.state.lock();
        state.registry.unregister(&HandlerKey::Kind(kind))
    }

    /// Remove the replication handler for `event_name` on `target`.
    pub fn unregister_listener(&self, target: Target, event_name: &str) -> bool {
        let mut state = self.shared.state.lock();
        state
            .registry
            .unregister(&HandlerKey::listener(target, event_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::event::ElementId;
    use crate::testing::ManualPlatform;
    use parking_lot::Mutex;

    fn new_session() -> (Arc<ManualPlatform>, Session) {
        let platform = ManualPlatform::new();
        let session = Session::new(SessionConfig::new("localhost:3005", "rec"), platform.clone());
        (platform, session)
    }

    #[test]
    fn test_send_event_gated_by_mode() {
        let (_, session) = new_session();
        assert!(!session.send_event(EventData::FrameTick, Some(1.0)));
        assert_eq!(session.pending_len(), 0);

        session.start_play(800, 600);
        assert!(session.send_event(EventData::FrameTick, Some(1.0)));
        assert_eq!(session.pending_len(), 3);

        let (_, spectator) = new_session();
        spectator.start_replicating();
        assert!(!spectator.send_event(EventData::FrameTick, Some(1.0)));
        assert_eq!(spectator.pending_len(), 0);
    }

    #[test]
    fn test_send_event_auto_stamps() {
        let (platform, session) = new_session();
        session.start_play(800, 600);
        platform.set_now(99.0);

        session.set_viewport(1024, 768);
        let events = session.pending_events();
        assert_eq!(
            events[2],
            Event::new(99.0, EventData::ViewportSet(Viewport::new(1024, 768)))
        );
    }

    #[test]
    fn test_pointer_wrapper_records_then_forwards() {
        let (platform, session) = new_session();
        session.start_play(800, 600);
        platform.set_now(40.0);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let wrapped = session
            .on_pointer_down(move |input| sink.lock().push(*input))
            .into_live()
            .unwrap();

        wrapped(&PointerInput::new(10.0, 20.0));

        assert_eq!(*seen.lock(), vec![PointerInput::new(10.0, 20.0)]);
        let events = session.pending_events();
        assert_eq!(
            events.last(),
            Some(&Event::new(
                40.0,
                EventData::PointerDown(PointerInput::new(10.0, 20.0))
            ))
        );
    }

    #[test]
    fn test_non_finite_input_not_recorded() {
        let (platform, session) = new_session();
        session.start_play(800, 600);
        platform.set_now(8.0);

        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        let wrapped = session
            .on_pointer_move(move |_| *counter.lock() += 1)
            .into_live()
            .unwrap();

        wrapped(&PointerInput::new(1.0, 2.0));
        wrapped(&PointerInput::new(f64::NAN, 2.0));
        wrapped(&PointerInput::new(3.0, 4.0));
        assert!(!session.send_event(EventData::FrameTick, Some(f64::INFINITY)));

        assert_eq!(*calls.lock(), 3);
        let moves: Vec<_> = session.pending_events()[2..]
            .iter()
            .map(|event| event.data.clone())
            .collect();
        assert_eq!(
            moves,
            vec![
                EventData::PointerMove(PointerInput::new(1.0, 2.0)),
                EventData::PointerMove(PointerInput::new(3.0, 4.0)),
            ]
        );
        assert_eq!(session.stats().events_rejected, 2);
    }

    #[test]
    fn test_idle_wrappers_are_pass_through() {
        let (_, session) = new_session();
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        let wrapped = session
            .on_pointer_move(move |_| *counter.lock() += 1)
            .into_live()
            .unwrap();

        wrapped(&PointerInput::new(1.0, 1.0));
        assert_eq!(*calls.lock(), 1);
        assert_eq!(session.pending_len(), 0);
    }

    #[test]
    fn test_frame_forwarded_with_platform_timestamp() {
        let (platform, session) = new_session();
        session.start_play(800, 600);

        let frames = Arc::new(Mutex::new(Vec::new()));
        let sink = frames.clone();
        let wiring = session.request_animation_frame(move |ts| sink.lock().push(ts));
        assert!(!wiring.is_replicated());
        assert_eq!(platform.pending_frames(), 1);

        platform.run_frame(16.5);
        assert_eq!(*frames.lock(), vec![16.5]);
        assert_eq!(
            session.pending_events().last(),
            Some(&Event::new(16.5, EventData::FrameTick))
        );
    }

    #[test]
    fn test_idle_frame_still_scheduled() {
        let (platform, session) = new_session();
        let frames = Arc::new(Mutex::new(0));
        let counter = frames.clone();
        session.request_animation_frame(move |_| *counter.lock() += 1);

        platform.run_frame(16.0);
        assert_eq!(*frames.lock(), 1);
        assert_eq!(session.pending_len(), 0);
    }

    #[test]
    fn test_replicating_registers_instead_of_wrapping() {
        let (platform, session) = new_session();
        session.start_replicating();

        assert!(session.on_pointer_up(|_| {}).is_replicated());
        assert!(session
            .add_event_listener(Target::Window, "keydown", |_| {})
            .is_replicated());
        assert!(session.request_animation_frame(|_| {}).is_replicated());
        assert_eq!(platform.pending_frames(), 0);

        assert!(session.unregister(EventKind::PointerUp));
        assert!(!session.unregister(EventKind::PointerUp));
        assert!(session.unregister_listener(Target::Window, "keydown"));
        assert!(session.unregister(EventKind::FrameTick));
    }

    #[test]
    fn test_listener_wrapper_records_target() {
        let (platform, session) = new_session();
        session.start_play(800, 600);
        platform.set_now(5.0);

        let wrapped = session
            .add_event_listener(Target::Window, "keydown", |_| {})
            .into_live()
            .unwrap();
        wrapped(&ListenerInput::new(Some(Target::element("board")), Some(39)));

        let events = session.pending_events();
        let EventData::Listener(record) = &events[2].data else {
            panic!("expected listener event");
        };
        assert!(record.window);
        assert_eq!(record.object_id, None);
        assert_eq!(record.event_name, "keydown");
        assert_eq!(record.target_id, Some(ElementId::from("board")));
        assert_eq!(record.key_code, Some(39));
        assert_eq!(events[2].timestamp, 5.0);
    }

    #[test]
    fn test_on_viewport_only_when_replicating() {
        let (_, session) = new_session();
        assert!(!session.on_viewport(|_| {}));
        session.start_replicating();
        assert!(session.on_viewport(|_| {}));
    }
}
