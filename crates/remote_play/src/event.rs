//! Captured events and the append-only session log.
//!
//! Every input or timing occurrence observed while playing becomes one
//! [`Event`]: a kind-specific payload plus a session-relative timestamp in
//! milliseconds. Events are never mutated after they reach the [`EventLog`].

use std::fmt;

/// Closed catalogue of replicated event kinds.
///
/// The discriminants are the numeric tags used on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum EventKind {
    /// One animation frame fired.
    FrameTick = 1,
    /// Pointer button pressed.
    PointerDown = 2,
    /// Pointer button released.
    PointerUp = 3,
    /// Pointer moved.
    PointerMove = 4,
    /// Seed of the session's random source.
    RandomSeed = 5,
    /// Viewport resized.
    ViewportSet = 6,
    /// Play session started.
    SessionStart = 7,
    /// Generic listener event (keyboard, focus, ...) on a target.
    Listener = 8,
}

impl EventKind {
    /// All kinds, in tag order.
    pub const ALL: [EventKind; 8] = [
        EventKind::FrameTick,
        EventKind::PointerDown,
        EventKind::PointerUp,
        EventKind::PointerMove,
        EventKind::RandomSeed,
        EventKind::ViewportSet,
        EventKind::SessionStart,
        EventKind::Listener,
    ];

    /// Numeric wire tag.
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Look up a kind by its wire tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.tag() == tag)
    }

    /// Whether the kind carries pointer coordinates.
    pub const fn is_pointer(self) -> bool {
        matches!(
            self,
            EventKind::PointerDown | EventKind::PointerUp | EventKind::PointerMove
        )
    }

    /// Short, stable name used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            EventKind::FrameTick => "frame_tick",
            EventKind::PointerDown => "pointer_down",
            EventKind::PointerUp => "pointer_up",
            EventKind::PointerMove => "pointer_move",
            EventKind::RandomSeed => "random_seed",
            EventKind::ViewportSet => "viewport_set",
            EventKind::SessionStart => "session_start",
            EventKind::Listener => "listener",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stable handle for a UI element.
///
/// Elements are referred to by their identifier string rather than by a
/// live reference, so registrations never dangle when an element goes away.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ElementId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Object a generic listener is attached to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    /// The global window object.
    Window,
    /// An element, by handle.
    Element(ElementId),
}

impl Target {
    /// Target for the element with the given id.
    pub fn element(id: impl Into<ElementId>) -> Self {
        Target::Element(id.into())
    }

    pub fn is_window(&self) -> bool {
        matches!(self, Target::Window)
    }

    /// Element handle, if this target is an element.
    pub fn element_id(&self) -> Option<&ElementId> {
        match self {
            Target::Window => None,
            Target::Element(id) => Some(id),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Window => f.write_str("window"),
            Target::Element(id) => write!(f, "#{}", id),
        }
    }
}

/// Viewport size in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Pointer coordinates as seen by a pointer handler.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerInput {
    pub client_x: f64,
    pub client_y: f64,
}

impl PointerInput {
    pub const fn new(client_x: f64, client_y: f64) -> Self {
        Self { client_x, client_y }
    }
}

/// Event object handed to generic listener handlers.
///
/// On the live side the host fills it from the platform event; on the
/// replicating side it is synthesized from the recorded [`ListenerRecord`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListenerInput {
    /// Element the platform event was dispatched to.
    pub target: Option<Target>,
    /// Key code for keyboard events.
    pub key_code: Option<u32>,
}

impl ListenerInput {
    pub fn new(target: Option<Target>, key_code: Option<u32>) -> Self {
        Self { target, key_code }
    }

    /// Keyboard event with no resolved target.
    pub fn key(key_code: u32) -> Self {
        Self {
            target: None,
            key_code: Some(key_code),
        }
    }
}

/// Recorded form of a generic listener invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct ListenerRecord {
    /// Id of the element the listener was attached to (`None` for window).
    pub object_id: Option<ElementId>,
    /// Whether the listener was attached to the window.
    pub window: bool,
    /// Event name the listener was registered for (e.g. `keydown`).
    pub event_name: String,
    /// Id of the element the platform event targeted.
    pub target_id: Option<ElementId>,
    /// Key code carried by the platform event.
    pub key_code: Option<u32>,
}

impl ListenerRecord {
    /// Build the record for one live invocation of a listener on `object`.
    pub fn capture(object: &Target, event_name: &str, input: &ListenerInput) -> Self {
        Self {
            object_id: object.element_id().cloned(),
            window: object.is_window(),
            event_name: event_name.to_string(),
            target_id: input
                .target
                .as_ref()
                .and_then(|target| target.element_id().cloned()),
            key_code: input.key_code,
        }
    }

    /// Target the listener was attached to, if it can be identified.
    pub fn object(&self) -> Option<Target> {
        if self.window {
            return Some(Target::Window);
        }
        self.object_id.clone().map(Target::Element)
    }
}

/// Kind-specific payload of an event.
#[derive(Clone, Debug, PartialEq)]
pub enum EventData {
    FrameTick,
    PointerDown(PointerInput),
    PointerUp(PointerInput),
    PointerMove(PointerInput),
    RandomSeed { seed: String },
    ViewportSet(Viewport),
    SessionStart(Viewport),
    Listener(ListenerRecord),
}

impl EventData {
    pub fn kind(&self) -> EventKind {
        match self {
            EventData::FrameTick => EventKind::FrameTick,
            EventData::PointerDown(_) => EventKind::PointerDown,
            EventData::PointerUp(_) => EventKind::PointerUp,
            EventData::PointerMove(_) => EventKind::PointerMove,
            EventData::RandomSeed { .. } => EventKind::RandomSeed,
            EventData::ViewportSet(_) => EventKind::ViewportSet,
            EventData::SessionStart(_) => EventKind::SessionStart,
            EventData::Listener(_) => EventKind::Listener,
        }
    }

    /// Pointer payload for a pointer kind.
    pub fn pointer(kind: EventKind, input: PointerInput) -> Option<Self> {
        match kind {
            EventKind::PointerDown => Some(EventData::PointerDown(input)),
            EventKind::PointerUp => Some(EventData::PointerUp(input)),
            EventKind::PointerMove => Some(EventData::PointerMove(input)),
            _ => None,
        }
    }
}

/// A timestamped, immutable record of one input or timing occurrence.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Session-relative milliseconds.
    pub timestamp: f64,
    pub data: EventData,
}

impl Event {
    pub fn new(timestamp: f64, data: EventData) -> Self {
        Self { timestamp, data }
    }

    pub fn kind(&self) -> EventKind {
        self.data.kind()
    }

    /// Whether the timestamp and any coordinates are finite.
    ///
    /// JSON has no NaN or infinity, so non-finite values cannot cross the wire.
    pub fn is_finite(&self) -> bool {
        let coordinates_finite = match &self.data {
            EventData::PointerDown(p) | EventData::PointerUp(p) | EventData::PointerMove(p) => {
                p.client_x.is_finite() && p.client_y.is_finite()
            }
            _ => true,
        };
        self.timestamp.is_finite() && coordinates_finite
    }
}

/// Append-only log of the events captured in one play session.
///
/// The log only hands out shared slices; the single way to drop events is
/// to take or clear the whole log.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event at the end of the log.
    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Truncate the log to empty.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Move every event out, leaving the log empty.
    pub fn take(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(EventKind::FrameTick.tag(), 1);
        assert_eq!(EventKind::Listener.tag(), 8);
        assert_eq!(EventKind::from_tag(0), None);
        assert_eq!(EventKind::from_tag(9), None);
    }

    #[test]
    fn test_pointer_kinds() {
        assert!(EventKind::PointerDown.is_pointer());
        assert!(EventKind::PointerMove.is_pointer());
        assert!(!EventKind::FrameTick.is_pointer());

        let input = PointerInput::new(1.0, 2.0);
        assert_eq!(
            EventData::pointer(EventKind::PointerUp, input),
            Some(EventData::PointerUp(input))
        );
        assert_eq!(EventData::pointer(EventKind::RandomSeed, input), None);
    }

    #[test]
    fn test_listener_record_capture() {
        let input = ListenerInput::new(Some(Target::element("canvas")), Some(32));

        let on_window = ListenerRecord::capture(&Target::Window, "keydown", &input);
        assert!(on_window.window);
        assert_eq!(on_window.object_id, None);
        assert_eq!(on_window.target_id, Some(ElementId::from("canvas")));
        assert_eq!(on_window.key_code, Some(32));
        assert_eq!(on_window.object(), Some(Target::Window));

        let on_button = ListenerRecord::capture(&Target::element("start"), "click", &input);
        assert!(!on_button.window);
        assert_eq!(on_button.object(), Some(Target::element("start")));
    }

    #[test]
    fn test_log_take_and_clear() {
        let mut log = EventLog::new();
        assert!(log.is_empty());

        log.push(Event::new(1.0, EventData::FrameTick));
        log.push(Event::new(2.0, EventData::PointerDown(PointerInput::new(3.0, 4.0))));
        assert_eq!(log.len(), 2);
        assert_eq!(log.events()[1].kind(), EventKind::PointerDown);

        let taken = log.take();
        assert_eq!(taken.len(), 2);
        assert!(log.is_empty());

        log.push(Event::new(3.0, EventData::FrameTick));
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_is_finite() {
        assert!(Event::new(1.0, EventData::PointerUp(PointerInput::new(3.0, 4.0))).is_finite());
        assert!(!Event::new(f64::NAN, EventData::FrameTick).is_finite());
        assert!(!Event::new(
            1.0,
            EventData::PointerMove(PointerInput::new(f64::INFINITY, 0.0))
        )
        .is_finite());
    }
}
