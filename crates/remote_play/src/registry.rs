//! Replication handler registry.
//!
//! Maps each replicated event to the game callback that reproduces it.
//! Simple kinds are keyed by [`EventKind`]; generic listener events are keyed
//! by the `(Target, event name)` pair they were registered on. A later
//! registration for the same key replaces the earlier one.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::event::{EventKind, ListenerInput, PointerInput, Target, Viewport};

/// Callback for animation frames; receives the frame timestamp.
pub type FrameHandler = Arc<dyn Fn(f64) + Send + Sync>;

/// Callback for pointer down/up/move.
pub type PointerHandler = Arc<dyn Fn(&PointerInput) + Send + Sync>;

/// Callback for generic listener events.
pub type ListenerHandler = Arc<dyn Fn(&ListenerInput) + Send + Sync>;

/// Callback for session start and viewport changes.
pub type ViewportHandler = Arc<dyn Fn(Viewport) + Send + Sync>;

/// A registered callback of any shape
#[derive(Clone)]
pub enum Handler {
    Frame(FrameHandler),
    Pointer(PointerHandler),
    Viewport(ViewportHandler),
    Listener(ListenerHandler),
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match self {
            Handler::Frame(_) => "Frame",
            Handler::Pointer(_) => "Pointer",
            Handler::Viewport(_) => "Viewport",
            Handler::Listener(_) => "Listener",
        };
        write!(f, "Handler::{}(..)", shape)
    }
}

/// Registry key
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HandlerKey {
    Kind(EventKind),
    Listener { target: Target, event_name: String },
}

impl HandlerKey {
    pub fn listener(target: Target, event_name: impl Into<String>) -> Self {
        HandlerKey::Listener {
            target,
            event_name: event_name.into(),
        }
    }
}

impl fmt::Display for HandlerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerKey::Kind(kind) => write!(f, "{}", kind),
            HandlerKey::Listener { target, event_name } => {
                write!(f, "{} on {}", event_name, target)
            }
        }
    }
}

/// Replace-on-register handler table
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: FxHashMap<HandlerKey, Handler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the frame handler.
    pub fn register_frame(&mut self, handler: FrameHandler) {
        self.insert(HandlerKey::Kind(EventKind::FrameTick), Handler::Frame(handler));
    }

    /// Register a pointer handler for one pointer kind.
    ///
    /// Returns `false` (and registers nothing) for non-pointer kinds.
    pub fn register_pointer(&mut self, kind: EventKind, handler: PointerHandler) -> bool {
        if !kind.is_pointer() {
            return false;
        }
        self.insert(HandlerKey::Kind(kind), Handler::Pointer(handler));
        true
    }

    /// Register the viewport handler for both session start and viewport changes.
    pub fn register_viewport(&mut self, handler: ViewportHandler) {
        self.insert(
            HandlerKey::Kind(EventKind::SessionStart),
            Handler::Viewport(handler.clone()),
        );
        self.insert(
            HandlerKey::Kind(EventKind::ViewportSet),
            Handler::Viewport(handler),
        );
    }

    /// Register a listener handler for `event_name` on `target`.
    pub fn register_listener(
        &mut self,
        target: Target,
        event_name: impl Into<String>,
        handler: ListenerHandler,
    ) {
        self.insert(
            HandlerKey::listener(target, event_name),
            Handler::Listener(handler),
        );
    }

    fn insert(&mut self, key: HandlerKey, handler: Handler) {
        if self.handlers.insert(key.clone(), handler).is_some() {
            tracing::trace!("replaced replication handler for {}", key);
        }
    }

    /// Handler registered for `key`, if any.
    pub fn get(&self, key: &HandlerKey) -> Option<Handler> {
        self.handlers.get(key).cloned()
    }

    pub fn contains(&self, key: &HandlerKey) -> bool {
        self.handlers.contains_key(key)
    }

    /// Remove the handler for `key`. Returns whether one was registered.
    pub fn unregister(&mut self, key: &HandlerKey) -> bool {
        self.handlers.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}
