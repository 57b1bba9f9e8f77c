//! Session mode state machine
//!
//! ```text
//!            start_play              start_replicating
//!   Playing <----------- Idle ------------------------> Replicating
//!           ----------->
//!            stop_play / close
//! ```
//!
//! There is no way out of Replicating and no direct Playing -> Replicating
//! edge: a process is either a player or a spectator for its lifetime.

use std::fmt;

/// Which side of a session this process is acting as.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Nothing is captured or replicated.
    #[default]
    Idle,
    /// Live input is captured and streamed.
    Playing,
    /// Inbound events drive the registered handlers.
    Replicating,
}

impl Mode {
    pub const fn name(self) -> &'static str {
        match self {
            Mode::Idle => "idle",
            Mode::Playing => "playing",
            Mode::Replicating => "replicating",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Input that may move the mode machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeEvent {
    StartPlay,
    StopPlay,
    StartReplicating,
    Close,
}

/// Guarded mode transitions with a transition history
#[derive(Debug, Default)]
pub struct ModeMachine {
    current: Mode,
    /// History of state transitions (for debugging)
    history: Vec<(Mode, ModeEvent, Mode)>,
}

impl ModeMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current mode
    pub fn current(&self) -> Mode {
        self.current
    }

    /// Check if we're in a specific mode
    pub fn is_in(&self, mode: Mode) -> bool {
        self.current == mode
    }

    pub fn history(&self) -> &[(Mode, ModeEvent, Mode)] {
        &self.history
    }

    /// Target mode for an event from the current mode, if the edge exists
    pub fn target(&self, event: ModeEvent) -> Option<Mode> {
        match (self.current, event) {
            (Mode::Idle, ModeEvent::StartPlay) => Some(Mode::Playing),
            (Mode::Playing, ModeEvent::StopPlay) => Some(Mode::Idle),
            (Mode::Idle, ModeEvent::StartReplicating) => Some(Mode::Replicating),
            // Re-entering is harmless; callers are told to do it once
            (Mode::Replicating, ModeEvent::StartReplicating) => Some(Mode::Replicating),
            (Mode::Playing, ModeEvent::Close) => Some(Mode::Idle),
            _ => None,
        }
    }

    /// Send an event, returning whether a transition happened
    pub fn send(&mut self, event: ModeEvent) -> bool {
        let Some(next) = self.target(event) else {
            tracing::trace!("mode {} ignores {:?}", self.current, event);
            return false;
        };
        let previous = self.current;
        self.current = next;
        self.history.push((previous, event, next));
        tracing::debug!("mode {} -> {} on {:?}", previous, next, event);
        true
    }
}
