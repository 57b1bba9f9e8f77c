//! Remote Play
//!
//! Event capture and replication for remotely spectated browser-style games:
//!
//! - **Capture**: while playing, every frame, pointer, viewport and listener
//!   input is appended to a timestamped event log before the game sees it
//! - **Transport**: once per animation frame the log is flushed to the relay
//!   channel as one JSON batch
//! - **Replication**: a spectating session feeds inbound batches to the same
//!   game callbacks, in order, reproducing the play
//! - **Deterministic random**: both sides draw from a generator rebuilt from
//!   the recorded seed
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use parking_lot::Mutex;
//! use remote_play::testing::{ManualPlatform, MockChannel};
//! use remote_play::{PointerInput, Session, SessionConfig};
//!
//! // Player side
//! let platform = ManualPlatform::new();
//! let player = Session::new(SessionConfig::new("localhost:3005", "demo"), platform.clone());
//! let channel = MockChannel::open();
//! player.connect(Box::new(channel.clone()));
//! player.start_play(800, 600);
//!
//! let click = player.on_pointer_down(|_| {}).into_live().unwrap();
//! click(&PointerInput::new(10.0, 20.0));
//! platform.run_frame(16.0);
//!
//! // Spectator side
//! let spectator = Session::new(
//!     SessionConfig::new("localhost:3005", "demo"),
//!     ManualPlatform::new(),
//! );
//! spectator.start_replicating();
//! let clicks = Arc::new(Mutex::new(Vec::new()));
//! let sink = clicks.clone();
//! spectator.on_pointer_down(move |input| sink.lock().push(*input));
//!
//! for payload in channel.sent() {
//!     spectator.on_message(&payload);
//! }
//! assert_eq!(*clicks.lock(), vec![PointerInput::new(10.0, 20.0)]);
//! assert_eq!(spectator.random_seed(), player.random_seed());
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod mode;
pub mod platform;
pub mod random;
pub mod registry;
pub mod session;
pub mod testing;
pub mod wire;

pub use config::SessionConfig;
pub use error::{ChannelError, Result, SessionError, WireError};
pub use event::{
    ElementId, Event, EventData, EventKind, EventLog, ListenerInput, ListenerRecord,
    PointerInput, Target, Viewport,
};
pub use mode::{Mode, ModeEvent, ModeMachine};
pub use platform::{Channel, FrameCallback, IdentityResolver, Platform, ReadyState, TargetResolver};
pub use random::SeededRandom;
pub use registry::{Handler, HandlerKey, HandlerRegistry};
pub use session::{
    BatchReport, DispatchOutcome, DropReason, GameInit, Session, SessionStats, TickOutcome, Wiring,
};
