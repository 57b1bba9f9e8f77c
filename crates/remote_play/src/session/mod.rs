//! Remote play session.
//!
//! A [`Session`] is a cheap, cloneable handle to one play or replication
//! instance. It owns the mode machine, the event log, the random source,
//! the handler registry and the channel, all behind a single mutex. The lock
//! is never held while game code runs, so handlers may call back into the
//! session.
//!
//! The session is split by concern:
//! - `recorder` - capture wrappers and `send_event` (Playing side)
//! - `transport` - the per-frame flush of the log to the channel
//! - `dispatcher` - inbound batches to registered handlers (Replicating side)

mod dispatcher;
mod recorder;
mod transport;

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::event::{Event, EventData, EventLog, Viewport};
use crate::mode::{Mode, ModeEvent, ModeMachine};
use crate::platform::{Channel, IdentityResolver, Platform, TargetResolver};
use crate::random::SeededRandom;
use crate::registry::{HandlerKey, HandlerRegistry};

pub use dispatcher::{BatchReport, DispatchOutcome, DropReason};
pub use recorder::Wiring;
pub use transport::TickOutcome;

/// Callback run once the session is connected and the game may start.
pub type GameInit = Arc<dyn Fn() + Send + Sync>;

/// Counters describing session activity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Events appended to the log.
    pub events_captured: u64,
    /// Events refused at capture because they cannot be encoded.
    pub events_rejected: u64,
    /// Batches handed to the channel.
    pub batches_sent: u64,
    /// Events contained in those batches.
    pub events_sent: u64,
    /// Sends the channel rejected.
    pub send_failures: u64,
    /// Inbound events that reached a handler or reseeded the random source.
    pub events_dispatched: u64,
    /// Inbound events dropped.
    pub events_dropped: u64,
}

struct SessionState {
    mode: ModeMachine,
    log: EventLog,
    random: Option<SeededRandom>,
    registry: HandlerRegistry,
    channel: Option<Box<dyn Channel>>,
    /// Bumped on every connect/close; stale transport ticks stop rescheduling.
    transport_generation: u64,
    game_init: Option<GameInit>,
    stats: SessionStats,
    warned_missing: FxHashSet<HandlerKey>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            mode: ModeMachine::new(),
            log: EventLog::new(),
            random: None,
            registry: HandlerRegistry::new(),
            channel: None,
            transport_generation: 0,
            game_init: None,
            stats: SessionStats::default(),
            warned_missing: FxHashSet::default(),
        }
    }

    /// Append an event if capture is active and the event can be encoded.
    fn record(&mut self, event: Event) -> bool {
        if !self.mode.is_in(Mode::Playing) {
            return false;
        }
        if !event.is_finite() {
            tracing::warn!("not recording {} event with non-finite values", event.kind());
            self.stats.events_rejected += 1;
            return false;
        }
        self.log.push(event);
        self.stats.events_captured += 1;
        true
    }

    /// Seed the random source. A generated seed is recorded so the
    /// replicating side can rebuild the same generator.
    fn seed_random(&mut self, seed: Option<&str>, now: f64) {
        match seed {
            Some(seed) => {
                self.random = Some(SeededRandom::new(seed));
            }
            None => {
                let random = SeededRandom::generate();
                self.record(Event::new(
                    now,
                    EventData::RandomSeed {
                        seed: random.seed().to_string(),
                    },
                ));
                self.random = Some(random);
            }
        }
    }
}

struct Shared {
    config: SessionConfig,
    platform: Arc<dyn Platform>,
    resolver: Arc<dyn TargetResolver>,
    state: Mutex<SessionState>,
}

/// Handle to one remote play session.
#[derive(Clone)]
pub struct Session {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.shared.config.session_id)
            .field("mode", &self.mode())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create an idle, unconnected session.
    pub fn new(config: SessionConfig, platform: Arc<dyn Platform>) -> Self {
        Self::with_resolver(config, platform, Arc::new(IdentityResolver))
    }

    /// Create a session with a custom element resolver.
    pub fn with_resolver(
        config: SessionConfig,
        platform: Arc<dyn Platform>,
        resolver: Arc<dyn TargetResolver>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                platform,
                resolver,
                state: Mutex::new(SessionState::new()),
            }),
        }
    }

    fn downgrade(&self) -> Weak<Shared> {
        Arc::downgrade(&self.shared)
    }

    fn upgrade(weak: &Weak<Shared>) -> Option<Self> {
        weak.upgrade().map(|shared| Self { shared })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    pub fn session_id(&self) -> &str {
        &self.shared.config.session_id
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.shared.state.lock().mode.current()
    }

    /// Mode transitions taken so far.
    pub fn mode_history(&self) -> Vec<(Mode, ModeEvent, Mode)> {
        self.shared.state.lock().mode.history().to_vec()
    }

    /// Whether a channel is attached.
    pub fn is_connected(&self) -> bool {
        self.shared.state.lock().channel.is_some()
    }

    pub fn stats(&self) -> SessionStats {
        self.shared.state.lock().stats
    }

    /// Copy of the events waiting to be flushed.
    pub fn pending_events(&self) -> Vec<Event> {
        self.shared.state.lock().log.events().to_vec()
    }

    pub fn pending_len(&self) -> usize {
        self.shared.state.lock().log.len()
    }

    /// Attach the channel and start the transport tick.
    ///
    /// Runs the game-init callback, if one was registered. Connecting again
    /// closes the previous channel.
    pub fn connect(&self, channel: Box<dyn Channel>) {
        let (previous, generation, game_init) = {
            let mut state = self.shared.state.lock();
            state.transport_generation += 1;
            let previous = state.channel.replace(channel);
            (previous, state.transport_generation, state.game_init.clone())
        };

        if let Some(mut previous) = previous {
            previous.close();
        }

        tracing::info!(
            "remote play session {} connecting to {}",
            self.session_id(),
            self.shared.config.channel_url()
        );

        self.schedule_transport(generation);

        if let Some(init) = game_init {
            tracing::debug!("calling game init function");
            init();
        }
    }

    /// Register the game-init callback.
    ///
    /// Runs immediately when the session is already connected.
    pub fn init_game<F>(&self, init: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let init: GameInit = Arc::new(init);
        let connected = {
            let mut state = self.shared.state.lock();
            state.game_init = Some(init.clone());
            state.channel.is_some()
        };
        if connected {
            tracing::debug!("calling game init function");
            init();
        }
    }

    /// Tear the session down: stop capture, discard unsent events, close the
    /// channel and stop the transport tick.
    pub fn close(&self) {
        let channel = {
            let mut state = self.shared.state.lock();
            state.mode.send(ModeEvent::Close);
            let discarded = state.log.len();
            state.log.clear();
            state.transport_generation += 1;
            if discarded > 0 {
                tracing::debug!("discarding {} unsent events", discarded);
            }
            state.channel.take()
        };

        if let Some(mut channel) = channel {
            channel.close();
            tracing::info!("remote play session {} closed", self.session_id());
        }
    }

    /// Begin a play session.
    ///
    /// Records the session start with the viewport size and seeds the random
    /// source with a fresh seed. Does nothing unless the session is idle.
    pub fn start_play(&self, width: u32, height: u32) -> bool {
        let now = self.shared.platform.now();
        let mut state = self.shared.state.lock();
        if !state.mode.send(ModeEvent::StartPlay) {
            return false;
        }
        state.record(Event::new(
            now,
            EventData::SessionStart(Viewport::new(width, height)),
        ));
        state.seed_random(None, now);
        tracing::info!("play started at {}x{}", width, height);
        true
    }

    /// End the play session and clear the log. Does nothing unless playing.
    pub fn stop_play(&self) -> bool {
        let mut state = self.shared.state.lock();
        if !state.mode.send(ModeEvent::StopPlay) {
            return false;
        }
        state.log.clear();
        tracing::info!("play stopped");
        true
    }

    /// Switch to replicating. Must be called once, before any events arrive.
    pub fn start_replicating(&self) -> bool {
        let mut state = self.shared.state.lock();
        let current = state.mode.current();
        if !state.mode.send(ModeEvent::StartReplicating) {
            tracing::warn!("cannot start replicating while {}", current);
            return false;
        }
        tracing::info!("replication started");
        true
    }

    /// Seed the random source.
    ///
    /// Without a seed a fresh one is generated and, while playing, recorded
    /// as a random seed event. With a seed the generator is simply reseeded.
    pub fn init_seed_random(&self, seed: Option<&str>) {
        let now = self.shared.platform.now();
        self.shared.state.lock().seed_random(seed, now);
    }

    /// Seed string of the current random source.
    pub fn random_seed(&self) -> Option<String> {
        let state = self.shared.state.lock();
        state.random.as_ref().map(|random| random.seed().to_string())
    }

    /// Next value in `[0, 1)` from the session's random source.
    pub fn random(&self) -> Result<f64> {
        let mut state = self.shared.state.lock();
        state
            .random
            .as_mut()
            .map(SeededRandom::next_f64)
            .ok_or(SessionError::RandomUninitialized)
    }
}
