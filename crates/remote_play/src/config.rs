//! Session configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, SessionError};

/// Default delay before the host is told to refresh after a score submission.
pub const DEFAULT_REFRESH_DELAY_MS: u64 = 500;

/// Message posted to the host page to request a refresh.
pub const DEFAULT_REFRESH_MESSAGE: &str = "refreshPage";

/// Out-of-band channel message announcing a submitted score.
pub const DEFAULT_SCORE_SUBMITTED_SIGNAL: &str = "scoreSubmitted";

/// Configuration for one remote play session.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Relay server address (`host[:port]`).
    pub server_url: String,
    /// Opaque session id shared by the player and its spectators.
    pub session_id: String,
    /// Delay before the refresh notification is posted (milliseconds).
    pub refresh_delay_ms: u64,
    /// Message posted to the host page on refresh.
    pub refresh_message: String,
    /// Inbound text that triggers the refresh notification.
    pub score_submitted_signal: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server_url: "localhost:3005".to_string(),
            session_id: String::new(),
            refresh_delay_ms: DEFAULT_REFRESH_DELAY_MS,
            refresh_message: DEFAULT_REFRESH_MESSAGE.to_string(),
            score_submitted_signal: DEFAULT_SCORE_SUBMITTED_SIGNAL.to_string(),
        }
    }
}

impl SessionConfig {
    /// Create a config for the given server and session id.
    pub fn new(server_url: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            session_id: session_id.into(),
            ..Default::default()
        }
    }

    /// Load a config from JSON text.
    ///
    /// Absent fields take their defaults; the session id is required.
    pub fn from_json(input: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(input).map_err(|e| SessionError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs that cannot identify a session.
    pub fn validate(&self) -> Result<()> {
        if self.session_id.trim().is_empty() {
            return Err(SessionError::Config("session_id must not be empty".into()));
        }
        if self.server_url.trim().is_empty() {
            return Err(SessionError::Config("server_url must not be empty".into()));
        }
        Ok(())
    }

    /// WebSocket URL of the relay channel for this session.
    pub fn channel_url(&self) -> String {
        format!("ws://{}?sessionId={}", self.server_url, self.session_id)
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }

    /// Set the refresh delay.
    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the refresh message.
    pub fn with_refresh_message(mut self, message: impl Into<String>) -> Self {
        self.refresh_message = message.into();
        self
    }

    /// Set the score-submitted signal.
    pub fn with_score_submitted_signal(mut self, signal: impl Into<String>) -> Self {
        self.score_submitted_signal = signal.into();
        self
    }
}
