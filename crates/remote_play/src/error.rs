//! Error types

use thiserror::Error;

use crate::event::EventKind;

/// Channel transport errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// Channel is closed or not yet open
    #[error("Channel is not open")]
    Closed,

    /// A send was rejected by the transport
    #[error("Channel send failed: {0}")]
    Send(String),

    /// Error notification from the transport
    #[error("Channel transport error: {0}")]
    Transport(String),
}

/// Batch encoding and decoding errors
#[derive(Error, Debug)]
pub enum WireError {
    /// Malformed JSON or wrong field types
    #[error("Invalid batch JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Numeric kind tag outside the event catalogue
    #[error("Unknown event kind tag: {0}")]
    UnknownKind(u8),

    /// A field required by the event kind is absent
    #[error("Event {kind} is missing field `{field}`")]
    MissingField {
        kind: EventKind,
        field: &'static str,
    },

    /// A field is present but holds the wrong shape for the event kind
    #[error("Event {kind} has invalid field `{field}`")]
    InvalidField {
        kind: EventKind,
        field: &'static str,
    },
}

/// Session-level errors
#[derive(Error, Debug)]
pub enum SessionError {
    /// The random source was used before it was seeded
    #[error("Random source used before it was seeded")]
    RandomUninitialized,

    /// The session has no channel attached
    #[error("Session is not connected")]
    NotConnected,

    /// Invalid session configuration
    #[error("Invalid session configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Wire(#[from] WireError),
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
