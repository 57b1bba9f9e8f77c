//! Collaborators the session depends on but does not own.
//!
//! - [`Channel`] - the ordered duplex message channel to the relay server
//! - [`Platform`] - frame scheduling, the high-resolution clock and host notifications
//! - [`TargetResolver`] - maps recorded element ids back to live targets

use std::time::Duration;

use crate::error::ChannelError;
use crate::event::{ElementId, Target};

/// Callback run once before the next repaint, with the frame timestamp.
pub type FrameCallback = Box<dyn FnOnce(f64) + Send>;

/// Readiness of a [`Channel`], mirroring the WebSocket ready states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReadyState {
    #[default]
    Connecting,
    Open,
    Closing,
    Closed,
}

impl ReadyState {
    pub fn is_open(self) -> bool {
        self == ReadyState::Open
    }
}

/// Outbound half of the session's message channel.
///
/// Inbound messages and error notifications are delivered by the host by
/// calling [`Session::on_message`](crate::Session::on_message) and
/// [`Session::on_channel_error`](crate::Session::on_channel_error).
/// Implementations must not call back into the session from `send`.
pub trait Channel: Send {
    /// Hand one serialized batch to the transport.
    fn send(&mut self, payload: String) -> Result<(), ChannelError>;

    /// Current readiness.
    fn ready_state(&self) -> ReadyState;

    /// Close the channel. Further sends fail.
    fn close(&mut self);
}

/// Host runtime services.
pub trait Platform: Send + Sync {
    /// Run `callback` once before the next repaint.
    fn request_animation_frame(&self, callback: FrameCallback);

    /// High-resolution clock reading in milliseconds.
    fn now(&self) -> f64;

    /// Post `message` to the embedding page after `delay`.
    fn notify_host_after(&self, delay: Duration, message: &str);
}

/// Resolves a recorded element id to the target it denotes on this side.
///
/// Called without the session lock held, so implementations may query the
/// session.
pub trait TargetResolver: Send + Sync {
    fn resolve(&self, element_id: &ElementId) -> Option<Target>;
}

/// Resolver that trusts every id: element handles are the same on both sides.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityResolver;

impl TargetResolver for IdentityResolver {
    fn resolve(&self, element_id: &ElementId) -> Option<Target> {
        Some(Target::Element(element_id.clone()))
    }
}
