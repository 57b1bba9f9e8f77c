//! Platform driven by hand.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::platform::{FrameCallback, Platform};

#[derive(Default)]
struct PlatformState {
    now: f64,
    frames: Vec<FrameCallback>,
    notifications: Vec<(Duration, String)>,
}

/// A [`Platform`] whose clock and frames advance only when told to.
#[derive(Default)]
pub struct ManualPlatform {
    state: Mutex<PlatformState>,
}

impl ManualPlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Set the clock reading returned by [`Platform::now`].
    pub fn set_now(&self, now: f64) {
        self.state.lock().now = now;
    }

    /// Move the clock forward by `ms` milliseconds.
    pub fn advance(&self, ms: f64) {
        self.state.lock().now += ms;
    }

    /// Number of frame callbacks waiting for the next frame.
    pub fn pending_frames(&self) -> usize {
        self.state.lock().frames.len()
    }

    /// Fire one frame at `timestamp`.
    ///
    /// The clock is set to `timestamp` first. Only callbacks queued before
    /// the call run; callbacks they request wait for the next frame. Returns
    /// how many callbacks ran.
    pub fn run_frame(&self, timestamp: f64) -> usize {
        let frames = {
            let mut state = self.state.lock();
            state.now = timestamp;
            std::mem::take(&mut state.frames)
        };
        let count = frames.len();
        for callback in frames {
            callback(timestamp);
        }
        count
    }

    /// Host notifications posted so far, in order.
    pub fn notifications(&self) -> Vec<(Duration, String)> {
        self.state.lock().notifications.clone()
    }
}

impl Platform for ManualPlatform {
    fn request_animation_frame(&self, callback: FrameCallback) {
        self.state.lock().frames.push(callback);
    }

    fn now(&self) -> f64 {
        self.state.lock().now
    }

    fn notify_host_after(&self, delay: Duration, message: &str) {
        self.state
            .lock()
            .notifications
            .push((delay, message.to_string()));
    }
}

impl std::fmt::Debug for ManualPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ManualPlatform")
            .field("now", &state.now)
            .field("pending_frames", &state.frames.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_run_once() {
        let platform = ManualPlatform::new();
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = fired.clone();
        platform.request_animation_frame(Box::new(move |ts| sink.lock().push(ts)));

        assert_eq!(platform.run_frame(16.0), 1);
        assert_eq!(platform.run_frame(32.0), 0);
        assert_eq!(*fired.lock(), vec![16.0]);
        assert_eq!(platform.now(), 32.0);
    }

    #[test]
    fn test_nested_request_waits_for_next_frame() {
        let platform = ManualPlatform::new();
        let inner = platform.clone();
        platform.request_animation_frame(Box::new(move |_| {
            inner.request_animation_frame(Box::new(|_| {}));
        }));

        assert_eq!(platform.run_frame(1.0), 1);
        assert_eq!(platform.pending_frames(), 1);
    }

    #[test]
    fn test_clock_and_notifications() {
        let platform = ManualPlatform::new();
        platform.set_now(10.0);
        platform.advance(2.5);
        assert_eq!(platform.now(), 12.5);

        platform.notify_host_after(Duration::from_millis(500), "refreshPage");
        assert_eq!(
            platform.notifications(),
            vec![(Duration::from_millis(500), "refreshPage".to_string())]
        );
    }
}
