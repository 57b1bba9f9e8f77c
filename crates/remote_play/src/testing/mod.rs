//! Deterministic test doubles for the session's collaborators.
//!
//! [`ManualPlatform`] queues frame callbacks until a test fires them and
//! reports whatever clock value the test set. [`MockChannel`] records every
//! payload it accepts and lets tests flip its ready state or make sends fail.
//! Both are public so hosts can drive sessions in their own tests.

mod manual_platform;
mod mock_channel;

pub use manual_platform::ManualPlatform;
pub use mock_channel::MockChannel;
