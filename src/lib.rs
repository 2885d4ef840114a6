//! Activity Envelope - a timed activity indicator for driving visualisations.
//!
//! Trigger the envelope whenever something happens, and read back a smoothly rising and
//! decaying activity level, or subscribe to its phase changes.
//!
//! The envelope has no hidden dependency on a global clock or event loop: it is given a
//! [`Clock`](time::Clock) and a [`Scheduler`](time::Scheduler). [`time::TimerQueue`] is a
//! ready-made scheduler for single-threaded hosts, and [`time::VirtualTime`] drives an
//! envelope deterministically in tests.
//!
//! # Examples
//!
//! ```
//! use activity_envelope::time::{SystemClock, TimerQueue};
//! use activity_envelope::{ActivityEnvelope, EnvelopeConfig, Phase};
//! use std::rc::Rc;
//!
//! let clock = SystemClock::new();
//! let timers = Rc::new(TimerQueue::new(clock));
//! let envelope = ActivityEnvelope::new(EnvelopeConfig::default(), clock, timers.clone())
//!     .unwrap();
//!
//! envelope.activate();
//! assert_eq!(envelope.phase(), Phase::Attack);
//!
//! // In the host's event loop:
//! timers.run_due();
//! let level = envelope.value();
//! assert!((0.0..=1.0).contains(&level));
//! ```

pub mod envelope;
pub mod error;
pub mod interpolate;
pub mod time;

#[cfg(feature = "macros")]
pub use activity_envelope_macros::envelope_timing;

// Re-export commonly used types at the crate root
pub use envelope::{
    ActivityEnvelope, EnvelopeConfig, Phase, RetriggerPolicy, SubscriptionId, WeakEnvelope,
};
pub use error::EnvelopeError;
