//! Activity envelopes.
//!
//! An [`ActivityEnvelope`] turns discrete activity (keypresses, clicks, messages) into a
//! continuous level between 0 and 1 that visualisation code can poll or subscribe to. It
//! borrows the shape of an audio ADSR envelope, with one difference: the sustain phase lasts
//! a fixed *time* instead of holding a level until released, because the input is a stream
//! of impulses rather than a held note.
//!
//! ```text
//!  value
//!    1 |      ________________
//!      |     /                \
//!      |    /                  \
//!    0 |___/                    \________
//!        inactive attack sustain release inactive
//! ```

mod activity;
mod config;
mod observer;
mod phase;

pub use activity::{ActivityEnvelope, WeakEnvelope};
pub use config::{EnvelopeConfig, RetriggerPolicy};
pub use observer::SubscriptionId;
pub use phase::Phase;
