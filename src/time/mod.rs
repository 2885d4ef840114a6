//! Time sources and deferred callbacks.
//!
//! An envelope never reads the system clock or spawns timers on its own. It is handed a
//! [`Clock`] and a [`Scheduler`], which lets a host plug it into whatever event loop it
//! runs, and lets tests drive it with [`VirtualTime`].

mod clock;
mod scheduler;
mod virtual_time;

pub use clock::{Clock, SystemClock, VirtualClock};
pub use scheduler::{Scheduler, TimerCallback, TimerId, TimerQueue};
pub use virtual_time::VirtualTime;
