//! Clocks the envelope reads the current time from.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// A monotonic time source.
///
/// Readings are offsets from an arbitrary, clock-specific origin. Only differences between
/// readings of the same clock are meaningful.
pub trait Clock {
    /// Returns the current time.
    fn now(&self) -> Duration;
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

/// Wall-clock time, measured from the moment the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A manually driven clock.
///
/// Clones share the same reading, so a test can keep one handle while the envelope owns
/// another.
///
/// # Examples
///
/// ```
/// use activity_envelope::time::{Clock, VirtualClock};
/// use std::time::Duration;
///
/// let clock = VirtualClock::new();
/// let shared = clock.clone();
///
/// clock.advance(Duration::from_millis(40));
/// assert_eq!(shared.now(), Duration::from_millis(40));
/// ```
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now: Rc<Cell<Duration>>,
}

impl VirtualClock {
    /// Creates a clock reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Sets the reading directly.
    ///
    /// # Panics
    ///
    /// Panics if `to` is earlier than the current reading; clocks never run backwards.
    pub fn set(&self, to: Duration) {
        assert!(
            to >= self.now.get(),
            "virtual clock cannot move backwards ({:?} -> {:?})",
            self.now.get(),
            to
        );
        self.now.set(to);
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_clock_starts_at_zero() {
        assert_eq!(VirtualClock::new().now(), Duration::ZERO);
    }

    #[test]
    fn test_virtual_clock_set_and_advance() {
        let clock = VirtualClock::new();
        clock.set(Duration::from_millis(10));
        clock.advance(Duration::from_millis(5));
        assert_eq!(clock.now(), Duration::from_millis(15));
    }

    #[test]
    #[should_panic(expected = "cannot move backwards")]
    fn test_virtual_clock_rejects_going_backwards() {
        let clock = VirtualClock::new();
        clock.set(Duration::from_millis(10));
        clock.set(Duration::from_millis(9));
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn test_rc_clock_delegates() {
        let clock = Rc::new(VirtualClock::new());
        clock.advance(Duration::from_secs(1));
        assert_eq!(Clock::now(&clock), Duration::from_secs(1));
    }
}
