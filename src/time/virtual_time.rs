//! Deterministic time for driving envelopes without waiting.

use super::{Clock, Scheduler, TimerCallback, TimerId, TimerQueue, VirtualClock};
use std::rc::Rc;
use std::time::Duration;

/// A virtual clock paired with a timer queue that runs on it.
///
/// [`advance`](VirtualTime::advance) walks the clock forward deadline by deadline, so each
/// callback sees its own deadline as the current time, exactly as it would on a perfectly
/// punctual event loop.
///
/// `clock()` and `scheduler()` hand out shared handles that can be given to an
/// [`ActivityEnvelope`](crate::ActivityEnvelope).
///
/// # Examples
///
/// ```
/// use activity_envelope::time::VirtualTime;
/// use activity_envelope::{ActivityEnvelope, EnvelopeConfig, Phase};
///
/// let time = VirtualTime::new();
/// let config: EnvelopeConfig = "100/200/300".parse().unwrap();
/// let envelope = ActivityEnvelope::new(config, time.clock(), time.scheduler()).unwrap();
///
/// envelope.activate();
/// time.advance_millis(150);
/// assert_eq!(envelope.phase(), Phase::Sustain);
///
/// time.advance_millis(450);
/// assert_eq!(envelope.phase(), Phase::Inactive);
/// ```
#[derive(Clone)]
pub struct VirtualTime {
    clock: VirtualClock,
    queue: Rc<TimerQueue<VirtualClock>>,
}

impl VirtualTime {
    /// Starts virtual time at zero with no timers pending.
    pub fn new() -> Self {
        let clock = VirtualClock::new();
        let queue = Rc::new(TimerQueue::new(clock.clone()));
        Self { clock, queue }
    }

    /// A handle to the shared clock.
    pub fn clock(&self) -> VirtualClock {
        self.clock.clone()
    }

    /// A handle to the shared timer queue.
    pub fn scheduler(&self) -> Rc<TimerQueue<VirtualClock>> {
        self.queue.clone()
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Number of timers waiting to fire.
    pub fn pending_timers(&self) -> usize {
        self.queue.len()
    }

    /// Moves time forward by `by`, firing every timer that falls due on the way.
    ///
    /// Returns the number of callbacks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.clock.now() + by;
        let mut fired = 0;
        while let Some(deadline) = self.queue.next_deadline() {
            if deadline > target {
                break;
            }
            if deadline > self.clock.now() {
                self.clock.set(deadline);
            }
            fired += self.queue.run_due();
        }
        self.clock.set(target);
        fired
    }

    pub fn advance_millis(&self, millis: u64) -> usize {
        self.advance(Duration::from_millis(millis))
    }

    /// Fires timers until none are left, and returns the time at which the last one ran.
    ///
    /// # Panics
    ///
    /// Panics if more than `limit` callbacks run, which means something keeps rescheduling
    /// itself forever.
    pub fn run_until_idle(&self, limit: usize) -> Duration {
        let mut fired = 0;
        while let Some(deadline) = self.queue.next_deadline() {
            if deadline > self.clock.now() {
                self.clock.set(deadline);
            }
            fired += self.queue.run_due();
            assert!(
                fired <= limit,
                "timers still pending after {limit} callbacks"
            );
        }
        self.clock.now()
    }
}

impl Default for VirtualTime {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for VirtualTime {
    fn schedule(&self, after: Duration, callback: TimerCallback) -> TimerId {
        self.queue.schedule(after, callback)
    }

    fn cancel(&self, timer: TimerId) {
        self.queue.cancel(timer)
    }
}

impl Clock for VirtualTime {
    fn now(&self) -> Duration {
        self.clock.now()
    }
}
