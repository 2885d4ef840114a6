//! Deferred single-shot callbacks.

use super::Clock;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::Duration;
use tracing::trace;

/// Callback run when a timer fires.
pub type TimerCallback = Box<dyn FnOnce()>;

/// Handle to a scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// A host capability for running a callback once after a delay.
///
/// This is the only way an envelope learns that time has passed, so hosts integrate the
/// envelope with their event loop by implementing it. Implementations must tolerate
/// cancelling an id that already fired or was already cancelled, and must never run a
/// callback from inside `schedule` itself.
pub trait Scheduler {
    /// Runs `callback` once, `after` the current time.
    fn schedule(&self, after: Duration, callback: TimerCallback) -> TimerId;

    /// Prevents a scheduled callback from running. Unknown ids are ignored.
    fn cancel(&self, timer: TimerId);
}

impl<S: Scheduler + ?Sized> Scheduler for Rc<S> {
    fn schedule(&self, after: Duration, callback: TimerCallback) -> TimerId {
        (**self).schedule(after, callback)
    }

    fn cancel(&self, timer: TimerId) {
        (**self).cancel(timer)
    }
}

/// A single-threaded timer queue driven by the host's event loop.
///
/// The host calls [`run_due`](TimerQueue::run_due) whenever it wakes up, and can use
/// [`time_until_next`](TimerQueue::time_until_next) to decide how long to sleep. Callbacks
/// run with no internal borrow held, so they may schedule or cancel other timers.
///
/// # Examples
///
/// ```
/// use activity_envelope::time::{Scheduler, TimerQueue, VirtualClock};
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use std::time::Duration;
///
/// let clock = VirtualClock::new();
/// let queue = TimerQueue::new(clock.clone());
/// let fired = Rc::new(Cell::new(false));
///
/// let flag = fired.clone();
/// queue.schedule(Duration::from_millis(10), Box::new(move || flag.set(true)));
///
/// clock.advance(Duration::from_millis(10));
/// assert_eq!(queue.run_due(), 1);
/// assert!(fired.get());
/// ```
pub struct TimerQueue<C: Clock> {
    clock: C,
    inner: RefCell<QueueInner>,
}

#[derive(Default)]
struct QueueInner {
    next_id: u64,
    // Keyed by (deadline, id) so ties fire in scheduling order
    entries: BTreeMap<(Duration, TimerId), TimerCallback>,
    deadlines: HashMap<TimerId, Duration>,
}

impl<C: Clock> TimerQueue<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            inner: RefCell::new(QueueInner::default()),
        }
    }

    /// The clock deadlines are measured against.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Number of timers waiting to fire.
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deadline of the earliest pending timer.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.inner
            .borrow()
            .entries
            .keys()
            .next()
            .map(|(deadline, _)| *deadline)
    }

    /// Time left before the earliest pending timer is due, zero if it already is.
    pub fn time_until_next(&self) -> Option<Duration> {
        self.next_deadline()
            .map(|deadline| deadline.saturating_sub(self.clock.now()))
    }

    /// Runs every timer whose deadline has passed, earliest first.
    ///
    /// Timers scheduled by a callback also run in this call if they are already due.
    /// Returns the number of callbacks run.
    pub fn run_due(&self) -> usize {
        let mut fired = 0;
        while let Some(callback) = self.pop_due(self.clock.now()) {
            callback();
            fired += 1;
        }
        fired
    }

    fn pop_due(&self, now: Duration) -> Option<TimerCallback> {
        let mut inner = self.inner.borrow_mut();
        let key = *inner.entries.keys().next()?;
        if key.0 > now {
            return None;
        }
        inner.deadlines.remove(&key.1);
        trace!(timer = key.1.0, deadline = ?key.0, "timer due");
        inner.entries.remove(&key)
    }
}

impl<C: Clock> Scheduler for TimerQueue<C> {
    fn schedule(&self, after: Duration, callback: TimerCallback) -> TimerId {
        let deadline = self.clock.now() + after;
        let mut inner = self.inner.borrow_mut();
        let id = TimerId(inner.next_id);
        inner.next_id += 1;
        inner.entries.insert((deadline, id), callback);
        inner.deadlines.insert(id, deadline);
        id
    }

    fn cancel(&self, timer: TimerId) {
        let mut inner = self.inner.borrow_mut();
        if let Some(deadline) = inner.deadlines.remove(&timer) {
            inner.entries.remove(&(deadline, timer));
        }
    }
}
