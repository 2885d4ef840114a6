//! The activity envelope state machine.

use super::observer::{self, Observers, SubscriptionId};
use super::{EnvelopeConfig, Phase, RetriggerPolicy};
use crate::error::EnvelopeError;
use crate::interpolate::{lerp, progress};
use crate::time::{Clock, Scheduler, TimerId};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// An attack/sustain/release envelope driven by discrete activations.
///
/// Unlike an audio ADSR, the sustain phase has a fixed *duration* rather than a level: it is
/// the window during which further activity keeps the envelope at its peak. The envelope
/// supports both pull and push consumers:
/// - [`value`](Self::value) computes the current activity level on demand, cheap enough to
///   call once per rendered frame
/// - [`subscribe`](Self::subscribe) registers a callback for every phase change
///
/// Time comes from the injected [`Clock`], and automatic phase advances are driven by the
/// injected [`Scheduler`]. At most one advance is ever pending.
///
/// The handle is reference counted: clones refer to the same envelope, which lets UI
/// callbacks share it. It is deliberately `!Send`; use it from one thread. Dropping the last
/// handle cancels the pending advance. Observers that need the envelope should capture a
/// [`WeakEnvelope`] from [`downgrade`](Self::downgrade); a strong clone held by an observer
/// keeps the envelope alive until [`teardown`](Self::teardown).
///
/// # Examples
///
/// ```
/// use activity_envelope::time::VirtualTime;
/// use activity_envelope::{ActivityEnvelope, EnvelopeConfig, Phase};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let time = VirtualTime::new();
/// let config = EnvelopeConfig::from_millis(100.0, 200.0, 300.0).unwrap();
/// let envelope = ActivityEnvelope::new(config, time.clock(), time.scheduler()).unwrap();
///
/// let phases = Rc::new(RefCell::new(Vec::new()));
/// let sink = phases.clone();
/// envelope.subscribe(move |phase| sink.borrow_mut().push(phase));
///
/// envelope.activate();
/// time.advance_millis(50);
/// assert_eq!(envelope.value(), 0.5);
///
/// time.advance_millis(550);
/// assert_eq!(
///     *phases.borrow(),
///     vec![Phase::Attack, Phase::Sustain, Phase::Release, Phase::Inactive]
/// );
/// ```
pub struct ActivityEnvelope<C: Clock + 'static, S: Scheduler + 'static> {
    shared: Rc<Shared<C, S>>,
}

/// A non-owning handle to an [`ActivityEnvelope`].
///
/// Does not keep the envelope alive. Capture one in an observer that needs to read or
/// reactivate the envelope it is subscribed to.
pub struct WeakEnvelope<C: Clock + 'static, S: Scheduler + 'static> {
    shared: Weak<Shared<C, S>>,
}

struct Shared<C: Clock, S: Scheduler> {
    config: EnvelopeConfig,
    clock: C,
    scheduler: S,
    state: RefCell<State>,
    observers: RefCell<Observers>,
    outbox: RefCell<Outbox>,
}

struct State {
    phase: Phase,
    // None until the first transition
    last_phase_change: Option<Duration>,
    value_at_retrigger: f64,
    pending: Option<TimerId>,
    // Bumped whenever the pending timer is replaced or cancelled
    generation: u64,
    torn_down: bool,
}

/// Phases waiting to be delivered. Transitions made from inside an observer are queued here
/// so every observer sees phases in transition order.
#[derive(Default)]
struct Outbox {
    delivering: bool,
    queue: VecDeque<Phase>,
}

impl<C: Clock + 'static, S: Scheduler + 'static> ActivityEnvelope<C, S> {
    /// Creates an inactive envelope.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::ZeroDuration`] if `config` has a zero-length phase.
    pub fn new(config: EnvelopeConfig, clock: C, scheduler: S) -> Result<Self, EnvelopeError> {
        config.validate()?;
        Ok(Self {
            shared: Rc::new(Shared {
                config,
                clock,
                scheduler,
                state: RefCell::new(State {
                    phase: Phase::Inactive,
                    last_phase_change: None,
                    value_at_retrigger: 0.0,
                    pending: None,
                    generation: 0,
                    torn_down: false,
                }),
                observers: RefCell::new(Observers::default()),
                outbox: RefCell::new(Outbox::default()),
            }),
        })
    }

    /// Registers activity.
    ///
    /// | current phase | effect |
    /// |---|---|
    /// | `Inactive` | enters `Attack` from 0 |
    /// | `Attack` | nothing |
    /// | `Sustain` | stays in `Sustain`, restarting its full duration; no notification |
    /// | `Release` | enters `Attack` from the current value, so the level never jumps |
    ///
    /// After [`teardown`](Self::teardown) this does nothing.
    pub fn activate(&self) {
        self.shared.activate();
    }

    /// The current activity level.
    ///
    /// | phase | value |
    /// |---|---|
    /// | `Inactive` | 0 |
    /// | `Attack`, fixed rate | `min(1, start + elapsed / attack)` |
    /// | `Attack`, constant duration | `lerp(start, 1, elapsed / attack)` |
    /// | `Sustain` | 1 |
    /// | `Release` | `1 - elapsed / release` |
    ///
    /// `start` is the value the attack was retriggered from. The constant-duration attack and
    /// the release are not clamped; they stay within [0, 1] as long as the scheduler fires
    /// the next advance on time.
    pub fn value(&self) -> f64 {
        let state = self.shared.state.borrow();
        self.shared.value_of(&state)
    }

    pub fn phase(&self) -> Phase {
        self.shared.state.borrow().phase
    }

    /// Whether the envelope is anywhere other than `Inactive`.
    pub fn is_active(&self) -> bool {
        self.phase() != Phase::Inactive
    }

    pub fn config(&self) -> &EnvelopeConfig {
        &self.shared.config
    }

    /// Whether an automatic phase advance is scheduled.
    pub fn has_pending_transition(&self) -> bool {
        self.shared.state.borrow().pending.is_some()
    }

    /// Creates a [`WeakEnvelope`] pointing at this envelope.
    pub fn downgrade(&self) -> WeakEnvelope<C, S> {
        WeakEnvelope {
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Registers `observer` to be called with the new phase on every phase change.
    ///
    /// Observers run synchronously, in registration order. Registering the same observer
    /// twice calls it twice. A panicking observer is logged and does not stop the others.
    ///
    /// Observers may call back into the envelope through a [`WeakEnvelope`]. A phase change
    /// they cause is delivered after the current round of notifications completes.
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(Phase) + 'static,
    {
        let mut observers = self.shared.observers.borrow_mut();
        if self.shared.state.borrow().torn_down {
            warn!("subscribe called after teardown; observer dropped");
            return observers.reserve();
        }
        observers.add(Rc::new(observer))
    }

    /// Removes a registration. Returns `false` if it was already gone.
    ///
    /// An observer removed during a round of notifications still receives that round.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.observers.borrow_mut().remove(id)
    }

    /// Number of registered observers.
    pub fn subscriber_count(&self) -> usize {
        self.shared.observers.borrow().len()
    }

    /// Cancels the pending advance and drops every observer.
    ///
    /// No notification is sent, and none will be sent afterwards. The phase is frozen where
    /// it was, and later calls to [`activate`](Self::activate) are ignored.
    pub fn teardown(&self) {
        self.shared.teardown();
    }

    pub fn is_torn_down(&self) -> bool {
        self.shared.state.borrow().torn_down
    }
}

impl<C: Clock + 'static, S: Scheduler + 'static> Clone for ActivityEnvelope<C, S> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<C: Clock + 'static, S: Scheduler + 'static> WeakEnvelope<C, S> {
    /// Returns a strong handle, or `None` once every strong handle has been dropped.
    pub fn upgrade(&self) -> Option<ActivityEnvelope<C, S>> {
        self.shared.upgrade().map(|shared| ActivityEnvelope { shared })
    }
}

impl<C: Clock + 'static, S: Scheduler + 'static> Clone for WeakEnvelope<C, S> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<C: Clock + 'static, S: Scheduler + 'static> fmt::Debug for WeakEnvelope<C, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakEnvelope")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}

impl<C: Clock + 'static, S: Scheduler + 'static> fmt::Debug for ActivityEnvelope<C, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("ActivityEnvelope")
            .field("phase", &state.phase)
            .field("value", &self.shared.value_of(&state))
            .field("config", &self.shared.config)
            .field("torn_down", &state.torn_down)
            .finish()
    }
}

impl<C: Clock + 'static, S: Scheduler + 'static> Shared<C, S> {
    fn activate(self: &Rc<Self>) {
        let mut state = self.state.borrow_mut();
        if state.torn_down {
            warn!("activate called after teardown; ignored");
            return;
        }

        match state.phase {
            Phase::Inactive => {
                state.value_at_retrigger = 0.0;
            }
            // An attack in progress cannot be retriggered
            Phase::Attack => return,
            Phase::Sustain => {
                trace!("sustain extended");
                self.arm(&mut state, self.config.sustain());
                return;
            }
            Phase::Release => {
                let current = self.value_of(&state);
                state.value_at_retrigger = current;
            }
        }

        self.enter(&mut state, Phase::Attack);
        drop(state);
        self.notify(Phase::Attack);
    }

    /// Runs when a scheduled advance fires.
    fn advance(self: &Rc<Self>, generation: u64) {
        let mut state = self.state.borrow_mut();
        if state.torn_down || state.generation != generation {
            trace!(generation, "stale phase advance ignored");
            return;
        }
        state.pending = None;

        let Some(next) = state.phase.next() else {
            panic!("phase advance fired while inactive");
        };
        if state.phase == Phase::Attack {
            state.value_at_retrigger = 0.0;
        }

        self.enter(&mut state, next);
        drop(state);
        self.notify(next);
    }

    /// Switches phase, records the time and arms the next advance.
    fn enter(self: &Rc<Self>, state: &mut State, next: Phase) {
        debug!(
            from = %state.phase,
            to = %next,
            value_at_retrigger = state.value_at_retrigger,
            "phase transition"
        );
        state.phase = next;
        state.last_phase_change = Some(self.clock.now());
        match self.config.duration_of(next) {
            Some(after) => self.arm(state, after),
            None => self.disarm(state),
        }
    }

    /// Replaces the pending advance with one firing `after` from now.
    fn arm(self: &Rc<Self>, state: &mut State, after: Duration) {
        self.disarm(state);
        let generation = state.generation;
        let weak = Rc::downgrade(self);
        let timer = self.scheduler.schedule(
            after,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.advance(generation);
                }
            }),
        );
        trace!(?after, generation, "phase advance armed");
        state.pending = Some(timer);
    }

    fn disarm(&self, state: &mut State) {
        if let Some(timer) = state.pending.take() {
            self.scheduler.cancel(timer);
        }
        state.generation += 1;
    }

    fn notify(&self, phase: Phase) {
        let mut outbox = self.outbox.borrow_mut();
        outbox.queue.push_back(phase);
        if outbox.delivering {
            return;
        }
        outbox.delivering = true;
        drop(outbox);

        loop {
            let Some(phase) = self.outbox.borrow_mut().queue.pop_front() else {
                break;
            };
            let observers = self.observers.borrow().snapshot();
            for (index, observer) in observers.iter().enumerate() {
                if self.state.borrow().torn_down {
                    break;
                }
                observer::call_isolated(observer, index, phase);
            }
        }

        self.outbox.borrow_mut().delivering = false;
    }

    fn teardown(&self) {
        let mut state = self.state.borrow_mut();
        if state.torn_down {
            return;
        }
        state.torn_down = true;
        self.disarm(&mut state);
        drop(state);

        self.observers.borrow_mut().clear();
        self.outbox.borrow_mut().queue.clear();
        debug!("envelope torn down");
    }

    fn value_of(&self, state: &State) -> f64 {
        match state.phase {
            Phase::Inactive => 0.0,
            Phase::Sustain => 1.0,
            Phase::Attack => {
                let t = progress(self.elapsed(state), self.config.attack());
                match self.config.retrigger_policy() {
                    RetriggerPolicy::FixedRate => (state.value_at_retrigger + t).min(1.0),
                    RetriggerPolicy::ConstantDuration => lerp(state.value_at_retrigger, 1.0, t),
                }
            }
            Phase::Release => 1.0 - progress(self.elapsed(state), self.config.release()),
        }
    }

    fn elapsed(&self, state: &State) -> Duration {
        match state.last_phase_change {
            Some(at) => self.clock.now().saturating_sub(at),
            None => Duration::ZERO,
        }
    }
}

impl<C: Clock, S: Scheduler> Drop for Shared<C, S> {
    fn drop(&mut self) {
        if let Some(timer) = self.state.get_mut().pending.take() {
            self.scheduler.cancel(timer);
        }
    }
}
