//! Phase-change subscribers.

use super::Phase;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use tracing::warn;

/// Identifies one registration made with
/// [`ActivityEnvelope::subscribe`](super::ActivityEnvelope::subscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Observer = Rc<dyn Fn(Phase)>;

/// Ordered list of observers. Registering the same closure twice is allowed and notifies it
/// twice.
#[derive(Default)]
pub(super) struct Observers {
    next_id: u64,
    entries: Vec<(SubscriptionId, Observer)>,
}

impl Observers {
    pub(super) fn add(&mut self, observer: Observer) -> SubscriptionId {
        let id = self.reserve();
        self.entries.push((id, observer));
        id
    }

    /// Hands out an id without registering anything.
    pub(super) fn reserve(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(super) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(super) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(super) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Copies the current list so observers can be called while the registry is unborrowed.
    pub(super) fn snapshot(&self) -> Vec<Observer> {
        self.entries.iter().map(|(_, o)| o.clone()).collect()
    }
}

/// Calls one observer, logging and swallowing a panic so the remaining observers still run.
pub(super) fn call_isolated(observer: &Observer, index: usize, phase: Phase) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| observer(phase)));
    if let Err(payload) = result {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        warn!(%phase, observer = index, panic = %message, "phase observer panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_ids_are_unique() {
        let mut observers = Observers::default();
        let a = observers.add(Rc::new(|_: Phase| {}));
        let b = observers.add(Rc::new(|_: Phase| {}));
        let c = observers.reserve();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(observers.len(), 2);
    }

    #[test]
    fn test_remove() {
        let mut observers = Observers::default();
        let a = observers.add(Rc::new(|_: Phase| {}));
        observers.add(Rc::new(|_: Phase| {}));
        assert!(observers.remove(a));
        assert!(!observers.remove(a));
        assert_eq!(observers.len(), 1);
    }

    fn failing_observer(_: Phase) {
        panic!("observer failure");
    }

    #[test]
    fn test_call_isolated_contains_panics() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let first = log.clone();
        let last = log.clone();
        let list: Vec<Observer> = vec![
            Rc::new(move |p: Phase| first.borrow_mut().push(("first", p))) as Observer,
            Rc::new(failing_observer) as Observer,
            Rc::new(move |p: Phase| last.borrow_mut().push(("last", p))) as Observer,
        ];

        for (index, observer) in list.iter().enumerate() {
            call_isolated(observer, index, Phase::Sustain);
        }
        assert_eq!(
            *log.borrow(),
            vec![("first", Phase::Sustain), ("last", Phase::Sustain)]
        );
    }
}
