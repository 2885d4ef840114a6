//! Randomised activation patterns checked against the envelope's invariants.

use activity_envelope::time::{Clock, VirtualTime};
use activity_envelope::{ActivityEnvelope, EnvelopeConfig, Phase, RetriggerPolicy};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

const EPSILON: f64 = 1e-9;

fn run_storm(seed: u64, policy: RetriggerPolicy) {
    let mut rng = StdRng::seed_from_u64(seed);
    let time = VirtualTime::new();
    let config = EnvelopeConfig::from_millis(80.0, 120.0, 200.0)
        .unwrap()
        .with_retrigger_policy(policy);
    let envelope = ActivityEnvelope::new(config, time.clock(), time.scheduler()).unwrap();

    let transitions = Rc::new(RefCell::new(Vec::new()));
    let sink = transitions.clone();
    let clock = time.clock();
    envelope.subscribe(move |phase| sink.borrow_mut().push((phase, clock.now())));

    for _ in 0..2_000 {
        time.advance(Duration::from_micros(rng.gen_range(0..40_000)));

        let value = envelope.value();
        assert!(
            (-EPSILON..=1.0 + EPSILON).contains(&value),
            "seed {seed}: value {value} out of range in {}",
            envelope.phase()
        );
        assert!(time.pending_timers() <= 1);
        assert_eq!(envelope.has_pending_transition(), envelope.is_active());

        if rng.gen_bool(0.3) {
            let phase_before = envelope.phase();
            let value_before = envelope.value();
            envelope.activate();
            let value_after = envelope.value();
            match phase_before {
                Phase::Inactive => assert_eq!(value_after, 0.0),
                Phase::Release => assert!((value_before - value_after).abs() < EPSILON),
                Phase::Attack | Phase::Sustain => assert_eq!(value_before, value_after),
            }
            assert_ne!(envelope.phase(), Phase::Inactive);
        }
    }

    // Every transition follows the cycle, or is a retrigger from Release into Attack
    let transitions = transitions.borrow();
    let mut previous = Phase::Inactive;
    for (phase, at) in transitions.iter() {
        let allowed = previous.next() == Some(*phase)
            || (previous == Phase::Inactive && *phase == Phase::Attack)
            || (previous == Phase::Release && *phase == Phase::Attack);
        assert!(allowed, "seed {seed}: {previous} -> {phase} at {at:?}");
        previous = *phase;
    }
}

#[test]
fn test_fixed_rate_storm() {
    for seed in 0..8 {
        run_storm(seed, RetriggerPolicy::FixedRate);
    }
}

#[test]
fn test_constant_duration_storm() {
    for seed in 100..108 {
        run_storm(seed, RetriggerPolicy::ConstantDuration);
    }
}
