#![cfg(feature = "macros")]

use activity_envelope::{EnvelopeConfig, RetriggerPolicy, envelope_timing};
use std::time::Duration;

#[test]
fn test_timing_macro_units() {
    let config = envelope_timing!("100ms/1.5s/2000");
    assert_eq!(config.attack(), Duration::from_millis(100));
    assert_eq!(config.sustain(), Duration::from_millis(1500));
    assert_eq!(config.release(), Duration::from_millis(2000));
    assert_eq!(config.retrigger_policy(), RetriggerPolicy::FixedRate);
}

#[test]
fn test_timing_macro_policy() {
    let config = envelope_timing!("10/20/30/constant");
    assert_eq!(config.retrigger_policy(), RetriggerPolicy::ConstantDuration);
}

#[test]
fn test_timing_macro_matches_runtime_parse() {
    let parsed: EnvelopeConfig = "250ms/500ms/1s".parse().unwrap();
    assert_eq!(envelope_timing!("250ms/500ms/1s"), parsed);
}

#[test]
fn test_timing_macro_in_const() {
    const CONFIG: EnvelopeConfig = envelope_timing!("5/10/15");
    assert!(CONFIG.validate().is_ok());
    assert_eq!(CONFIG.cycle_duration(), Duration::from_millis(30));
}
