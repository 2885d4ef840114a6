//! Envelope timing configuration.

use super::Phase;
use crate::error::EnvelopeError;
use std::str::FromStr;
use std::time::Duration;

/// How an attack behaves when it starts from a non-zero value.
///
/// Only a retrigger during `Release` starts an attack above zero, so the policy only matters
/// for those retriggered attacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RetriggerPolicy {
    /// The value always rises at the full-swing rate (`1 / attack` per unit time), so an
    /// attack starting partway up reaches 1 early and holds there until the phase ends.
    #[default]
    FixedRate,
    /// Every attack spans the whole attack duration, rising more slowly when it starts
    /// partway up.
    ConstantDuration,
}

/// Timing configuration for an [`ActivityEnvelope`](super::ActivityEnvelope).
///
/// All three durations are strictly positive. The public constructors, [`FromStr`] and the
/// serde form all validate that. The macro expansion target skips the check at runtime, so
/// [`ActivityEnvelope::new`](super::ActivityEnvelope::new) validates again.
///
/// # Examples
///
/// ```
/// use activity_envelope::{EnvelopeConfig, RetriggerPolicy};
/// use std::time::Duration;
///
/// let config = EnvelopeConfig::new(
///     Duration::from_millis(100),
///     Duration::from_millis(1000),
///     Duration::from_millis(2000),
/// )
/// .unwrap()
/// .with_retrigger_policy(RetriggerPolicy::ConstantDuration);
///
/// assert_eq!(config.cycle_duration(), Duration::from_millis(3100));
///
/// // The same configuration written as a timing string
/// let parsed: EnvelopeConfig = "100ms/1s/2s/constant".parse().unwrap();
/// assert_eq!(parsed, config);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawConfig", into = "RawConfig")
)]
pub struct EnvelopeConfig {
    attack: Duration,
    sustain: Duration,
    release: Duration,
    retrigger: RetriggerPolicy,
}

impl EnvelopeConfig {
    /// Creates a configuration with the fixed-rate retrigger policy.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::ZeroDuration`] if any duration is zero.
    pub fn new(
        attack: Duration,
        sustain: Duration,
        release: Duration,
    ) -> Result<Self, EnvelopeError> {
        let config = Self {
            attack,
            sustain,
            release,
            retrigger: RetriggerPolicy::FixedRate,
        };
        config.validate()?;
        Ok(config)
    }

    /// Creates a configuration from millisecond values.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::InvalidMillis`] if a value is not finite or not positive,
    /// and [`EnvelopeError::ZeroDuration`] if a value is too small to be represented.
    ///
    /// # Examples
    ///
    /// ```
    /// use activity_envelope::EnvelopeConfig;
    ///
    /// assert!(EnvelopeConfig::from_millis(100.0, 200.0, 300.0).is_ok());
    /// assert!(EnvelopeConfig::from_millis(100.0, -1.0, 300.0).is_err());
    /// ```
    pub fn from_millis(attack: f64, sustain: f64, release: f64) -> Result<Self, EnvelopeError> {
        Self::new(
            millis_to_duration(Phase::Attack, attack)?,
            millis_to_duration(Phase::Sustain, sustain)?,
            millis_to_duration(Phase::Release, release)?,
        )
    }

    /// Expansion target of the `envelope_timing!` macro, which has already validated the
    /// values at compile time.
    ///
    /// Performs no checks of its own: zero durations pass through and are only rejected by
    /// [`validate`](Self::validate).
    #[doc(hidden)]
    pub const fn __from_validated_nanos(
        attack: u64,
        sustain: u64,
        release: u64,
        constant_duration: bool,
    ) -> Self {
        Self {
            attack: Duration::from_nanos(attack),
            sustain: Duration::from_nanos(sustain),
            release: Duration::from_nanos(release),
            retrigger: if constant_duration {
                RetriggerPolicy::ConstantDuration
            } else {
                RetriggerPolicy::FixedRate
            },
        }
    }

    /// Sets the retrigger policy.
    pub fn with_retrigger_policy(mut self, policy: RetriggerPolicy) -> Self {
        self.retrigger = policy;
        self
    }

    /// Checks that every duration is positive.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::ZeroDuration`] naming the first offending phase.
    pub fn validate(&self) -> Result<(), EnvelopeError> {
        for (phase, duration) in [
            (Phase::Attack, self.attack),
            (Phase::Sustain, self.sustain),
            (Phase::Release, self.release),
        ] {
            if duration.is_zero() {
                return Err(EnvelopeError::ZeroDuration { phase });
            }
        }
        Ok(())
    }

    pub fn attack(&self) -> Duration {
        self.attack
    }

    pub fn sustain(&self) -> Duration {
        self.sustain
    }

    pub fn release(&self) -> Duration {
        self.release
    }

    pub fn retrigger_policy(&self) -> RetriggerPolicy {
        self.retrigger
    }

    /// Nominal length of a phase. `Inactive` has no length and returns `None`.
    pub fn duration_of(&self, phase: Phase) -> Option<Duration> {
        match phase {
            Phase::Inactive => None,
            Phase::Attack => Some(self.attack),
            Phase::Sustain => Some(self.sustain),
            Phase::Release => Some(self.release),
        }
    }

    /// Time from a single activation to the envelope going inactive again.
    pub fn cycle_duration(&self) -> Duration {
        self.attack + self.sustain + self.release
    }
}

impl Default for EnvelopeConfig {
    /// 500 ms attack, 1 s sustain, 2 s release, fixed-rate retrigger.
    fn default() -> Self {
        Self {
            attack: Duration::from_millis(500),
            sustain: Duration::from_millis(1000),
            release: Duration::from_millis(2000),
            retrigger: RetriggerPolicy::FixedRate,
        }
    }
}

impl FromStr for EnvelopeConfig {
    type Err = EnvelopeError;

    /// Parses `"<attack>/<sustain>/<release>[/<policy>]"`.
    ///
    /// Each duration is a number with an optional `ms` or `s` suffix; bare numbers are
    /// milliseconds. The optional policy segment is `fixed` or `constant`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| EnvelopeError::InvalidTiming {
            input: s.to_string(),
            reason,
        };

        let segments: Vec<&str> = s.split('/').map(str::trim).collect();
        if !(3..=4).contains(&segments.len()) {
            return Err(invalid(format!(
                "expected 3 or 4 '/'-separated segments, found {}",
                segments.len()
            )));
        }

        let mut durations = [Duration::ZERO; 3];
        for (slot, (phase, text)) in durations.iter_mut().zip(
            [Phase::Attack, Phase::Sustain, Phase::Release]
                .into_iter()
                .zip(&segments),
        ) {
            let millis = parse_millis(text).ok_or_else(|| {
                invalid(format!("{} duration '{}' is not a valid duration", phase, text))
            })?;
            *slot = millis_to_duration(phase, millis)?;
        }

        let retrigger = match segments.get(3) {
            None => RetriggerPolicy::FixedRate,
            Some(policy) => parse_policy(policy)
                .ok_or_else(|| invalid(format!("unknown retrigger policy '{}'", policy)))?,
        };

        let [attack, sustain, release] = durations;
        Ok(Self::new(attack, sustain, release)?.with_retrigger_policy(retrigger))
    }
}

/// Parses a single duration segment into milliseconds.
fn parse_millis(text: &str) -> Option<f64> {
    let (number, scale) = if let Some(n) = text.strip_suffix("ms") {
        (n, 1.0)
    } else if let Some(n) = text.strip_suffix('s') {
        (n, 1000.0)
    } else {
        (text, 1.0)
    };
    number.trim().parse::<f64>().ok().map(|n| n * scale)
}

fn parse_policy(text: &str) -> Option<RetriggerPolicy> {
    match text.to_ascii_lowercase().as_str() {
        "fixed" | "fixed_rate" => Some(RetriggerPolicy::FixedRate),
        "constant" | "constant_duration" => Some(RetriggerPolicy::ConstantDuration),
        _ => None,
    }
}

fn millis_to_duration(phase: Phase, millis: f64) -> Result<Duration, EnvelopeError> {
    if !millis.is_finite() || millis <= 0.0 {
        return Err(EnvelopeError::InvalidMillis {
            phase,
            value: millis,
        });
    }
    let nanos = (millis * 1e6).round();
    if nanos >= u64::MAX as f64 {
        return Err(EnvelopeError::InvalidMillis {
            phase,
            value: millis,
        });
    }
    if nanos < 1.0 {
        return Err(EnvelopeError::ZeroDuration { phase });
    }
    Ok(Duration::from_nanos(nanos as u64))
}

/// Wire form used by the `serde` feature: floating milliseconds plus policy.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawConfig {
    attack_ms: f64,
    sustain_ms: f64,
    release_ms: f64,
    #[serde(default)]
    retrigger: RetriggerPolicy,
}

#[cfg(feature = "serde")]
impl TryFrom<RawConfig> for EnvelopeConfig {
    type Error = EnvelopeError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        Ok(
            Self::from_millis(raw.attack_ms, raw.sustain_ms, raw.release_ms)?
                .with_retrigger_policy(raw.retrigger),
        )
    }
}

#[cfg(feature = "serde")]
impl From<EnvelopeConfig> for RawConfig {
    fn from(config: EnvelopeConfig) -> Self {
        let millis = |d: Duration| d.as_nanos() as f64 / 1e6;
        Self {
            attack_ms: millis(config.attack),
            sustain_ms: millis(config.sustain),
            release_ms: millis(config.release),
            retrigger: config.retrigger,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    include!("../../activity-envelope-macros/timing_cases.rs");

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_new_accepts_positive_durations() {
        let config = EnvelopeConfig::new(ms(100), ms(200), ms(300)).unwrap();
        assert_eq!(config.attack(), ms(100));
        assert_eq!(config.sustain(), ms(200));
        assert_eq!(config.release(), ms(300));
        assert_eq!(config.retrigger_policy(), RetriggerPolicy::FixedRate);
        assert_eq!(config.cycle_duration(), ms(600));
    }

    #[test]
    fn test_new_rejects_zero_duration() {
        assert_eq!(
            EnvelopeConfig::new(ms(100), Duration::ZERO, ms(300)),
            Err(EnvelopeError::ZeroDuration {
                phase: Phase::Sustain
            })
        );
        assert_eq!(
            EnvelopeConfig::new(Duration::ZERO, ms(1), ms(1)),
            Err(EnvelopeError::ZeroDuration {
                phase: Phase::Attack
            })
        );
    }

    #[test]
    fn test_from_millis_rejects_invalid_values() {
        for bad in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let result = EnvelopeConfig::from_millis(100.0, 100.0, bad);
            assert!(
                matches!(
                    result,
                    Err(EnvelopeError::InvalidMillis {
                        phase: Phase::Release,
                        ..
                    })
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_from_millis_fractional() {
        let config = EnvelopeConfig::from_millis(0.5, 1.5, 2.0).unwrap();
        assert_eq!(config.attack(), Duration::from_micros(500));
        assert_eq!(config.sustain(), Duration::from_micros(1500));
    }

    #[test]
    fn test_default_matches_reference_timing() {
        let config = EnvelopeConfig::default();
        assert_eq!(config.attack(), ms(500));
        assert_eq!(config.sustain(), ms(1000));
        assert_eq!(config.release(), ms(2000));
        assert_eq!(config.retrigger_policy(), RetriggerPolicy::FixedRate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duration_of() {
        let config = EnvelopeConfig::new(ms(1), ms(2), ms(3)).unwrap();
        assert_eq!(config.duration_of(Phase::Inactive), None);
        assert_eq!(config.duration_of(Phase::Attack), Some(ms(1)));
        assert_eq!(config.duration_of(Phase::Sustain), Some(ms(2)));
        assert_eq!(config.duration_of(Phase::Release), Some(ms(3)));
    }

    #[test]
    fn test_parse_units() {
        let config: EnvelopeConfig = "100ms/1.5s/250".parse().unwrap();
        assert_eq!(config.attack(), ms(100));
        assert_eq!(config.sustain(), ms(1500));
        assert_eq!(config.release(), ms(250));
        assert_eq!(config.retrigger_policy(), RetriggerPolicy::FixedRate);
    }

    #[test]
    fn test_parse_policy_segment() {
        let config: EnvelopeConfig = " 10ms / 20ms / 30ms / constant ".parse().unwrap();
        assert_eq!(
            config.retrigger_policy(),
            RetriggerPolicy::ConstantDuration
        );

        let config: EnvelopeConfig = "10/20/30/fixed".parse().unwrap();
        assert_eq!(config.retrigger_policy(), RetriggerPolicy::FixedRate);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "100/200".parse::<EnvelopeConfig>(),
            Err(EnvelopeError::InvalidTiming { .. })
        ));
        assert!(matches!(
            "100/abc/300".parse::<EnvelopeConfig>(),
            Err(EnvelopeError::InvalidTiming { .. })
        ));
        assert!(matches!(
            "100/200/300/sometimes".parse::<EnvelopeConfig>(),
            Err(EnvelopeError::InvalidTiming { .. })
        ));
        assert!(matches!(
            "100/0ms/300".parse::<EnvelopeConfig>(),
            Err(EnvelopeError::InvalidMillis {
                phase: Phase::Sustain,
                ..
            })
        ));
    }

    #[test]
    fn test_unchecked_constructor_is_caught_by_validate() {
        let config = EnvelopeConfig::__from_validated_nanos(1, 0, 1, true);
        assert_eq!(
            config.validate(),
            Err(EnvelopeError::ZeroDuration {
                phase: Phase::Sustain
            })
        );
        assert_eq!(
            config.retrigger_policy(),
            RetriggerPolicy::ConstantDuration
        );
    }

    #[test]
    fn test_timing_case_table() {
        for &(input, expected) in TIMING_CASES {
            let parsed = input.parse::<EnvelopeConfig>().ok().map(|c| {
                (
                    c.attack().as_nanos() as u64,
                    c.sustain().as_nanos() as u64,
                    c.release().as_nanos() as u64,
                    c.retrigger_policy() == RetriggerPolicy::ConstantDuration,
                )
            });
            assert_eq!(parsed, expected, "{input:?}");
        }
    }

    #[test]
    fn test_too_small_reports_zero_duration() {
        assert_eq!(
            "1e-7/20/30".parse::<EnvelopeConfig>(),
            Err(EnvelopeError::ZeroDuration {
                phase: Phase::Attack
            })
        );
    }

    #[test]
    fn test_error_messages() {
        let err = EnvelopeConfig::new(ms(1), ms(1), Duration::ZERO).unwrap_err();
        assert_eq!(err.to_string(), "release duration must be greater than zero");
    }
}
