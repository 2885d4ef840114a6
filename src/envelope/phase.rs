//! Envelope phases.

use std::fmt;

/// Phase of an [`ActivityEnvelope`](super::ActivityEnvelope).
///
/// The envelope cycles `Inactive → Attack → Sustain → Release → Inactive`. Retriggers can
/// jump from `Release` back to `Attack`, and can hold the envelope in `Sustain`, but no
/// other transitions exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Phase {
    /// No activity
    #[default]
    Inactive,
    /// Ramping up toward 1
    Attack,
    /// Holding at 1 for a fixed duration
    Sustain,
    /// Ramping down from 1
    Release,
}

impl Phase {
    /// All phases, in cycle order.
    pub const ALL: [Phase; 4] = [
        Phase::Inactive,
        Phase::Attack,
        Phase::Sustain,
        Phase::Release,
    ];

    /// The phase an automatic (timer-driven) advance moves to.
    ///
    /// Returns `None` for `Inactive`, which is never left by a timer.
    ///
    /// # Examples
    ///
    /// ```
    /// use activity_envelope::Phase;
    ///
    /// assert_eq!(Phase::Attack.next(), Some(Phase::Sustain));
    /// assert_eq!(Phase::Release.next(), Some(Phase::Inactive));
    /// assert_eq!(Phase::Inactive.next(), None);
    /// ```
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Inactive => None,
            Phase::Attack => Some(Phase::Sustain),
            Phase::Sustain => Some(Phase::Release),
            Phase::Release => Some(Phase::Inactive),
        }
    }

    /// Lowercase name of the phase, suitable for CSS classes or log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Inactive => "inactive",
            Phase::Attack => "attack",
            Phase::Sustain => "sustain",
            Phase::Release => "release",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_inactive() {
        assert_eq!(Phase::default(), Phase::Inactive);
    }

    #[test]
    fn test_next_follows_cycle() {
        let mut phase = Phase::Attack;
        let mut seen = vec![phase];
        while let Some(next) = phase.next() {
            seen.push(next);
            phase = next;
        }
        assert_eq!(
            seen,
            vec![Phase::Attack, Phase::Sustain, Phase::Release, Phase::Inactive]
        );
    }

    #[test]
    fn test_display_names() {
        let names: Vec<String> = Phase::ALL.iter().map(|p| p.to_string()).collect();
        assert_eq!(names, vec!["inactive", "attack", "sustain", "release"]);
    }
}
