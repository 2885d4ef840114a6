//! Interpolation helpers for envelope values.
//!
//! Envelope values are computed from the time elapsed since the last phase change, so the
//! helpers here work with [`Duration`]s and plain `f64` ratios. Nothing is clamped: callers
//! decide whether a ratio past 1.0 is meaningful.

use std::time::Duration;

/// Linear interpolation between `from` and `to`.
///
/// `t` is not clamped, so values outside [0, 1] extrapolate along the same line.
///
/// # Examples
///
/// ```
/// use activity_envelope::interpolate::lerp;
///
/// assert_eq!(lerp(0.0, 1.0, 0.25), 0.25);
/// assert_eq!(lerp(0.5, 1.0, 0.5), 0.75);
/// assert_eq!(lerp(0.5, 1.0, 2.0), 1.5);
/// ```
pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

/// Fraction of `duration` covered by `elapsed`.
///
/// Returns a ratio that exceeds 1.0 once `elapsed` is longer than `duration`. A zero
/// `duration` is treated as already complete.
///
/// # Examples
///
/// ```
/// use activity_envelope::interpolate::progress;
/// use std::time::Duration;
///
/// let half = progress(Duration::from_millis(50), Duration::from_millis(100));
/// assert_eq!(half, 0.5);
/// ```
pub fn progress(elapsed: Duration, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 1.0;
    }
    elapsed.as_secs_f64() / duration.as_secs_f64()
}
