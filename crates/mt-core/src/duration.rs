//! Duration value helpers.

use chrono::Duration;

/// A duration split into whole hours, minutes and seconds.
///
/// Negative durations split as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DurationParts {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl From<Duration> for DurationParts {
    fn from(duration: Duration) -> Self {
        let total = duration.num_seconds().max(0);
        Self {
            hours: total / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
        }
    }
}

/// Converts a duration to fractional seconds.
#[allow(clippy::cast_precision_loss)]
pub fn to_seconds_f64(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 1000.0
}

/// Converts fractional seconds to a duration with millisecond precision.
///
/// Returns `None` for NaN, infinite, negative or out-of-range input.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn from_seconds_f64(seconds: f64) -> Option<Duration> {
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    let millis = (seconds * 1000.0).round();
    if millis > i64::MAX as f64 {
        return None;
    }
    Duration::try_milliseconds(millis as i64)
}

/// Converts a duration to fractional hours.
#[allow(clippy::cast_precision_loss)]
pub fn to_hours_f64(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 3_600_000.0
}
