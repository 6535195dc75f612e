//! Human-readable rendering shared by the commands.

use chrono::{Duration, NaiveDate};

use mt_core::{DayLabel, DurationParts, TimeRecord};
use mt_core::duration::to_hours_f64;

/// Formats a record length: `1.5h` from one hour up, `42m` below.
pub fn format_record_duration(duration: Duration) -> String {
    if duration >= Duration::hours(1) {
        format!("{:.1}h", to_hours_f64(duration))
    } else {
        format!("{}m", duration.num_minutes().max(0))
    }
}

/// Formats a day or aggregate total as `3h 25m`.
pub fn format_total(duration: Duration) -> String {
    let DurationParts { hours, minutes, .. } = duration.into();
    format!("{hours}h {minutes}m")
}

/// Formats a running timer as `HH:MM:SS`.
pub fn format_clock(duration: Duration) -> String {
    let DurationParts {
        hours,
        minutes,
        seconds,
    } = duration.into();
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Formats a record's wall-clock span in local time, e.g. `09:00-10:30`.
pub fn format_span(record: &TimeRecord) -> String {
    let start = record.start_time().with_timezone(&chrono::Local);
    let end = record.end_time().with_timezone(&chrono::Local);
    format!("{}-{}", start.format("%H:%M"), end.format("%H:%M"))
}

/// `Today #2`, `Yesterday #1` or `Mar 03 #1`.
pub fn format_day_label(label: DayLabel) -> String {
    match label {
        DayLabel::Today(rank) => format!("Today #{rank}"),
        DayLabel::Yesterday(rank) => format!("Yesterday #{rank}"),
        DayLabel::On(day, rank) => format!("{} #{rank}", day.format("%b %d")),
    }
}

/// `Monday, Mar 3, 2025`.
pub fn format_day_heading(day: NaiveDate) -> String {
    day.format("%A, %b %-d, %Y").to_string()
}

/// Generates a 10-character progress bar for a ratio in `0.0..=1.0`.
/// Any non-zero ratio below 5% still gets a single block for visibility.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn progress_bar(ratio: f64) -> String {
    let ratio = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 };
    let filled = if ratio > 0.0 && ratio < 0.05 {
        1
    } else {
        (ratio * 10.0).round() as usize
    };
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

/// Progress of the running timer: one full bar per hour, like the dial.
#[allow(clippy::cast_precision_loss)]
pub fn hour_progress(elapsed: Duration) -> f64 {
    (elapsed.num_seconds().max(0) as f64 / 3600.0).min(1.0)
}
