//! Status command: the current session and today's total.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use mt_core::{KeyValueStore, SessionState, Tracker, local_day};

use super::format::{format_clock, format_total, hour_progress, progress_bar};

/// Machine-readable status.
#[derive(Debug, Serialize)]
struct StatusReport {
    state: SessionState,
    elapsed_seconds: i64,
    /// `now - elapsed`: shifted forward by every pause, so not a wall-clock
    /// start time once the session has been paused.
    effective_start: Option<DateTime<Utc>>,
    today_seconds: i64,
    today_records: usize,
    timezone: String,
}

pub fn run<S: KeyValueStore, W: Write>(
    tracker: &Tracker<S>,
    writer: &mut W,
    json: bool,
) -> Result<()> {
    let today = local_day(tracker.now());
    let elapsed = tracker.elapsed();
    let today_total = tracker.records().total_duration_for_date(today);
    let today_records = tracker.records().records_for_date(today).len();

    if json {
        let report = StatusReport {
            state: tracker.state(),
            elapsed_seconds: elapsed.num_seconds(),
            effective_start: tracker.session().current_start_time(),
            today_seconds: today_total.num_seconds(),
            today_records,
            timezone: iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string()),
        };
        let json = serde_json::to_string_pretty(&report).context("failed to serialize status")?;
        writeln!(writer, "{json}")?;
        return Ok(());
    }

    match tracker.state() {
        SessionState::Idle => writeln!(writer, "Not tracking.")?,
        state => writeln!(
            writer,
            "{} {} [{}]",
            capitalize(state.as_str()),
            format_clock(elapsed),
            progress_bar(hour_progress(elapsed))
        )?,
    }

    if today_records == 0 {
        writeln!(writer, "No records today.")?;
    } else {
        writeln!(
            writer,
            "Today: {} across {today_records} record{}",
            format_total(today_total),
            if today_records == 1 { "" } else { "s" }
        )?;
    }
    Ok(())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
