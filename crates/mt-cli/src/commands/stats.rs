//! Statistics command: totals, effective days and recent records.

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use mt_core::{KeyValueStore, Tracker, local_day};
use mt_core::duration::to_hours_f64;

use super::format::{format_day_label, format_record_duration, format_span, format_total};

/// How many of the newest records the text view lists.
const RECENT_LIMIT: usize = 10;

#[derive(Debug, Serialize)]
struct StatsReport {
    total_records: usize,
    total_seconds: i64,
    total_hours: f64,
    effective_days: usize,
    days_with_records: usize,
    effective_day_hours: f64,
}

pub fn run<S: KeyValueStore, W: Write>(
    tracker: &Tracker<S>,
    writer: &mut W,
    json: bool,
) -> Result<()> {
    let stats = tracker.statistics();
    let threshold = tracker.config().effective_day_threshold;

    if json {
        let report = StatsReport {
            total_records: stats.total_records,
            total_seconds: stats.total_duration.num_seconds(),
            total_hours: to_hours_f64(stats.total_duration),
            effective_days: stats.effective_days,
            days_with_records: stats.days_with_records,
            effective_day_hours: to_hours_f64(threshold),
        };
        let json = serde_json::to_string_pretty(&report).context("failed to serialize stats")?;
        writeln!(writer, "{json}")?;
        return Ok(());
    }

    writeln!(writer, "Records:        {}", stats.total_records)?;
    writeln!(
        writer,
        "Total time:     {}",
        format_record_duration(stats.total_duration)
    )?;
    writeln!(
        writer,
        "Effective days: {} (at least {})",
        stats.effective_days,
        format_total(threshold)
    )?;
    writeln!(writer, "Days tracked:   {}", stats.days_with_records)?;

    let recent = tracker.records().sorted_newest_first();
    if recent.is_empty() {
        return Ok(());
    }

    let today = local_day(tracker.now());
    writeln!(writer)?;
    writeln!(writer, "Recent:")?;
    for record in recent.into_iter().take(RECENT_LIMIT) {
        let label = tracker
            .records()
            .day_label(record.id(), today)
            .map(format_day_label)
            .unwrap_or_default();
        writeln!(
            writer,
            "  {label:<14} {}  {:>5}",
            format_span(record),
            format_record_duration(record.duration())
        )?;
    }
    Ok(())
}
