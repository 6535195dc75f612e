//! Calendar command: per-day progress toward an effective day.

use std::io::Write;

use anyhow::Result;
use chrono::{Datelike, NaiveDate};

use mt_core::{KeyValueStore, Tracker, local_day};

use super::format::{format_total, progress_bar};

pub fn run<S: KeyValueStore, W: Write>(
    tracker: &Tracker<S>,
    writer: &mut W,
    month: Option<NaiveDate>,
) -> Result<()> {
    let month = month.unwrap_or_else(|| local_day(tracker.now()));
    let threshold = tracker.config().effective_day_threshold;
    let days = tracker
        .records()
        .month_summary(month.year(), month.month(), threshold);

    writeln!(writer, "{}", month.format("%B %Y"))?;
    if days.is_empty() {
        writeln!(writer, "No records this month.")?;
        return Ok(());
    }

    for summary in &days {
        let marker = if summary.total >= threshold { " ✓" } else { "" };
        writeln!(
            writer,
            "  {} {}  [{}] {:>7}  ({} record{}){marker}",
            summary.day.format("%a"),
            summary.day.format("%d"),
            progress_bar(summary.progress),
            format_total(summary.total),
            summary.records,
            if summary.records == 1 { "" } else { "s" },
        )?;
    }

    let effective = days.iter().filter(|d| d.total >= threshold).count();
    writeln!(writer, "Effective days: {effective}/{}", days.len())?;
    Ok(())
}
