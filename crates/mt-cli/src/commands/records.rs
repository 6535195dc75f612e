//! Record commands: `records`, `add`, `edit`, `delete`.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveTime};

use mt_core::{KeyValueStore, RecordId, Tracker, UpdateOutcome, local_day};

use super::format::{format_day_heading, format_record_duration, format_span, format_total};
use super::util::parse_datetime_at;

/// Lists one day's records in start order.
pub fn list<S: KeyValueStore, W: Write>(
    tracker: &Tracker<S>,
    writer: &mut W,
    date: Option<NaiveDate>,
) -> Result<()> {
    let day = date.unwrap_or_else(|| local_day(tracker.now()));
    let records = tracker.records().records_for_date_sorted(day);

    writeln!(writer, "{}", format_day_heading(day))?;
    if records.is_empty() {
        writeln!(writer, "No records.")?;
        return Ok(());
    }

    for (index, record) in records.iter().enumerate() {
        writeln!(
            writer,
            "  #{:<2} {}  {:>5}  {}",
            index + 1,
            format_span(record),
            format_record_duration(record.duration()),
            record.id()
        )?;
    }
    writeln!(
        writer,
        "Total: {}",
        format_total(tracker.records().total_duration_for_date(day))
    )?;
    Ok(())
}

pub fn add<S: KeyValueStore, W: Write>(
    tracker: &mut Tracker<S>,
    writer: &mut W,
    date: Option<NaiveDate>,
    start: NaiveTime,
    end: NaiveTime,
) -> Result<()> {
    let day = date.unwrap_or_else(|| local_day(tracker.now()));
    let record = tracker
        .add_manual_record(day, start, end)
        .context("invalid record")?;
    writeln!(
        writer,
        "Added {} on {} ({}) as {}.",
        format_span(&record),
        day,
        format_record_duration(record.duration()),
        record.id()
    )?;
    Ok(())
}

pub fn edit<S: KeyValueStore, W: Write>(
    tracker: &mut Tracker<S>,
    writer: &mut W,
    id: &RecordId,
    start: &str,
    end: &str,
) -> Result<()> {
    let now = tracker.now();
    let start_time = parse_datetime_at(start, now).context("invalid --start")?;
    let end_time = parse_datetime_at(end, now).context("invalid --end")?;

    let outcome = tracker
        .update_record(id, start_time, end_time)
        .context("invalid record")?;
    let Some(record) = tracker.records().get(id) else {
        bail!("record {id} disappeared after update");
    };
    let verb = match outcome {
        UpdateOutcome::Updated => "Updated",
        UpdateOutcome::Inserted => "Created",
    };
    writeln!(
        writer,
        "{verb} {id}: {} on {} ({}).",
        format_span(record),
        record.local_day(),
        format_record_duration(record.duration())
    )?;
    Ok(())
}

pub fn delete<S: KeyValueStore, W: Write>(
    tracker: &mut Tracker<S>,
    writer: &mut W,
    id: &RecordId,
) -> Result<()> {
    if !tracker.delete_record(id) {
        bail!("no record with ID {id}");
    }
    writeln!(writer, "Deleted {id}.")?;
    Ok(())
}
