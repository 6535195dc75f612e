//! Session commands: `start`, `pause`, `resume`, `stop`, `reset`.

use std::io::Write;

use anyhow::Result;
use chrono::Local;

use mt_core::{KeyValueStore, SessionState, Tracker, local_day};

use super::format::{format_clock, format_record_duration, format_span, format_total};

pub fn start<S: KeyValueStore, W: Write>(tracker: &mut Tracker<S>, writer: &mut W) -> Result<()> {
    if tracker.start() {
        let at = tracker.now().with_timezone(&Local);
        writeln!(writer, "Started tracking at {}.", at.format("%H:%M"))?;
    } else {
        writeln!(
            writer,
            "Already tracking ({}, {}).",
            tracker.state(),
            format_clock(tracker.elapsed())
        )?;
    }
    Ok(())
}

pub fn pause<S: KeyValueStore, W: Write>(tracker: &mut Tracker<S>, writer: &mut W) -> Result<()> {
    if tracker.pause() {
        writeln!(writer, "Paused at {}.", format_clock(tracker.elapsed()))?;
    } else {
        writeln!(writer, "Nothing to pause ({}).", tracker.state())?;
    }
    Ok(())
}

pub fn resume<S: KeyValueStore, W: Write>(tracker: &mut Tracker<S>, writer: &mut W) -> Result<()> {
    if tracker.resume() {
        writeln!(writer, "Resumed at {}.", format_clock(tracker.elapsed()))?;
    } else {
        writeln!(writer, "Nothing to resume ({}).", tracker.state())?;
    }
    Ok(())
}

pub fn stop<S: KeyValueStore, W: Write>(tracker: &mut Tracker<S>, writer: &mut W) -> Result<()> {
    if tracker.state() == SessionState::Idle {
        writeln!(writer, "Not tracking.")?;
        return Ok(());
    }

    match tracker.stop() {
        Some(record) => {
            writeln!(
                writer,
                "Stopped. Saved {} ({}) as {}.",
                format_span(&record),
                format_record_duration(record.duration()),
                record.id()
            )?;
            let today = local_day(tracker.now());
            writeln!(
                writer,
                "Today: {}",
                format_total(tracker.records().total_duration_for_date(today))
            )?;
        }
        None => writeln!(writer, "Stopped. Nothing to save.")?,
    }
    Ok(())
}

pub fn reset<S: KeyValueStore, W: Write>(tracker: &mut Tracker<S>, writer: &mut W) -> Result<()> {
    if tracker.reset() {
        writeln!(writer, "Session discarded.")?;
    } else {
        writeln!(writer, "Not tracking.")?;
    }
    Ok(())
}
