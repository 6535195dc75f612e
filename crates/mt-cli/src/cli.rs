//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};

use mt_core::RecordId;

use crate::commands::util::{parse_clock_time, parse_month, parse_record_id};

/// Personal time tracker.
///
/// Start, pause and stop a timer; completed sessions are kept as records
/// and summarised per day.
#[derive(Debug, Parser)]
#[command(name = "mt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start a new tracking session.
    Start,

    /// Pause the running session.
    Pause,

    /// Resume a paused session.
    Resume,

    /// Stop the session and save it as a record.
    Stop,

    /// Discard the current session without saving it.
    Reset,

    /// Show the session and today's total.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show a live timer until interrupted.
    Watch,

    /// List records for one day (default: today).
    Records {
        /// Day to list (YYYY-MM-DD).
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Add a record manually.
    Add {
        /// Day of the record (YYYY-MM-DD, default: today).
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Local start time (HH:MM).
        #[arg(long, value_parser = parse_clock_time)]
        start: NaiveTime,

        /// Local end time (HH:MM).
        #[arg(long, value_parser = parse_clock_time)]
        end: NaiveTime,
    },

    /// Change a record's start and end.
    Edit {
        /// Record ID.
        #[arg(value_parser = parse_record_id)]
        id: RecordId,

        /// New start (RFC 3339, "YYYY-MM-DD HH:MM" or e.g. "2 hours ago").
        #[arg(long)]
        start: String,

        /// New end (same formats as --start).
        #[arg(long)]
        end: String,
    },

    /// Delete a record.
    Delete {
        /// Record ID.
        #[arg(value_parser = parse_record_id)]
        id: RecordId,
    },

    /// Show aggregate statistics.
    Stats {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show daily progress for a month.
    Calendar {
        /// Month to show (YYYY-MM, default: current month).
        #[arg(long, value_parser = parse_month)]
        month: Option<NaiveDate>,
    },

    /// Export all records as JSON.
    Export {
        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace all records with those from an export file.
    Import {
        /// Export file to read.
        path: PathBuf,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete all records and reset the session.
    Clear {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}
