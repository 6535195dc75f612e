//! Clear command: delete every record and reset the session.

use std::io::{BufRead, Write};

use anyhow::Result;

use mt_core::{KeyValueStore, Tracker};

use super::util::confirm;

pub fn run<S: KeyValueStore, R: BufRead, W: Write>(
    tracker: &mut Tracker<S>,
    reader: &mut R,
    writer: &mut W,
    yes: bool,
) -> Result<()> {
    let count = tracker.records().total_records();
    if !yes {
        let prompt = format!("Delete all {count} records and reset the session?");
        if !confirm(reader, writer, &prompt)? {
            writeln!(writer, "Nothing deleted.")?;
            return Ok(());
        }
    }

    tracker.clear_all();
    writeln!(writer, "Deleted {count} records.")?;
    Ok(())
}
