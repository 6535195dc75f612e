//! Import command: replace all records with those from an export file.

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};

use mt_core::{ExportDocument, KeyValueStore, Tracker};

use super::util::confirm;

/// Reads and validates `path`, then replaces the collection after confirmation.
///
/// An invalid file is rejected before anything is touched.
pub fn run<S: KeyValueStore, R: BufRead, W: Write>(
    tracker: &mut Tracker<S>,
    reader: &mut R,
    writer: &mut W,
    path: &Path,
    yes: bool,
) -> Result<()> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let document = ExportDocument::from_json(&json, tracker.now())
        .with_context(|| format!("invalid export file {}", path.display()))?;

    let existing = tracker.records().total_records();
    if !yes && existing > 0 {
        let prompt = format!(
            "Replace {existing} existing records with {} imported records?",
            document.records.len()
        );
        if !confirm(reader, writer, &prompt)? {
            writeln!(writer, "Import cancelled.")?;
            return Ok(());
        }
    }

    let count = tracker.import(document);
    writeln!(writer, "Imported {count} records.")?;
    Ok(())
}
