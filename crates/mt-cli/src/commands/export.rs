//! Export command: write every record as a JSON document.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use mt_core::{KeyValueStore, Tracker};

/// Writes the export document to `output`, or to `writer` when no path is given.
pub fn run<S: KeyValueStore, W: Write>(
    tracker: &Tracker<S>,
    writer: &mut W,
    output: Option<&Path>,
) -> Result<()> {
    let document = tracker.export();
    let json = document.to_json()?;

    match output {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            writeln!(
                writer,
                "Exported {} records to {}.",
                document.records.len(),
                path.display()
            )?;
        }
        None => writeln!(writer, "{json}")?,
    }
    Ok(())
}
