//! Watch command: a live timer that redraws on every refresh tick.
//!
//! Entering the command is the foreground signal and leaving it (Ctrl-C or
//! the session ending) is the background signal, so elapsed time is always
//! recomputed from the persisted start rather than from ticks. Each tick also
//! re-reads the persisted session, so `mt pause` or `mt stop` run from
//! another terminal ends the watch.

use std::future::Future;
use std::io::Write;

use anyhow::Result;
use tokio::sync::broadcast::error::RecvError;

use mt_core::{Change, KeyValueStore, SessionState, Tracker};

use super::format::{format_clock, hour_progress, progress_bar};

/// Redraws the timer until `shutdown` resolves or the channel closes.
pub async fn run<S, W, F>(tracker: &mut Tracker<S>, writer: &mut W, shutdown: F) -> Result<()>
where
    S: KeyValueStore,
    W: Write,
    F: Future<Output = ()>,
{
    let mut changes = tracker.subscribe();
    tracker.on_enter_foreground();

    match tracker.state() {
        SessionState::Running => {}
        SessionState::Idle => {
            writeln!(writer, "Not tracking.")?;
            tracker.on_enter_background();
            return Ok(());
        }
        SessionState::Paused => {
            writeln!(
                writer,
                "Paused at {}. Resume to watch the timer.",
                format_clock(tracker.elapsed())
            )?;
            tracker.on_enter_background();
            return Ok(());
        }
    }

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            change = changes.recv() => match change {
                Ok(Change::Tick(elapsed)) => {
                    if tracker.reload_session() {
                        continue;
                    }
                    write!(
                        writer,
                        "\r{} [{}]",
                        format_clock(elapsed),
                        progress_bar(hour_progress(elapsed))
                    )?;
                    writer.flush()?;
                }
                Ok(Change::Session(SessionState::Running) | Change::Records) => {}
                Ok(Change::Session(SessionState::Paused)) => {
                    writeln!(writer, "\nSession paused.")?;
                    break;
                }
                Ok(Change::Session(SessionState::Idle)) => {
                    writeln!(writer, "\nSession stopped.")?;
                    break;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "watch fell behind, skipping ticks");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    tracker.on_enter_background();
    writeln!(writer)?;
    Ok(())
}
