//! Periodic elapsed-time ticks for live displays.
//!
//! Ticks are a rendering cadence only. The task owns a copy of the running
//! session's start instant and a clock, and reports `now - start` each
//! period; it never feeds anything back into the session.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::clock::Clock;
use crate::tracker::Change;

const MIN_INTERVAL: StdDuration = StdDuration::from_millis(10);

#[derive(Debug)]
pub struct RefreshTimer {
    interval: StdDuration,
    task: Option<JoinHandle<()>>,
}

impl RefreshTimer {
    pub fn new(interval: StdDuration) -> Self {
        Self {
            interval: interval.max(MIN_INTERVAL),
            task: None,
        }
    }

    /// Starts ticking elapsed time measured from `since`.
    ///
    /// Replaces any running task. Returns `false` (and stays disarmed) when
    /// called outside a tokio runtime.
    pub fn arm(
        &mut self,
        since: DateTime<Utc>,
        clock: Arc<dyn Clock>,
        changes: broadcast::Sender<Change>,
    ) -> bool {
        self.disarm();
        let Ok(handle) = Handle::try_current() else {
            debug!("no async runtime, refresh timer stays disarmed");
            return false;
        };

        let period = self.interval;
        self.task = Some(handle.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let elapsed = (clock.now() - since).max(Duration::zero());
                // No subscribers is fine; a display may attach later.
                let _ = changes.send(Change::Tick(elapsed));
            }
        }));
        debug!(interval_ms = period.as_millis(), "refresh timer armed");
        true
    }

    pub fn disarm(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("refresh timer disarmed");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}
