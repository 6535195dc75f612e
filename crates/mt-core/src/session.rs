//! The single in-progress tracking session.
//!
//! Elapsed time is never accumulated tick by tick. A running session stores
//! only the instant it (effectively) started; resuming after a pause moves
//! that instant forward by the paused gap, so `now - start` is always the
//! answer. This keeps the session correct across suspension and restarts.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::record::TimeRecord;

/// Coarse state of a [`TrackingSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Running,
    Paused,
}

impl SessionState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The tracking state machine.
///
/// Invariants: paused implies tracking, and a start instant is present
/// exactly when tracking. Operations that would break them are no-ops and
/// return `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingSession {
    is_tracking: bool,
    is_paused: bool,
    current_start_time: Option<DateTime<Utc>>,
    paused_elapsed: Duration,
}

impl Default for TrackingSession {
    fn default() -> Self {
        Self::idle()
    }
}

impl TrackingSession {
    pub const fn idle() -> Self {
        Self {
            is_tracking: false,
            is_paused: false,
            current_start_time: None,
            paused_elapsed: Duration::zero(),
        }
    }

    /// Rebuilds a session from persisted fields.
    ///
    /// Returns `None` when the fields violate the session invariants or the
    /// paused elapsed time is negative.
    pub fn restore(
        is_tracking: bool,
        is_paused: bool,
        current_start_time: Option<DateTime<Utc>>,
        paused_elapsed: Duration,
    ) -> Option<Self> {
        if paused_elapsed < Duration::zero() {
            return None;
        }
        match (is_tracking, is_paused, current_start_time) {
            (false, false, None) => Some(Self::idle()),
            (true, _, Some(_)) => Some(Self {
                is_tracking,
                is_paused,
                current_start_time,
                paused_elapsed: if is_paused { paused_elapsed } else { Duration::zero() },
            }),
            _ => None,
        }
    }

    pub const fn is_tracking(&self) -> bool {
        self.is_tracking
    }

    pub const fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub const fn current_start_time(&self) -> Option<DateTime<Utc>> {
        self.current_start_time
    }

    pub const fn paused_elapsed(&self) -> Duration {
        self.paused_elapsed
    }

    pub const fn state(&self) -> SessionState {
        match (self.is_tracking, self.is_paused) {
            (true, true) => SessionState::Paused,
            (true, false) => SessionState::Running,
            _ => SessionState::Idle,
        }
    }

    /// Elapsed tracked time at `now`.
    ///
    /// Zero when idle, frozen while paused, and `now - start` (never
    /// negative) while running.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        match (self.state(), self.current_start_time) {
            (SessionState::Paused, _) => self.paused_elapsed,
            (SessionState::Running, Some(start)) => (now - start).max(Duration::zero()),
            _ => Duration::zero(),
        }
    }

    /// Opens a new session at `now`. No-op while tracking.
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_tracking {
            debug!("start ignored: already tracking");
            return false;
        }
        *self = Self {
            is_tracking: true,
            is_paused: false,
            current_start_time: Some(now),
            paused_elapsed: Duration::zero(),
        };
        debug!(start = %now, "session started");
        true
    }

    /// Freezes elapsed time. Only valid while running.
    pub fn pause(&mut self, now: DateTime<Utc>) -> bool {
        if self.state() != SessionState::Running {
            debug!(state = %self.state(), "pause ignored");
            return false;
        }
        self.paused_elapsed = self.elapsed(now);
        self.is_paused = true;
        debug!(elapsed_ms = self.paused_elapsed.num_milliseconds(), "session paused");
        true
    }

    /// Continues a paused session, shifting its start past the pause.
    pub fn resume(&mut self, now: DateTime<Utc>) -> bool {
        if self.state() != SessionState::Paused {
            debug!(state = %self.state(), "resume ignored");
            return false;
        }
        self.current_start_time = Some(now - self.paused_elapsed);
        self.paused_elapsed = Duration::zero();
        self.is_paused = false;
        debug!("session resumed");
        true
    }

    /// Closes the session and returns the finished record.
    ///
    /// The record spans `(current_start_time, now)`, so it stays on the day
    /// the session began. Returns `None` when not tracking or when no time
    /// elapsed; the returned flag reports whether state changed.
    pub fn stop(&mut self, now: DateTime<Utc>) -> (bool, Option<TimeRecord>) {
        let Some(start) = self.current_start_time.filter(|_| self.is_tracking) else {
            debug!("stop ignored: not tracking");
            return (false, None);
        };
        *self = Self::idle();

        match TimeRecord::new(start, now) {
            Ok(record) => {
                debug!(elapsed_ms = (now - start).num_milliseconds(), "session stopped");
                (true, Some(record))
            }
            Err(e) => {
                debug!(error = %e, "session stopped without a record");
                (true, None)
            }
        }
    }

    /// Discards the session without producing a record.
    pub fn reset(&mut self) -> bool {
        let changed = *self != Self::idle();
        *self = Self::idle();
        if changed {
            debug!("session reset");
        }
        changed
    }

    /// Start instant to measure from while running, used by the refresh timer.
    pub fn running_since(&self) -> Option<DateTime<Utc>> {
        match self.state() {
            SessionState::Running => self.current_start_time,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-05-05T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn secs(n: i64) -> Duration {
        Duration::seconds(n)
    }

    #[test]
    fn test_idle_elapsed_is_zero() {
        let session = TrackingSession::idle();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.elapsed(t0()), Duration::zero());
    }

    #[test]
    fn test_running_elapsed_is_wall_clock_delta() {
        let mut session = TrackingSession::idle();
        assert!(session.start(t0()));
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(session.elapsed(t0() + secs(42)), secs(42));
        assert_eq!(session.elapsed(t0() - secs(5)), Duration::zero());
    }

    #[test]
    fn test_pause_resume_continuity() {
        let mut session = TrackingSession::idle();
        session.start(t0());
        assert!(session.pause(t0() + secs(600)));
        assert_eq!(session.elapsed(t0() + secs(5000)), secs(600));

        assert!(session.resume(t0() + secs(1800)));
        assert_eq!(session.current_start_time(), Some(t0() + secs(1200)));
        assert_eq!(session.elapsed(t0() + secs(2100)), secs(900));

        let (changed, record) = session.stop(t0() + secs(2100));
        assert!(changed);
        let record = record.unwrap();
        assert_eq!(record.duration(), secs(900));
        assert_eq!(record.end_time(), t0() + secs(2100));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_guarded_commands_are_idempotent() {
        let mut session = TrackingSession::idle();
        assert!(!session.pause(t0()));
        assert!(!session.resume(t0()));
        assert_eq!(session.stop(t0()), (false, None));
        assert!(!session.reset());

        session.start(t0());
        let snapshot = session.clone();
        assert!(!session.start(t0() + secs(10)));
        assert!(!session.resume(t0() + secs(10)));
        assert_eq!(session, snapshot);

        session.pause(t0() + secs(20));
        let snapshot = session.clone();
        assert!(!session.pause(t0() + secs(30)));
        assert_eq!(session, snapshot);
    }

    #[test]
    fn test_stop_while_paused_keeps_session_start() {
        let mut session = TrackingSession::idle();
        session.start(t0());
        session.pause(t0() + secs(300));

        let (_, record) = session.stop(t0() + secs(1000));
        let record = record.unwrap();

        assert_eq!(record.start_time(), t0());
        assert_eq!(record.end_time(), t0() + secs(1000));
        assert_eq!(record.date(), t0());
    }

    #[test]
    fn test_zero_length_stop_yields_no_record() {
        let mut session = TrackingSession::idle();
        session.start(t0());
        let (changed, record) = session.stop(t0());
        assert!(changed);
        assert!(record.is_none());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_reset_discards_session() {
        let mut session = TrackingSession::idle();
        session.start(t0());
        session.pause(t0() + secs(60));
        assert!(session.reset());
        assert_eq!(session, TrackingSession::idle());
    }

    #[test]
    fn test_stop_at_3723_seconds() {
        let mut session = TrackingSession::idle();
        session.start(t0());
        let (_, record) = session.stop(t0() + secs(3723));
        let parts = crate::duration::DurationParts::from(record.unwrap().duration());
        assert_eq!((parts.hours, parts.minutes), (1, 2));
    }

    #[test]
    fn test_restore_rejects_broken_invariants() {
        assert!(TrackingSession::restore(false, true, None, Duration::zero()).is_none());
        assert!(TrackingSession::restore(true, false, None, Duration::zero()).is_none());
        assert!(TrackingSession::restore(false, false, Some(t0()), Duration::zero()).is_none());
        assert!(TrackingSession::restore(true, true, Some(t0()), secs(-1)).is_none());

        let paused = TrackingSession::restore(true, true, Some(t0()), secs(30)).unwrap();
        assert_eq!(paused.elapsed(t0() + secs(9999)), secs(30));

        let running = TrackingSession::restore(true, false, Some(t0()), secs(30)).unwrap();
        assert_eq!(running.paused_elapsed(), Duration::zero());
        assert_eq!(running.running_since(), Some(t0()));
    }
}
