//! The tracker: one session, one record collection, one persistence backend.
//!
//! Every command follows the same sequence: mutate in memory, persist (best
//! effort), then notify subscribers. In-memory state is authoritative; a
//! failed write is logged and otherwise ignored.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::export::ExportDocument;
use crate::kv::{KeyValueStore, KvWrite};
use crate::persist::{self, PersistenceError};
use crate::record::TimeRecord;
use crate::refresh::RefreshTimer;
use crate::session::{SessionState, TrackingSession};
use crate::store::{RecordStore, Statistics, UpdateOutcome};
use crate::types::{RecordId, ValidationError};

const CHANGE_CAPACITY: usize = 64;

/// Tunables for a [`Tracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Minimum daily total for a day to count as effective.
    pub effective_day_threshold: Duration,
    /// Cadence of [`Change::Tick`] while running.
    pub refresh_interval: StdDuration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            effective_day_threshold: Duration::hours(4),
            refresh_interval: StdDuration::from_secs(1),
        }
    }
}

/// Notification sent to subscribers after state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// The session moved to a new state.
    Session(SessionState),
    /// The record collection changed.
    Records,
    /// Periodic elapsed time while running.
    Tick(Duration),
}

pub struct Tracker<S> {
    store: S,
    clock: Arc<dyn Clock>,
    config: TrackerConfig,
    session: TrackingSession,
    records: RecordStore,
    changes: broadcast::Sender<Change>,
    refresh: RefreshTimer,
}

impl<S: KeyValueStore> Tracker<S> {
    /// Loads records and session from `store`.
    ///
    /// Unreadable or inconsistent state falls back to an empty collection
    /// and an idle session. Records that fail to decode are left out, and
    /// the stored collection is backed up first so the next write cannot
    /// destroy them. A running session resumes measuring from its persisted
    /// start.
    pub fn load(mut store: S, clock: Arc<dyn Clock>, config: TrackerConfig) -> Self {
        let records = match persist::load_records(&store) {
            Ok(loaded) if loaded.skipped == 0 => loaded.records,
            Ok(loaded) => {
                warn!(skipped = loaded.skipped, "some records could not be loaded");
                Self::backup_records(&mut store);
                loaded.records
            }
            Err(e @ PersistenceError::Decode { .. }) => {
                warn!(error = %e, "could not decode records, starting empty");
                Self::backup_records(&mut store);
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "could not load records, starting empty");
                Vec::new()
            }
        };
        let session = persist::load_session(&store).unwrap_or_else(|e| {
            warn!(error = %e, "could not load session, starting idle");
            TrackingSession::idle()
        });

        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        let mut tracker = Self {
            store,
            clock,
            config,
            session,
            records: RecordStore::from_records(records),
            changes,
            refresh: RefreshTimer::new(config.refresh_interval),
        };

        debug!(
            records = tracker.records.total_records(),
            state = %tracker.session.state(),
            elapsed_ms = tracker.elapsed().num_milliseconds(),
            "tracker loaded"
        );
        tracker.arm_refresh();
        tracker
    }

    // ========== Session commands ==========

    pub fn start(&mut self) -> bool {
        let now = self.clock.now();
        if !self.session.start(now) {
            return false;
        }
        self.save_session();
        self.arm_refresh();
        self.notify(Change::Session(SessionState::Running));
        true
    }

    pub fn pause(&mut self) -> bool {
        let now = self.clock.now();
        if !self.session.pause(now) {
            return false;
        }
        self.refresh.disarm();
        self.save_session();
        self.notify(Change::Session(SessionState::Paused));
        true
    }

    pub fn resume(&mut self) -> bool {
        let now = self.clock.now();
        if !self.session.resume(now) {
            return false;
        }
        self.save_session();
        self.arm_refresh();
        self.notify(Change::Session(SessionState::Running));
        true
    }

    /// Ends the session and files the finished record.
    ///
    /// Returns `None` when nothing was tracking or no time had elapsed.
    pub fn stop(&mut self) -> Option<TimeRecord> {
        let now = self.clock.now();
        let (changed, record) = self.session.stop(now);
        if !changed {
            return None;
        }
        self.refresh.disarm();

        match &record {
            Some(record) => {
                self.records.add(record.clone());
                info!(id = %record.id(), minutes = record.duration_minutes(), "record saved");
                let writes = self.records_writes().and_then(|mut writes| {
                    writes.extend(persist::session_writes(&self.session)?);
                    Ok(writes)
                });
                self.save(writes);
                self.notify(Change::Records);
            }
            None => self.save_session(),
        }
        self.notify(Change::Session(SessionState::Idle));
        record
    }

    /// Abandons the session without producing a record.
    pub fn reset(&mut self) -> bool {
        if !self.session.reset() {
            return false;
        }
        self.refresh.disarm();
        self.save_session();
        self.notify(Change::Session(SessionState::Idle));
        true
    }

    // ========== Record commands ==========

    pub fn add_record(&mut self, record: TimeRecord) {
        self.records.add(record);
        self.records_changed();
    }

    /// Adds a record from local wall-clock times on `day`.
    pub fn add_manual_record(
        &mut self,
        day: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<TimeRecord, ValidationError> {
        let record = TimeRecord::on_day(day, start, end)?;
        self.add_record(record.clone());
        Ok(record)
    }

    pub fn update_record(
        &mut self,
        id: &RecordId,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<UpdateOutcome, ValidationError> {
        let outcome = self.records.update(id, start_time, end_time)?;
        self.records_changed();
        Ok(outcome)
    }

    pub fn delete_record(&mut self, id: &RecordId) -> bool {
        if !self.records.delete(id) {
            return false;
        }
        self.records_changed();
        true
    }

    pub fn replace_all(&mut self, records: Vec<TimeRecord>) {
        self.records.replace_all(records);
        self.records_changed();
    }

    /// Replaces the whole collection with the document's records.
    ///
    /// The document is already validated, so this cannot fail halfway.
    pub fn import(&mut self, document: ExportDocument) -> usize {
        let count = document.records.len();
        self.replace_all(document.records);
        info!(count, "records imported");
        count
    }

    pub fn export(&self) -> ExportDocument {
        ExportDocument::new(self.records.records().to_vec(), self.clock.now())
    }

    /// Deletes every record and resets the session.
    pub fn clear_all(&mut self) {
        self.refresh.disarm();
        self.records.clear();
        self.session.reset();

        let writes = self.records_writes().and_then(|mut writes| {
            writes.extend(persist::session_writes(&self.session)?);
            Ok(writes)
        });
        self.save(writes);
        info!("all data cleared");
        self.notify(Change::Records);
        self.notify(Change::Session(SessionState::Idle));
    }

    // ========== Lifecycle ==========

    /// Captures state before the process is suspended.
    pub fn on_enter_background(&mut self) {
        let elapsed = self.elapsed();
        self.refresh.disarm();
        self.save_session();
        debug!(
            state = %self.session.state(),
            elapsed_ms = elapsed.num_milliseconds(),
            "entered background"
        );
    }

    /// Recomputes elapsed time after suspension and restarts ticking.
    pub fn on_enter_foreground(&mut self) {
        let elapsed = self.elapsed();
        debug!(
            state = %self.session.state(),
            elapsed_ms = elapsed.num_milliseconds(),
            "entered foreground"
        );
        self.arm_refresh();
        self.save_session();
        self.notify(Change::Session(self.session.state()));
        if self.session.is_tracking() {
            self.notify(Change::Tick(elapsed));
        }
    }

    /// Re-reads the persisted session to pick up commands issued by another
    /// process sharing the store. Returns whether the session changed.
    pub fn reload_session(&mut self) -> bool {
        let session = match persist::load_session(&self.store) {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "could not reload session");
                return false;
            }
        };
        if session == self.session {
            return false;
        }

        debug!(
            from = %self.session.state(),
            to = %session.state(),
            "session changed elsewhere"
        );
        self.session = session;
        self.refresh.disarm();
        self.arm_refresh();
        self.notify(Change::Session(self.session.state()));
        true
    }

    // ========== Queries ==========

    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.changes.subscribe()
    }

    pub const fn session(&self) -> &TrackingSession {
        &self.session
    }

    pub const fn records(&self) -> &RecordStore {
        &self.records
    }

    pub const fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Current instant according to the tracker's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn elapsed(&self) -> Duration {
        self.session.elapsed(self.clock.now())
    }

    pub fn statistics(&self) -> Statistics {
        self.records.statistics(self.config.effective_day_threshold)
    }

    pub fn is_refresh_armed(&self) -> bool {
        self.refresh.is_armed()
    }

    /// Hands back the persistence backend.
    pub fn into_store(self) -> S {
        self.store
    }

    // ========== Internals ==========

    fn arm_refresh(&mut self) {
        if let Some(since) = self.session.running_since() {
            self.refresh
                .arm(since, Arc::clone(&self.clock), self.changes.clone());
        }
    }

    fn backup_records(store: &mut S) {
        match persist::backup_records(store) {
            Ok(_) => warn!(
                key = persist::RECORDS_BACKUP_KEY,
                "unreadable records backed up"
            ),
            Err(e) => warn!(error = %e, "failed to back up unreadable records"),
        }
    }

    fn records_writes(&self) -> Result<Vec<KvWrite>, PersistenceError> {
        persist::records_writes(self.records.records())
    }

    fn records_changed(&mut self) {
        let writes = self.records_writes();
        self.save(writes);
        self.notify(Change::Records);
    }

    fn save_session(&mut self) {
        let writes = persist::session_writes(&self.session);
        self.save(writes);
    }

    fn save(&mut self, writes: Result<Vec<KvWrite>, PersistenceError>) {
        let result = writes.and_then(|writes| persist::save(&mut self.store, &writes));
        if let Err(e) = result {
            warn!(error = %e, "failed to persist state");
        }
    }

    fn notify(&self, change: Change) {
        // Sending only fails when nobody is subscribed.
        let _ = self.changes.send(change);
    }
}
