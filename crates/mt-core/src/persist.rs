//! Encoding of records and session state into key-value entries.
//!
//! Every value is JSON. Keys:
//!
//! | key                 | value                                   |
//! |---------------------|-----------------------------------------|
//! | `records`           | array of records                        |
//! | `isTracking`        | bool                                    |
//! | `isPaused`          | bool                                    |
//! | `startTime`         | RFC 3339 timestamp, absent when idle    |
//! | `pausedElapsedTime` | seconds as a float                      |
//!
//! When `records` cannot be read in full, its raw bytes are copied to
//! `records.unreadable` before anything overwrites them.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

use crate::duration::{from_seconds_f64, to_seconds_f64};
use crate::kv::{KeyValueStore, KvWrite, StoreError};
use crate::record::TimeRecord;
use crate::session::TrackingSession;

pub const RECORDS_KEY: &str = "records";
pub const IS_TRACKING_KEY: &str = "isTracking";
pub const IS_PAUSED_KEY: &str = "isPaused";
pub const START_TIME_KEY: &str = "startTime";
pub const PAUSED_ELAPSED_KEY: &str = "pausedElapsedTime";
pub const RECORDS_BACKUP_KEY: &str = "records.unreadable";

/// Errors reading or writing persisted state.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read `{key}`")]
    Read {
        key: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("failed to decode `{key}`")]
    Decode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("persisted session is inconsistent: {0}")]
    InvalidSession(&'static str),

    #[error("failed to encode `{key}`")]
    Encode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write state")]
    Write(#[source] StoreError),
}

fn load_json<T: DeserializeOwned>(
    store: &impl KeyValueStore,
    key: &'static str,
) -> Result<Option<T>, PersistenceError> {
    let Some(bytes) = store
        .load(key)
        .map_err(|source| PersistenceError::Read { key, source })?
    else {
        return Ok(None);
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| PersistenceError::Decode { key, source })
}

fn put_json<T: serde::Serialize + ?Sized>(
    key: &'static str,
    value: &T,
) -> Result<KvWrite, PersistenceError> {
    let value =
        serde_json::to_vec(value).map_err(|source| PersistenceError::Encode { key, source })?;
    Ok(KvWrite::Put { key, value })
}

/// Records read from the store.
#[derive(Debug, Default)]
pub struct LoadedRecords {
    pub records: Vec<TimeRecord>,
    /// Entries that failed to decode and were left out.
    pub skipped: usize,
}

/// Reads the record collection. A missing key is an empty collection.
///
/// Entries are decoded one at a time, so a single bad record does not hide
/// the rest. Only a value that is not an array at all is an error.
pub fn load_records(store: &impl KeyValueStore) -> Result<LoadedRecords, PersistenceError> {
    let entries: Vec<serde_json::Value> = load_json(store, RECORDS_KEY)?.unwrap_or_default();
    let mut loaded = LoadedRecords::default();
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value(entry) {
            Ok(record) => loaded.records.push(record),
            Err(e) => {
                warn!(index, error = %e, "skipping unreadable record");
                loaded.skipped += 1;
            }
        }
    }
    Ok(loaded)
}

/// Copies the raw `records` value to [`RECORDS_BACKUP_KEY`].
///
/// Returns `false` when there was nothing to copy.
pub fn backup_records(store: &mut impl KeyValueStore) -> Result<bool, PersistenceError> {
    let Some(value) = store
        .load(RECORDS_KEY)
        .map_err(|source| PersistenceError::Read {
            key: RECORDS_KEY,
            source,
        })?
    else {
        return Ok(false);
    };
    save(
        store,
        &[KvWrite::Put {
            key: RECORDS_BACKUP_KEY,
            value,
        }],
    )?;
    Ok(true)
}

/// Reads the session. Missing keys load as idle.
pub fn load_session(store: &impl KeyValueStore) -> Result<TrackingSession, PersistenceError> {
    let is_tracking: bool = load_json(store, IS_TRACKING_KEY)?.unwrap_or(false);
    let is_paused: bool = load_json(store, IS_PAUSED_KEY)?.unwrap_or(false);
    let start_time: Option<DateTime<Utc>> = load_json(store, START_TIME_KEY)?;
    let paused_seconds: f64 = load_json(store, PAUSED_ELAPSED_KEY)?.unwrap_or(0.0);

    let paused_elapsed = from_seconds_f64(paused_seconds)
        .ok_or(PersistenceError::InvalidSession("paused elapsed time is not a valid duration"))?;

    TrackingSession::restore(is_tracking, is_paused, start_time, paused_elapsed)
        .ok_or(PersistenceError::InvalidSession("tracking flags disagree with start time"))
}

/// Batch replacing the record collection.
pub fn records_writes(records: &[TimeRecord]) -> Result<Vec<KvWrite>, PersistenceError> {
    Ok(vec![put_json(RECORDS_KEY, records)?])
}

/// Batch writing every session field. `startTime` is removed when idle.
pub fn session_writes(session: &TrackingSession) -> Result<Vec<KvWrite>, PersistenceError> {
    let mut writes = vec![
        put_json(IS_TRACKING_KEY, &session.is_tracking())?,
        put_json(IS_PAUSED_KEY, &session.is_paused())?,
        put_json(PAUSED_ELAPSED_KEY, &to_seconds_f64(session.paused_elapsed()))?,
    ];
    writes.push(match session.current_start_time() {
        Some(start) => put_json(START_TIME_KEY, &start)?,
        None => KvWrite::Remove {
            key: START_TIME_KEY,
        },
    });
    Ok(writes)
}

/// Applies a batch atomically.
pub fn save(store: &mut impl KeyValueStore, writes: &[KvWrite]) -> Result<(), PersistenceError> {
    store.save_all(writes).map_err(PersistenceError::Write)
}
