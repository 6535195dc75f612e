//! Completed time intervals.

use chrono::{DateTime, Duration, Local, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::duration::to_hours_f64;
use crate::types::{RecordId, ValidationError, ensure_ordered};

/// A completed, strictly positive time interval.
///
/// `date` is the instant the record is attributed to. It always equals
/// `start_time`: it is set on creation, on every edit and re-derived when a
/// record is decoded, so a record spanning midnight belongs to the day it
/// started on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawTimeRecord")]
pub struct TimeRecord {
    id: RecordId,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    date: DateTime<Utc>,
}

impl TimeRecord {
    /// Creates a record with a fresh ID.
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Result<Self, ValidationError> {
        Self::with_id(RecordId::generate(), start_time, end_time)
    }

    /// Creates a record with a caller-chosen ID.
    pub fn with_id(
        id: RecordId,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        ensure_ordered(start_time, end_time)?;
        Ok(Self {
            id,
            start_time,
            end_time,
            date: start_time,
        })
    }

    /// Creates a record from local wall-clock times on a calendar day.
    ///
    /// This is how manually entered records are built: the user picks a day
    /// and two times of day.
    pub fn on_day(day: NaiveDate, start: NaiveTime, end: NaiveTime) -> Result<Self, ValidationError> {
        Self::new(local_instant(day, start)?, local_instant(day, end)?)
    }

    pub const fn id(&self) -> &RecordId {
        &self.id
    }

    pub const fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub const fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    /// The instant this record is attributed to.
    pub const fn date(&self) -> DateTime<Utc> {
        self.date
    }

    /// Length of the interval. Always positive.
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Length of the interval in fractional hours.
    pub fn duration_hours(&self) -> f64 {
        to_hours_f64(self.duration())
    }

    /// Length of the interval in whole minutes, truncated.
    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// The local calendar day this record belongs to.
    pub fn local_day(&self) -> NaiveDate {
        local_day(self.date)
    }

    /// Moves the interval, keeping the ID.
    ///
    /// Leaves the record untouched when the new interval is invalid.
    pub fn reschedule(
        &mut self,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        ensure_ordered(start_time, end_time)?;
        self.start_time = start_time;
        self.end_time = end_time;
        self.date = start_time;
        Ok(())
    }
}

/// Returns the local calendar day containing `instant`.
pub fn local_day(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&Local).date_naive()
}

/// Resolves a local wall-clock time on `day` to an instant.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant.
pub fn local_instant(day: NaiveDate, time: NaiveTime) -> Result<DateTime<Utc>, ValidationError> {
    match Local.from_local_datetime(&day.and_time(time)) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Ok(dt.with_timezone(&Utc)),
        LocalResult::None => Err(ValidationError::NonexistentLocalTime { day, time }),
    }
}

/// Wire shape accepted when decoding records.
///
/// Interchange files may omit `id` (a fresh one is assigned) and `date`
/// (it is derived from `startTime` regardless).
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTimeRecord {
    #[serde(default = "RecordId::generate")]
    id: RecordId,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    #[serde(default)]
    #[allow(dead_code)]
    date: Option<DateTime<Utc>>,
}

impl TryFrom<RawTimeRecord> for TimeRecord {
    type Error = ValidationError;

    fn try_from(raw: RawTimeRecord) -> Result<Self, Self::Error> {
        Self::with_id(raw.id, raw.start_time, raw.end_time)
    }
}
