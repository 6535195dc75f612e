//! CLI subcommand implementations.

pub mod calendar;
pub mod clear;
pub mod export;
pub mod format;
pub mod import;
pub mod records;
pub mod stats;
pub mod status;
pub mod tracking;
pub mod util;
pub mod watch;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

    use mt_core::{
        ManualClock, MemoryStore, RecordId, TimeRecord, Tracker, TrackerConfig, local_instant,
    };

    pub fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    /// Local wall-clock time on `day`, so rendered times are zone-independent.
    pub fn at(day: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
        local_instant(day, NaiveTime::from_hms_opt(hour, minute, 0).unwrap()).unwrap()
    }

    pub fn tracker_at(now: DateTime<Utc>) -> (Tracker<MemoryStore>, ManualClock) {
        let clock = ManualClock::new(now);
        let tracker = Tracker::load(
            MemoryStore::new(),
            Arc::new(clock.clone()),
            TrackerConfig::default(),
        );
        (tracker, clock)
    }

    pub fn add(
        tracker: &mut Tracker<MemoryStore>,
        id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) {
        let record = TimeRecord::with_id(RecordId::new(id).unwrap(), start, end).unwrap();
        tracker.add_record(record);
    }
}
