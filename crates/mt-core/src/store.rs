//! The collection of completed records and every query over it.
//!
//! All queries group by **local** calendar day of a record's `date`, so a
//! record that crosses midnight counts only toward the day it started on.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::duration::{to_hours_f64, to_seconds_f64};
use crate::record::TimeRecord;
use crate::types::{RecordId, ValidationError, ensure_ordered};

/// What [`RecordStore::update`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// An existing record was rescheduled.
    Updated,
    /// No record had the ID, so one was inserted with it.
    Inserted,
}

/// Per-day roll-up used by the calendar view.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySummary {
    pub day: NaiveDate,
    pub total: Duration,
    pub records: usize,
    /// Fraction of the effective-day threshold reached, capped at 1.0.
    pub progress: f64,
}

/// How a record is captioned in lists: relative day plus its rank that day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayLabel {
    Today(usize),
    Yesterday(usize),
    On(NaiveDate, usize),
}

/// Aggregate numbers shown on the statistics view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statistics {
    pub total_records: usize,
    pub total_duration: Duration,
    pub effective_days: usize,
    pub days_with_records: usize,
}

/// Completed records in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStore {
    records: Vec<TimeRecord>,
}

impl RecordStore {
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub const fn from_records(records: Vec<TimeRecord>) -> Self {
        Self { records }
    }

    // ========== Commands ==========

    /// Appends a record.
    pub fn add(&mut self, record: TimeRecord) {
        self.records.push(record);
    }

    /// Reschedules the record with `id`, or inserts one with that ID.
    ///
    /// The interval is validated first; on error the store is unchanged.
    pub fn update(
        &mut self,
        id: &RecordId,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<UpdateOutcome, ValidationError> {
        ensure_ordered(start_time, end_time)?;
        if let Some(record) = self.records.iter_mut().find(|r| r.id() == id) {
            record.reschedule(start_time, end_time)?;
            return Ok(UpdateOutcome::Updated);
        }
        self.records
            .push(TimeRecord::with_id(id.clone(), start_time, end_time)?);
        Ok(UpdateOutcome::Inserted)
    }

    /// Removes the first record with `id`. Returns whether one was removed.
    pub fn delete(&mut self, id: &RecordId) -> bool {
        match self.records.iter().position(|r| r.id() == id) {
            Some(index) => {
                self.records.remove(index);
                true
            }
            None => false,
        }
    }

    /// Replaces the whole collection.
    pub fn replace_all(&mut self, records: Vec<TimeRecord>) {
        self.records = records;
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    // ========== Queries ==========

    pub fn records(&self) -> &[TimeRecord] {
        &self.records
    }

    pub fn get(&self, id: &RecordId) -> Option<&TimeRecord> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records attributed to the local day `day`, in insertion order.
    pub fn records_for_date(&self, day: NaiveDate) -> Vec<&TimeRecord> {
        self.records
            .iter()
            .filter(|r| r.local_day() == day)
            .collect()
    }

    /// Records of `day` by ascending start time. Ties keep insertion order.
    pub fn records_for_date_sorted(&self, day: NaiveDate) -> Vec<&TimeRecord> {
        let mut records = self.records_for_date(day);
        records.sort_by_key(|r| r.start_time());
        records
    }

    pub fn has_record_for_date(&self, day: NaiveDate) -> bool {
        self.records.iter().any(|r| r.local_day() == day)
    }

    pub fn total_duration_for_date(&self, day: NaiveDate) -> Duration {
        self.records
            .iter()
            .filter(|r| r.local_day() == day)
            .map(TimeRecord::duration)
            .fold(Duration::zero(), |acc, d| acc + d)
    }

    pub fn total_duration(&self) -> Duration {
        self.records
            .iter()
            .map(TimeRecord::duration)
            .fold(Duration::zero(), |acc, d| acc + d)
    }

    pub fn total_records(&self) -> usize {
        self.records.len()
    }

    pub fn total_duration_hours(&self) -> f64 {
        to_hours_f64(self.total_duration())
    }

    /// Total duration per local day, for every day with at least one record.
    pub fn daily_totals(&self) -> BTreeMap<NaiveDate, Duration> {
        let mut totals = BTreeMap::new();
        for record in &self.records {
            *totals.entry(record.local_day()).or_insert_with(Duration::zero) += record.duration();
        }
        totals
    }

    /// Number of days whose total reaches `threshold` (inclusive).
    pub fn effective_day_count(&self, threshold: Duration) -> usize {
        self.daily_totals()
            .values()
            .filter(|total| **total >= threshold)
            .count()
    }

    /// 1-based position of the record among its day's records by start time.
    pub fn rank_in_day(&self, id: &RecordId) -> Option<usize> {
        let record = self.get(id)?;
        self.records_for_date_sorted(record.local_day())
            .iter()
            .position(|r| r.id() == id)
            .map(|index| index + 1)
    }

    /// All records by attributed instant, newest first. Ties keep insertion order.
    pub fn sorted_newest_first(&self) -> Vec<&TimeRecord> {
        let mut records: Vec<&TimeRecord> = self.records.iter().collect();
        records.sort_by(|a, b| b.date().cmp(&a.date()));
        records
    }

    /// Share of `threshold` reached on `day`, in `0.0..=1.0`.
    pub fn day_progress(&self, day: NaiveDate, threshold: Duration) -> f64 {
        progress(self.total_duration_for_date(day), threshold)
    }

    /// Summaries for every day of the month that has records.
    ///
    /// An invalid month yields an empty list.
    pub fn month_summary(&self, year: i32, month: u32, threshold: Duration) -> Vec<DaySummary> {
        let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
            return Vec::new();
        };

        let mut by_day: BTreeMap<NaiveDate, (Duration, usize)> = BTreeMap::new();
        for record in &self.records {
            let day = record.local_day();
            if day.year() == first.year() && day.month() == first.month() {
                let entry = by_day.entry(day).or_insert((Duration::zero(), 0));
                entry.0 += record.duration();
                entry.1 += 1;
            }
        }

        by_day
            .into_iter()
            .map(|(day, (total, records))| DaySummary {
                day,
                total,
                records,
                progress: progress(total, threshold),
            })
            .collect()
    }

    /// Caption for the record with `id` relative to `today`.
    pub fn day_label(&self, id: &RecordId, today: NaiveDate) -> Option<DayLabel> {
        let day = self.get(id)?.local_day();
        let rank = self.rank_in_day(id)?;
        let label = if day == today {
            DayLabel::Today(rank)
        } else if today.pred_opt() == Some(day) {
            DayLabel::Yesterday(rank)
        } else {
            DayLabel::On(day, rank)
        };
        Some(label)
    }

    pub fn statistics(&self, threshold: Duration) -> Statistics {
        let totals = self.daily_totals();
        Statistics {
            total_records: self.records.len(),
            total_duration: self.total_duration(),
            effective_days: totals.values().filter(|t| **t >= threshold).count(),
            days_with_records: totals.len(),
        }
    }
}

fn progress(total: Duration, threshold: Duration) -> f64 {
    if threshold <= Duration::zero() {
        return if total > Duration::zero() { 1.0 } else { 0.0 };
    }
    (to_seconds_f64(total) / to_seconds_f64(threshold)).min(1.0)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;
    use crate::record::local_instant;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(day: NaiveDate, h: u32, m: u32, s: u32) -> DateTime<Utc> {
        local_instant(day, NaiveTime::from_hms_opt(h, m, s).unwrap()).unwrap()
    }

    fn record(id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> TimeRecord {
        TimeRecord::with_id(RecordId::new(id).unwrap(), start, end).unwrap()
    }

    fn id(s: &str) -> RecordId {
        RecordId::new(s).unwrap()
    }

    #[test]
    fn test_record_crossing_midnight_belongs_to_start_day() {
        let d = day(2025, 1, 10);
        let next = day(2025, 1, 11);
        let store = RecordStore::from_records(vec![record("a", at(d, 23, 50, 0), at(next, 0, 10, 0))]);

        assert!(store.has_record_for_date(d));
        assert!(!store.has_record_for_date(next));
        assert_eq!(store.total_duration_for_date(d), Duration::minutes(20));
        assert_eq!(store.total_duration_for_date(next), Duration::zero());
    }

    #[test]
    fn test_effective_day_threshold_is_inclusive() {
        let d1 = day(2025, 1, 10);
        let d2 = day(2025, 1, 11);
        let store = RecordStore::from_records(vec![
            record("a", at(d1, 8, 0, 0), at(d1, 12, 0, 0)),
            record("b", at(d2, 8, 0, 0), at(d2, 11, 59, 59)),
        ]);

        assert_eq!(store.effective_day_count(Duration::hours(4)), 1);
    }

    #[test]
    fn test_effective_day_sums_multiple_records() {
        let d = day(2025, 1, 10);
        let store = RecordStore::from_records(vec![
            record("a", at(d, 8, 0, 0), at(d, 10, 0, 0)),
            record("b", at(d, 13, 0, 0), at(d, 15, 0, 0)),
        ]);

        assert_eq!(store.effective_day_count(Duration::hours(4)), 1);
        assert_eq!(store.daily_totals()[&d], Duration::hours(4));
    }

    #[test]
    fn test_sorted_by_start_and_rank() {
        let d = day(2025, 2, 3);
        let store = RecordStore::from_records(vec![
            record("late", at(d, 15, 0, 0), at(d, 16, 0, 0)),
            record("early", at(d, 9, 0, 0), at(d, 10, 0, 0)),
            record("mid", at(d, 12, 0, 0), at(d, 12, 30, 0)),
        ]);

        let ids: Vec<_> = store
            .records_for_date_sorted(d)
            .iter()
            .map(|r| r.id().as_str())
            .collect();
        assert_eq!(ids, ["early", "mid", "late"]);
        assert_eq!(store.rank_in_day(&id("mid")), Some(2));
        assert_eq!(store.rank_in_day(&id("missing")), None);
    }

    #[test]
    fn test_equal_starts_keep_insertion_order() {
        let d = day(2025, 2, 3);
        let store = RecordStore::from_records(vec![
            record("first", at(d, 9, 0, 0), at(d, 9, 30, 0)),
            record("second", at(d, 9, 0, 0), at(d, 10, 0, 0)),
        ]);

        let ids: Vec<_> = store
            .records_for_date_sorted(d)
            .iter()
            .map(|r| r.id().as_str())
            .collect();
        assert_eq!(ids, ["first", "second"]);
    }

    #[test]
    fn test_update_rejects_invalid_interval_without_change() {
        let d = day(2025, 2, 3);
        let mut store = RecordStore::from_records(vec![record("a", at(d, 9, 0, 0), at(d, 10, 0, 0))]);
        let before = store.clone();

        let result = store.update(&id("a"), at(d, 11, 0, 0), at(d, 10, 0, 0));
        assert!(result.is_err());
        assert_eq!(store, before);

        let result = store.update(&id("new"), at(d, 11, 0, 0), at(d, 11, 0, 0));
        assert!(result.is_err());
        assert_eq!(store, before);
    }

    #[test]
    fn test_update_is_upsert() {
        let d = day(2025, 2, 3);
        let mut store = RecordStore::from_records(vec![record("a", at(d, 9, 0, 0), at(d, 10, 0, 0))]);

        let outcome = store.update(&id("a"), at(d, 9, 30, 0), at(d, 10, 0, 0)).unwrap();
        assert_eq!(outcome, UpdateOutcome::Updated);
        assert_eq!(store.get(&id("a")).unwrap().duration(), Duration::minutes(30));

        let outcome = store.update(&id("b"), at(d, 11, 0, 0), at(d, 12, 0, 0)).unwrap();
        assert_eq!(outcome, UpdateOutcome::Inserted);
        assert_eq!(store.total_records(), 2);
        assert_eq!(store.get(&id("b")).unwrap().date(), at(d, 11, 0, 0));
    }

    #[test]
    fn test_delete_removes_first_match_only() {
        let d = day(2025, 2, 3);
        let mut store = RecordStore::from_records(vec![
            record("dup", at(d, 9, 0, 0), at(d, 10, 0, 0)),
            record("dup", at(d, 11, 0, 0), at(d, 12, 0, 0)),
        ]);

        assert!(store.delete(&id("dup")));
        assert_eq!(store.total_records(), 1);
        assert_eq!(store.records()[0].start_time(), at(d, 11, 0, 0));
        assert!(!store.delete(&id("nope")));
    }

    #[test]
    fn test_replace_all_leaves_no_residue() {
        let d = day(2025, 2, 3);
        let mut store = RecordStore::from_records(vec![
            record("old1", at(d, 9, 0, 0), at(d, 10, 0, 0)),
            record("old2", at(d, 11, 0, 0), at(d, 12, 0, 0)),
        ]);

        store.replace_all(vec![record("new", at(d, 13, 0, 0), at(d, 14, 0, 0))]);

        assert_eq!(store.total_records(), 1);
        assert!(store.get(&id("old1")).is_none());
        assert!(store.get(&id("new")).is_some());
    }

    #[test]
    fn test_totals() {
        let d1 = day(2025, 3, 1);
        let d2 = day(2025, 3, 2);
        let store = RecordStore::from_records(vec![
            record("a", at(d1, 9, 0, 0), at(d1, 10, 30, 0)),
            record("b", at(d2, 9, 0, 0), at(d2, 9, 30, 0)),
        ]);

        assert_eq!(store.total_duration(), Duration::hours(2));
        assert!((store.total_duration_hours() - 2.0).abs() < f64::EPSILON);
        assert_eq!(store.records_for_date(d2).len(), 1);
    }

    #[test]
    fn test_sorted_newest_first() {
        let d1 = day(2025, 3, 1);
        let d2 = day(2025, 3, 2);
        let store = RecordStore::from_records(vec![
            record("a", at(d1, 9, 0, 0), at(d1, 10, 0, 0)),
            record("b", at(d2, 9, 0, 0), at(d2, 10, 0, 0)),
            record("c", at(d1, 14, 0, 0), at(d1, 15, 0, 0)),
        ]);

        let ids: Vec<_> = store
            .sorted_newest_first()
            .iter()
            .map(|r| r.id().as_str())
            .collect();
        assert_eq!(ids, ["b", "c", "a"]);
    }

    #[test]
    fn test_day_progress_caps_at_one() {
        let d = day(2025, 3, 1);
        let store = RecordStore::from_records(vec![record("a", at(d, 8, 0, 0), at(d, 10, 0, 0))]);

        assert!((store.day_progress(d, Duration::hours(4)) - 0.5).abs() < f64::EPSILON);
        assert!((store.day_progress(d, Duration::hours(1)) - 1.0).abs() < f64::EPSILON);
        assert!(store.day_progress(day(2025, 3, 2), Duration::hours(4)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_month_summary_only_days_with_records() {
        let store = RecordStore::from_records(vec![
            record("a", at(day(2025, 4, 2), 9, 0, 0), at(day(2025, 4, 2), 13, 0, 0)),
            record("b", at(day(2025, 4, 2), 14, 0, 0), at(day(2025, 4, 2), 15, 0, 0)),
            record("c", at(day(2025, 4, 20), 9, 0, 0), at(day(2025, 4, 20), 10, 0, 0)),
            record("d", at(day(2025, 5, 1), 9, 0, 0), at(day(2025, 5, 1), 10, 0, 0)),
        ]);

        let summary = store.month_summary(2025, 4, Duration::hours(4));

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].day, day(2025, 4, 2));
        assert_eq!(summary[0].total, Duration::hours(5));
        assert_eq!(summary[0].records, 2);
        assert!((summary[0].progress - 1.0).abs() < f64::EPSILON);
        assert_eq!(summary[1].records, 1);
        assert!(store.month_summary(2025, 13, Duration::hours(4)).is_empty());
    }

    #[test]
    fn test_day_label() {
        let today = day(2025, 6, 10);
        let yesterday = day(2025, 6, 9);
        let earlier = day(2025, 6, 1);
        let store = RecordStore::from_records(vec![
            record("t2", at(today, 14, 0, 0), at(today, 15, 0, 0)),
            record("t1", at(today, 9, 0, 0), at(today, 10, 0, 0)),
            record("y", at(yesterday, 9, 0, 0), at(yesterday, 10, 0, 0)),
            record("e", at(earlier, 9, 0, 0), at(earlier, 10, 0, 0)),
        ]);

        assert_eq!(store.day_label(&id("t2"), today), Some(DayLabel::Today(2)));
        assert_eq!(store.day_label(&id("y"), today), Some(DayLabel::Yesterday(1)));
        assert_eq!(store.day_label(&id("e"), today), Some(DayLabel::On(earlier, 1)));
        assert_eq!(store.day_label(&id("zz"), today), None);
    }

    #[test]
    fn test_statistics_snapshot() {
        let d1 = day(2025, 3, 1);
        let d2 = day(2025, 3, 2);
        let store = RecordStore::from_records(vec![
            record("a", at(d1, 8, 0, 0), at(d1, 12, 30, 0)),
            record("b", at(d2, 9, 0, 0), at(d2, 10, 0, 0)),
        ]);

        let stats = store.statistics(Duration::hours(4));
        assert_eq!(
            stats,
            Statistics {
                total_records: 2,
                total_duration: Duration::minutes(330),
                effective_days: 1,
                days_with_records: 2,
            }
        );
    }

    #[test]
    fn test_empty_store() {
        let store = RecordStore::new();
        assert!(store.is_empty());
        assert_eq!(store.total_duration(), Duration::zero());
        assert_eq!(store.effective_day_count(Duration::hours(4)), 0);
        assert!(store.sorted_newest_first().is_empty());
    }
}
