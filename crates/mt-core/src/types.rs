//! Core type definitions with validation.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A record's start was not strictly before its end.
    #[error("start time {start} must be earlier than end time {end}")]
    StartNotBeforeEnd {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// A wall-clock time does not exist on the given local day (DST gap).
    #[error("{time} does not exist on {day} in the local timezone")]
    NonexistentLocalTime { day: NaiveDate, time: NaiveTime },
}

/// Rejects intervals that are empty or run backwards.
pub(crate) fn ensure_ordered(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(), ValidationError> {
    if start >= end {
        return Err(ValidationError::StartNotBeforeEnd { start, end });
    }
    Ok(())
}

/// Identifier of a [`TimeRecord`](crate::TimeRecord).
///
/// Assigned once at creation and never reassigned. Fresh ids are UUID v4
/// strings, but any non-empty string read back from storage is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Creates an ID after validation.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::Empty { field: "record id" });
        }
        Ok(Self(id))
    }

    /// Generates a fresh random ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RecordId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for RecordId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
