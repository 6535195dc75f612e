//! JSON interchange document for backing up and restoring records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::TimeRecord;

/// Format version written into every export.
pub const EXPORT_VERSION: &str = "1.0.0";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export document is not valid JSON")]
    Malformed(#[source] serde_json::Error),

    #[error("record {index} is invalid")]
    InvalidRecord {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode export document")]
    Encode(#[source] serde_json::Error),
}

/// A full snapshot of the record collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub records: Vec<TimeRecord>,
}

/// Shape accepted on import. Records stay raw so a bad one can be reported
/// by position.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    export_date: Option<DateTime<Utc>>,
    records: Vec<serde_json::Value>,
}

fn default_version() -> String {
    EXPORT_VERSION.to_string()
}

impl ExportDocument {
    pub fn new(records: Vec<TimeRecord>, export_date: DateTime<Utc>) -> Self {
        Self {
            version: EXPORT_VERSION.to_string(),
            export_date,
            records,
        }
    }

    /// Pretty-printed JSON, as written to export files.
    pub fn to_json(&self) -> Result<String, ExportError> {
        serde_json::to_string_pretty(self).map_err(ExportError::Encode)
    }

    /// Parses and validates a document.
    ///
    /// Fails as a whole if any record is invalid. A missing `exportDate`
    /// falls back to `now`.
    pub fn from_json(json: &str, now: DateTime<Utc>) -> Result<Self, ExportError> {
        let raw: RawDocument = serde_json::from_str(json).map_err(ExportError::Malformed)?;
        if raw.version != EXPORT_VERSION {
            tracing::debug!(version = %raw.version, "importing document with unexpected version");
        }

        let records = raw
            .records
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                serde_json::from_value(value)
                    .map_err(|source| ExportError::InvalidRecord { index, source })
            })
            .collect::<Result<Vec<TimeRecord>, _>>()?;

        Ok(Self {
            version: raw.version,
            export_date: raw.export_date.unwrap_or(now),
            records,
        })
    }
}
