//! Core domain logic for the time tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Tracking: the start/pause/resume/stop session state machine
//! - Records: completed intervals and per-day statistics over them
//! - Persistence: the key-value contract and the on-disk value encoding
//! - Interchange: the JSON export document

pub mod clock;
pub mod duration;
pub mod export;
pub mod kv;
pub mod persist;
pub mod record;
mod refresh;
pub mod session;
pub mod store;
mod tracker;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use duration::DurationParts;
pub use export::{EXPORT_VERSION, ExportDocument, ExportError};
pub use kv::{KeyValueStore, KvWrite, MemoryStore, StoreError};
pub use persist::PersistenceError;
pub use record::{TimeRecord, local_day, local_instant};
pub use refresh::RefreshTimer;
pub use session::{SessionState, TrackingSession};
pub use store::{DayLabel, DaySummary, RecordStore, Statistics, UpdateOutcome};
pub use tracker::{Change, Tracker, TrackerConfig};
pub use types::{RecordId, ValidationError};
