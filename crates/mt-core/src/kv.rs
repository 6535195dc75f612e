//! Key-value persistence contract.
//!
//! The core never talks to a database directly. It reads and writes opaque
//! byte values by key through [`KeyValueStore`]; `mt-db` provides the SQLite
//! implementation and [`MemoryStore`] backs tests.

use std::collections::HashMap;

use thiserror::Error;

/// Failure reported by a key-value backend.
#[derive(Debug, Error)]
#[error("key-value store {operation} failed for `{key}`")]
pub struct StoreError {
    pub operation: &'static str,
    pub key: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl StoreError {
    pub fn new(
        operation: &'static str,
        key: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            operation,
            key: key.into(),
            source: source.into(),
        }
    }
}

/// One write in an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvWrite {
    Put { key: &'static str, value: Vec<u8> },
    Remove { key: &'static str },
}

impl KvWrite {
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Put { key, .. } | Self::Remove { key } => key,
        }
    }
}

/// Synchronous byte storage by key.
pub trait KeyValueStore {
    /// Returns the value stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Applies every write or none of them.
    fn save_all(&mut self, writes: &[KvWrite]) -> Result<(), StoreError>;
}

/// In-process store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn save_all(&mut self, writes: &[KvWrite]) -> Result<(), StoreError> {
        for write in writes {
            match write {
                KvWrite::Put { key, value } => {
                    self.values.insert((*key).to_string(), value.clone());
                }
                KvWrite::Remove { key } => {
                    self.values.remove(*key);
                }
            }
        }
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).load(key)
    }

    fn save_all(&mut self, writes: &[KvWrite]) -> Result<(), StoreError> {
        (**self).save_all(writes)
    }
}
