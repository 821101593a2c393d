//! Durable storage boundary for the session record.
//!
//! The record is one opaque string (the encoded session). Backends only
//! persist it; decoding and change notification happen in the session store.

use std::sync::{Mutex, PoisonError};

use crate::domain::Result;

/// Persisted home of the session record, shared by every execution context.
pub trait SessionBackend: Send + Sync {
    /// Read the raw record, if one is stored.
    ///
    /// # Errors
    /// Returns error if the underlying storage cannot be read.
    fn load(&self) -> Result<Option<String>>;

    /// Replace the stored record.
    ///
    /// # Errors
    /// Returns error if the record cannot be written.
    fn save(&self, record: &str) -> Result<()>;

    /// Delete the stored record. Deleting a missing record is not an error.
    ///
    /// # Errors
    /// Returns error if the record cannot be removed.
    fn remove(&self) -> Result<()>;

    /// Marker that moves whenever another handle (another process) commits a
    /// change. Writes made through this handle leave it unchanged.
    ///
    /// Backends nobody else can write to keep the default constant.
    ///
    /// # Errors
    /// Returns error if the marker cannot be read.
    fn external_version(&self) -> Result<i64> {
        Ok(0)
    }
}

/// In-process backend, used for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    record: Mutex<Option<String>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the backend with a raw record, as if another context had written it.
    #[must_use]
    pub fn with_record(record: impl Into<String>) -> Self {
        Self {
            record: Mutex::new(Some(record.into())),
        }
    }
}

impl SessionBackend for MemoryBackend {
    fn load(&self) -> Result<Option<String>> {
        Ok(self
            .record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, record: &str) -> Result<()> {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = Some(record.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
