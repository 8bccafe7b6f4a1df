//! ShiftStore trait: pluggable storage backend
//!
//! Abstracts shift persistence so the lifecycle controller never touches the
//! storage medium directly:
//! - `SledShiftStore`: durable sled database (production)
//! - `InMemoryShiftStore`: in-memory store for tests and throwaway sessions
//!
//! Contract: one overwritten "current shift" record plus an append-only
//! history list whose iteration order equals append order.

use crate::types::{ArchivedShift, ShiftData};

/// Trait for pluggable persistence backends
///
/// Implementations must be thread-safe (Send + Sync) for shared access
/// across async tasks.
pub trait ShiftStore: Send + Sync {
    /// Load the current shift, if one was ever saved
    fn load_current(&self) -> Result<Option<ShiftData>, StorageError>;

    /// Overwrite the current shift record
    fn save_current(&self, shift: &ShiftData) -> Result<(), StorageError>;

    /// Append `entry` to history and make `next` the current shift as one
    /// atomic step: either both writes land or neither does. Earlier history
    /// entries are never mutated.
    fn archive_and_replace(&self, entry: &ArchivedShift, next: &ShiftData) -> Result<(), StorageError>;

    /// Full history, oldest first
    fn history(&self) -> Result<Vec<ArchivedShift>, StorageError>;

    /// Most recent `limit` history entries, newest first
    fn recent_history(&self, limit: usize) -> Result<Vec<ArchivedShift>, StorageError> {
        let mut all = self.history()?;
        all.reverse();
        all.truncate(limit);
        Ok(all)
    }

    /// Number of archived shifts
    fn history_count(&self) -> Result<usize, StorageError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Persistence errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("malformed stored shift: {0}")]
    Malformed(String),
}

/// In-memory persistence for testing and minimal deployments
///
/// Thread-safe via `RwLock`. Not durable; data is lost on restart.
#[derive(Default)]
pub struct InMemoryShiftStore {
    current: std::sync::RwLock<Option<ShiftData>>,
    history: std::sync::RwLock<Vec<ArchivedShift>>,
}

impl InMemoryShiftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShiftStore for InMemoryShiftStore {
    fn load_current(&self) -> Result<Option<ShiftData>, StorageError> {
        let current = self
            .current
            .read()
            .map_err(|e| StorageError::Storage(e.to_string()))?;
        Ok(current.clone())
    }

    fn save_current(&self, shift: &ShiftData) -> Result<(), StorageError> {
        let mut current = self
            .current
            .write()
            .map_err(|e| StorageError::Storage(e.to_string()))?;
        *current = Some(shift.clone());
        Ok(())
    }

    fn archive_and_replace(&self, entry: &ArchivedShift, next: &ShiftData) -> Result<(), StorageError> {
        let mut history = self
            .history
            .write()
            .map_err(|e| StorageError::Storage(e.to_string()))?;
        let mut current = self
            .current
            .write()
            .map_err(|e| StorageError::Storage(e.to_string()))?;
        history.push(entry.clone());
        *current = Some(next.clone());
        Ok(())
    }

    fn history(&self) -> Result<Vec<ArchivedShift>, StorageError> {
        let history = self
            .history
            .read()
            .map_err(|e| StorageError::Storage(e.to_string()))?;
        Ok(history.clone())
    }

    fn history_count(&self) -> Result<usize, StorageError> {
        let history = self
            .history
            .read()
            .map_err(|e| StorageError::Storage(e.to_string()))?;
        Ok(history.len())
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}
