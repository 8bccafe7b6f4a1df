//! Sled-backed shift storage
//!
//! Two named trees inside one sled database:
//! - `current_shift`: a single record under the key `current`, overwritten on
//!   every accepted mutation
//! - `shift_history`: archived shifts keyed by a monotonic sled id
//!   (big-endian u64, so iteration order equals append order)

use std::path::Path;

use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Transactional, Tree};

use super::persistence::{ShiftStore, StorageError};
use crate::types::{ArchivedShift, ShiftData};

/// Database directory name inside the configured data directory
pub const DB_FILE_NAME: &str = "shift_handover.db";

const CURRENT_TREE: &str = "current_shift";
const HISTORY_TREE: &str = "shift_history";
const CURRENT_KEY: &[u8] = b"current";

/// Durable shift store
#[derive(Clone)]
pub struct SledShiftStore {
    db: sled::Db,
    current: Tree,
    history: Tree,
}

impl SledShiftStore {
    /// Open or create the store at the specified path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref)?;
        let current = db.open_tree(CURRENT_TREE)?;
        let history = db.open_tree(HISTORY_TREE)?;

        tracing::info!(
            path = %path_ref.display(),
            archived = history.len(),
            "Shift storage opened"
        );

        Ok(Self { db, current, history })
    }

    /// Get database size in bytes
    pub fn size_bytes(&self) -> u64 {
        self.db.size_on_disk().unwrap_or(0)
    }

    /// Remove the current shift and all history (use with caution!)
    pub fn clear(&self) -> Result<(), StorageError> {
        self.current.clear()?;
        self.history.clear()?;
        self.db.flush()?;
        Ok(())
    }
}

impl ShiftStore for SledShiftStore {
    fn load_current(&self) -> Result<Option<ShiftData>, StorageError> {
        match self.current.get(CURRENT_KEY)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save_current(&self, shift: &ShiftData) -> Result<(), StorageError> {
        let value = serde_json::to_vec(shift)?;
        self.current.insert(CURRENT_KEY, value)?;
        self.current.flush()?;
        Ok(())
    }

    fn archive_and_replace(&self, entry: &ArchivedShift, next: &ShiftData) -> Result<(), StorageError> {
        let key = self.db.generate_id()?.to_be_bytes();
        let archived_value = serde_json::to_vec(entry)?;
        let current_value = serde_json::to_vec(next)?;

        (&self.history, &self.current)
            .transaction(|(history, current)| {
                history.insert(&key[..], archived_value.as_slice())?;
                current.insert(CURRENT_KEY, current_value.as_slice())?;
                Ok::<(), ConflictableTransactionError<()>>(())
            })
            .map_err(|e| match e {
                TransactionError::Abort(()) => StorageError::Storage("archive transaction aborted".to_string()),
                TransactionError::Storage(e) => StorageError::Database(e),
            })?;
        self.db.flush()?;

        tracing::debug!(
            well = %entry.shift.well_name,
            archived_at = %entry.timestamp,
            "Shift archived and replaced"
        );
        Ok(())
    }

    fn history(&self) -> Result<Vec<ArchivedShift>, StorageError> {
        let mut entries = Vec::with_capacity(self.history.len());

        for item in self.history.iter() {
            let (_key, value) = item?;
            if let Some(entry) = decode_entry(&value) {
                entries.push(entry);
            }
        }

        Ok(entries)
    }

    fn recent_history(&self, limit: usize) -> Result<Vec<ArchivedShift>, StorageError> {
        let mut entries = Vec::with_capacity(limit.min(self.history.len()));

        // Iterate in reverse order (newest first due to big-endian id keys)
        for item in self.history.iter().rev() {
            if entries.len() >= limit {
                break;
            }
            let (_key, value) = item?;
            if let Some(entry) = decode_entry(&value) {
                entries.push(entry);
            }
        }

        Ok(entries)
    }

    /// Counts readable entries only, matching what `history` returns
    fn history_count(&self) -> Result<usize, StorageError> {
        let mut count = 0;
        for item in self.history.iter() {
            let (_key, value) = item?;
            if decode_entry(&value).is_some() {
                count += 1;
            }
        }
        Ok(count)
    }

    fn backend_name(&self) -> &'static str {
        "Sled"
    }
}

/// Decode one history value; unreadable entries are logged and skipped.
fn decode_entry(value: &[u8]) -> Option<ArchivedShift> {
    match serde_json::from_slice::<ArchivedShift>(value) {
        Ok(entry) => Some(entry),
        Err(e) => {
            tracing::warn!("Failed to deserialize archived shift: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BlockId, OperationType, TaskStatus};
    use chrono::{NaiveDate, Utc};

    fn make_shift(well: &str) -> ShiftData {
        let mut shift = ShiftData::blank(NaiveDate::from_ymd_opt(2025, 8, 21).unwrap());
        shift.well_name = well.to_string();
        shift.rig = "WO-12".to_string();
        shift.operation_type = OperationType::Workover;
        shift
    }

    #[test]
    fn test_storage_open() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SledShiftStore::open(temp_dir.path().join("test.db")).unwrap();
        assert!(store.load_current().unwrap().is_none());
        assert_eq!(store.history_count().unwrap(), 0);
    }

    #[test]
    fn test_current_round_trip_all_fields() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SledShiftStore::open(temp_dir.path().join("test.db")).unwrap();

        let mut shift = make_shift("PALO AZUL-3");
        shift.blocks[4].tasks[0].status = Some(TaskStatus::Desviacion);
        shift.blocks[4].tasks[0].note = Some("NPT 2h por falla de BOP".to_string());
        shift.avoided_risks = "Izaje suspendido por viento".to_string();
        shift.is_closed = true;
        shift.score = 92;
        shift.ai_summary = Some("Resumen ejecutivo".to_string());

        store.save_current(&shift).unwrap();
        assert_eq!(store.load_current().unwrap(), Some(shift));
    }

    #[test]
    fn test_current_survives_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("test.db");
        let shift = make_shift("EDEN-9");
        {
            let store = SledShiftStore::open(&path).unwrap();
            store.save_current(&shift).unwrap();
        }
        let store = SledShiftStore::open(&path).unwrap();
        let loaded = store.load_current().unwrap().unwrap();
        assert_eq!(loaded.well_name, "EDEN-9");
        assert_eq!(loaded.block(BlockId::Closure).unwrap().tasks.len(), 5);
    }

    #[test]
    fn test_history_is_append_ordered() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SledShiftStore::open(temp_dir.path().join("test.db")).unwrap();

        for well in ["A", "B", "C"] {
            store
                .archive_and_replace(
                    &ArchivedShift {
                        shift: make_shift(well),
                        timestamp: Utc::now(),
                    },
                    &make_shift(well),
                )
                .unwrap();
        }

        let all = store.history().unwrap();
        let wells: Vec<&str> = all.iter().map(|e| e.shift.well_name.as_str()).collect();
        assert_eq!(wells, vec!["A", "B", "C"]);

        let recent = store.recent_history(1).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].shift.well_name, "C");
    }

    #[test]
    fn test_archive_and_replace_writes_both_trees() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("test.db");
        {
            let store = SledShiftStore::open(&path).unwrap();
            let mut outgoing = make_shift("SACHA-12");
            outgoing.is_closed = true;
            store.save_current(&outgoing).unwrap();
            store
                .archive_and_replace(
                    &ArchivedShift {
                        shift: outgoing,
                        timestamp: Utc::now(),
                    },
                    &make_shift("SACHA-12"),
                )
                .unwrap();
        }

        let store = SledShiftStore::open(&path).unwrap();
        assert!(!store.load_current().unwrap().unwrap().is_closed);
        let history = store.history().unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].shift.is_closed);
    }

    #[test]
    fn test_corrupt_history_entries_skipped_consistently() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SledShiftStore::open(temp_dir.path().join("test.db")).unwrap();
        for well in ["A", "B"] {
            store
                .archive_and_replace(
                    &ArchivedShift {
                        shift: make_shift(well),
                        timestamp: Utc::now(),
                    },
                    &make_shift(well),
                )
                .unwrap();
        }
        let key = store.db.generate_id().unwrap().to_be_bytes();
        store.history.insert(key, b"{not json".to_vec()).unwrap();

        assert_eq!(store.history().unwrap().len(), 2);
        assert_eq!(store.history_count().unwrap(), 2);
        let recent = store.recent_history(5).unwrap();
        let wells: Vec<&str> = recent.iter().map(|e| e.shift.well_name.as_str()).collect();
        assert_eq!(wells, vec!["B", "A"]);
    }

    #[test]
    fn test_clear() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SledShiftStore::open(temp_dir.path().join("test.db")).unwrap();
        store.save_current(&make_shift("X")).unwrap();
        store
            .archive_and_replace(
                &ArchivedShift {
                    shift: make_shift("X"),
                    timestamp: Utc::now(),
                },
                &make_shift("Y"),
            )
            .unwrap();

        store.clear().unwrap();
        assert!(store.load_current().unwrap().is_none());
        assert_eq!(store.history_count().unwrap(), 0);
    }
}
