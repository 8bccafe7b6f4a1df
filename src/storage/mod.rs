//! Shift persistence
//!
//! The lifecycle controller talks to storage only through [`ShiftStore`]:
//! the current shift is written through on every accepted mutation and
//! archived shifts are appended to history on each new-shift transition.

pub mod persistence;
pub mod sled_store;

pub use persistence::{InMemoryShiftStore, ShiftStore, StorageError};
pub use sled_store::{SledShiftStore, DB_FILE_NAME};
