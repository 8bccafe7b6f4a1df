//! Shift Handover: field shift checklist and closure reporting
//!
//! A supervisor records the five-block safety/operations checklist for a
//! shift, closes it into a scored report with a generated narrative, and
//! starts the next shift.
//!
//! ## Architecture
//!
//! - **Checklist Model** (`types`, `checklist`): fixed template and edits
//! - **Scoring Engine** (`scoring`): compliance score and progress
//! - **Report** (`report`): instruction builder, endpoint client, upstream model
//! - **Storage** (`storage`): current shift and append-only history
//! - **Session** (`session`): the shift lifecycle state machine
//! - **API** (`api`): axum routes over the session and the report endpoint

pub mod api;
pub mod checklist;
pub mod config;
pub mod report;
pub mod scoring;
pub mod session;
pub mod storage;
pub mod types;

// Re-export configuration
pub use config::HandoverConfig;

// Re-export commonly used types
pub use types::{
    ArchivedShift, BitacoraField, Block, BlockId, OperationType, SetupInput, ShiftData, Task,
    TaskStatus,
};

// Re-export lifecycle components
pub use scoring::{compute_progress, compute_score, ShiftMetrics};
pub use session::{SessionError, ShiftPhase, ShiftService, ShiftSession, ShiftView};

// Re-export storage
pub use storage::{InMemoryShiftStore, ShiftStore, SledShiftStore, StorageError};

// Re-export report components
pub use report::{GeminiClient, HttpReportRequester, ReportError, ReportGenerator, TextGenerator};
