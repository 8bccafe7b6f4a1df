//! Shift Lifecycle Controller
//!
//! Owns the current [`ShiftData`] for the running process and drives it
//! through the shift state machine:
//!
//! ```text
//! SETUP ──configure──▶ OPEN ──begin_closure──▶ CLOSING ──success──▶ CLOSED
//!                       ▲                        │                    │
//!                       └────────failure─────────┘                    │
//!                       └──────────────start_new_shift────────────────┘
//! ```
//!
//! All mutations are synchronous and written through to the [`ShiftStore`]
//! before they become visible. The report call is the only suspension point;
//! it happens outside this type (see [`service::ShiftService`]) between
//! [`ShiftSession::begin_closure`] and [`ShiftSession::complete_closure`].

pub mod service;

pub use service::{ShiftService, ShiftView};

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::checklist::{self, ChecklistError, EditOutcome};
use crate::report::ReportError;
use crate::scoring::{compute_score, ShiftMetrics};
use crate::storage::{ShiftStore, StorageError};
use crate::types::{matches_template, ArchivedShift, BitacoraField, BlockId, SetupInput, ShiftData, TaskStatus};

/// Lifecycle state derived from the shift and the in-flight flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftPhase {
    /// Well name or rig not captured yet
    Setup,
    /// Checklist and bitácora editable
    Open,
    /// Closure report requested; still editable
    Closing,
    /// Score and summary fixed; editing rejected
    Closed,
}

/// Lifecycle errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("shift setup required: well name and rig must be configured first")]
    SetupRequired,
    #[error("shift is closed; start a new shift to continue")]
    ShiftClosed,
    #[error("a closure request is already in flight")]
    ClosureInFlight,
    #[error("closure result discarded: the shift changed while the report was pending")]
    StaleClosure,
    #[error(transparent)]
    Checklist(#[from] ChecklistError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("{0}")]
    Report(#[from] ReportError),
    #[error("closure task failed: {0}")]
    ClosureTask(#[from] tokio::task::JoinError),
}

/// Proof that a closure was started: carries the graded snapshot that must be
/// sent to the report generator, and the shift epoch it belongs to.
#[derive(Debug, Clone)]
pub struct ClosureTicket {
    epoch: u64,
    score: u8,
    snapshot: ShiftData,
}

impl ClosureTicket {
    /// Shift snapshot with `score` already attached
    pub fn snapshot(&self) -> &ShiftData {
        &self.snapshot
    }

    pub fn score(&self) -> u8 {
        self.score
    }
}

/// Check the mandatory setup fields.
pub fn validate_setup(setup: &SetupInput) -> Result<(), SessionError> {
    let mut missing = Vec::new();
    if setup.well_name.trim().is_empty() {
        missing.push("wellName");
    }
    if setup.rig.trim().is_empty() {
        missing.push("rig");
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SessionError::Validation(format!(
            "required setup fields missing: {}",
            missing.join(", ")
        )))
    }
}

/// Session-scoped owner of the current shift.
pub struct ShiftSession {
    shift: ShiftData,
    store: Arc<dyn ShiftStore>,
    closure_in_flight: bool,
    /// Advances on every successful closure and every reset
    epoch: u64,
}

impl ShiftSession {
    /// Load the current shift from `store`, or start from the template dated
    /// `today` when nothing was ever saved.
    ///
    /// A stored shift whose blocks differ from the checklist template is
    /// rejected.
    pub fn hydrate(store: Arc<dyn ShiftStore>, today: NaiveDate) -> Result<Self, StorageError> {
        let shift = match store.load_current()? {
            Some(shift) if !matches_template(&shift.blocks) => {
                return Err(StorageError::Malformed(format!(
                    "current shift for well '{}' does not match the checklist template",
                    shift.well_name
                )));
            }
            Some(shift) => {
                info!(
                    backend = store.backend_name(),
                    well = %shift.well_name,
                    closed = shift.is_closed,
                    "Restored current shift"
                );
                shift
            }
            None => {
                info!(backend = store.backend_name(), "No stored shift, starting from template");
                ShiftData::blank(today)
            }
        };

        Ok(Self {
            shift,
            store,
            closure_in_flight: false,
            epoch: 0,
        })
    }

    pub fn shift(&self) -> &ShiftData {
        &self.shift
    }

    pub fn store(&self) -> &Arc<dyn ShiftStore> {
        &self.store
    }

    pub fn phase(&self) -> ShiftPhase {
        if self.shift.is_closed {
            ShiftPhase::Closed
        } else if self.closure_in_flight {
            ShiftPhase::Closing
        } else if !self.shift.has_identity() {
            ShiftPhase::Setup
        } else {
            ShiftPhase::Open
        }
    }

    pub fn metrics(&self) -> ShiftMetrics {
        ShiftMetrics::from_blocks(&self.shift.blocks)
    }

    /// Persist `candidate`, then make it the current shift.
    fn commit(&mut self, candidate: ShiftData) -> Result<(), StorageError> {
        self.store.save_current(&candidate)?;
        self.shift = candidate;
        Ok(())
    }

    fn ensure_editable(&self) -> Result<(), SessionError> {
        match self.phase() {
            ShiftPhase::Setup => Err(SessionError::SetupRequired),
            ShiftPhase::Closed => Err(SessionError::ShiftClosed),
            ShiftPhase::Open | ShiftPhase::Closing => Ok(()),
        }
    }

    /// Capture or change identity fields, operative date and operation type.
    pub fn configure(&mut self, setup: &SetupInput) -> Result<&ShiftData, SessionError> {
        if self.shift.is_closed {
            return Err(SessionError::ShiftClosed);
        }
        validate_setup(setup)?;

        let mut candidate = self.shift.clone();
        candidate.apply_setup(setup);
        self.commit(candidate)?;

        info!(
            well = %self.shift.well_name,
            rig = %self.shift.rig,
            date = %self.shift.date,
            operation = self.shift.operation_type.short_code(),
            "Shift configured"
        );
        Ok(&self.shift)
    }

    pub fn set_task_status(
        &mut self,
        block_id: BlockId,
        task_id: &str,
        status: TaskStatus,
    ) -> Result<EditOutcome, SessionError> {
        self.ensure_editable()?;
        let mut candidate = self.shift.clone();
        let outcome = checklist::set_task_status(&mut candidate, block_id, task_id, status)?;
        self.commit(candidate)?;
        debug!(block = %block_id, task = task_id, status = %status, "Task status set");
        Ok(outcome)
    }

    pub fn set_task_note(
        &mut self,
        block_id: BlockId,
        task_id: &str,
        note: &str,
    ) -> Result<EditOutcome, SessionError> {
        self.ensure_editable()?;
        let mut candidate = self.shift.clone();
        let outcome = checklist::set_task_note(&mut candidate, block_id, task_id, note)?;
        self.commit(candidate)?;
        debug!(block = %block_id, task = task_id, "Task note set");
        Ok(outcome)
    }

    pub fn set_bitacora(&mut self, field: BitacoraField, text: &str) -> Result<EditOutcome, SessionError> {
        self.ensure_editable()?;
        let mut candidate = self.shift.clone();
        let outcome = checklist::set_bitacora(&mut candidate, field, text);
        self.commit(candidate)?;
        debug!(field = ?field, "Bitácora updated");
        Ok(outcome)
    }

    /// Validate the closure precondition, grade the shift and mark a closure
    /// as in flight.
    pub fn begin_closure(&mut self) -> Result<ClosureTicket, SessionError> {
        match self.phase() {
            ShiftPhase::Setup => return Err(SessionError::SetupRequired),
            ShiftPhase::Closed => return Err(SessionError::ShiftClosed),
            ShiftPhase::Closing => return Err(SessionError::ClosureInFlight),
            ShiftPhase::Open => {}
        }

        let missing = checklist::missing_closure_tasks(&self.shift);
        if !missing.is_empty() {
            return Err(SessionError::Validation(format!(
                "complete the {} block before closing the shift (unanswered: {})",
                BlockId::CLOSURE_EVIDENCE,
                missing.join(", ")
            )));
        }

        let score = compute_score(&self.shift.blocks);
        let mut snapshot = self.shift.clone();
        snapshot.score = score;
        self.closure_in_flight = true;

        info!(
            well = %self.shift.well_name,
            score,
            deviations = checklist::deviation_count(&self.shift),
            epoch = self.epoch,
            "Shift closure started"
        );
        Ok(ClosureTicket {
            epoch: self.epoch,
            score,
            snapshot,
        })
    }

    /// Apply the report outcome for `ticket`.
    ///
    /// On success `is_closed`, `score` and `ai_summary` are committed together.
    /// On failure nothing but the in-flight flag changes. A ticket from an
    /// earlier epoch is discarded.
    pub fn complete_closure(
        &mut self,
        ticket: ClosureTicket,
        result: Result<String, ReportError>,
    ) -> Result<&ShiftData, SessionError> {
        if ticket.epoch != self.epoch || self.shift.is_closed {
            warn!(
                ticket_epoch = ticket.epoch,
                current_epoch = self.epoch,
                "Discarding stale closure result"
            );
            return Err(SessionError::StaleClosure);
        }
        self.closure_in_flight = false;

        let summary = match result {
            Ok(summary) => summary,
            Err(e) => {
                warn!(well = %self.shift.well_name, error = %e, "Shift closure failed, shift stays open");
                return Err(SessionError::Report(e));
            }
        };

        let mut candidate = self.shift.clone();
        candidate.is_closed = true;
        candidate.score = ticket.score;
        candidate.ai_summary = Some(summary);
        self.commit(candidate)?;
        self.epoch += 1;

        info!(well = %self.shift.well_name, score = ticket.score, "Shift closed");
        Ok(&self.shift)
    }

    /// Archive the current shift and start a fresh one.
    ///
    /// Identity fields carry over unless `reconfigure` is given. A closure
    /// still in flight is abandoned; its result will be discarded.
    pub fn start_new_shift(
        &mut self,
        now: DateTime<Utc>,
        reconfigure: Option<&SetupInput>,
    ) -> Result<&ShiftData, SessionError> {
        if self.phase() == ShiftPhase::Setup {
            return Err(SessionError::SetupRequired);
        }
        if let Some(setup) = reconfigure {
            validate_setup(setup)?;
        }

        let archived = ArchivedShift {
            shift: self.shift.clone(),
            timestamp: now,
        };
        let mut fresh = self.shift.next_shift(now.date_naive());
        if let Some(setup) = reconfigure {
            fresh.apply_setup(setup);
        }

        self.store.archive_and_replace(&archived, &fresh)?;

        let was_closed = self.shift.is_closed;
        self.shift = fresh;
        self.closure_in_flight = false;
        self.epoch += 1;

        info!(
            well = %self.shift.well_name,
            archived_closed = was_closed,
            date = %self.shift.date,
            "New shift started"
        );
        Ok(&self.shift)
    }

    /// Most recent archived shifts, newest first
    pub fn history(&self, limit: usize) -> Result<Vec<ArchivedShift>, StorageError> {
        self.store.recent_history(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryShiftStore;
    use crate::types::OperationType;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// In-memory store whose writes can be switched to fail
    #[derive(Default)]
    struct FailingStore {
        inner: InMemoryShiftStore,
        fail_writes: AtomicBool,
    }

    impl FailingStore {
        fn set_failing(&self, failing: bool) {
            self.fail_writes.store(failing, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), StorageError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                Err(StorageError::Storage("disk full".to_string()))
            } else {
                Ok(())
            }
        }
    }

    impl ShiftStore for FailingStore {
        fn load_current(&self) -> Result<Option<ShiftData>, StorageError> {
            self.inner.load_current()
        }

        fn save_current(&self, shift: &ShiftData) -> Result<(), StorageError> {
            self.check()?;
            self.inner.save_current(shift)
        }

        fn archive_and_replace(&self, entry: &ArchivedShift, next: &ShiftData) -> Result<(), StorageError> {
            self.check()?;
            self.inner.archive_and_replace(entry, next)
        }

        fn history(&self) -> Result<Vec<ArchivedShift>, StorageError> {
            self.inner.history()
        }

        fn history_count(&self) -> Result<usize, StorageError> {
            self.inner.history_count()
        }

        fn backend_name(&self) -> &'static str {
            "Failing"
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 10).unwrap()
    }

    fn setup_input() -> SetupInput {
        SetupInput {
            well_name: "Shushufindi-45".to_string(),
            rig: "WO-12".to_string(),
            company_man: "L. Vera".to_string(),
            date: today(),
            operation_type: OperationType::Workover,
        }
    }

    fn open_session() -> (ShiftSession, Arc<InMemoryShiftStore>) {
        let store = Arc::new(InMemoryShiftStore::new());
        let mut session = ShiftSession::hydrate(store.clone(), today()).unwrap();
        session.configure(&setup_input()).unwrap();
        (session, store)
    }

    fn answer_closure_block(session: &mut ShiftSession) {
        for id in ["5.1", "5.2", "5.3", "5.4", "5.5"] {
            session
                .set_task_status(BlockId::Closure, id, TaskStatus::Cumplido)
                .unwrap();
        }
    }

    #[test]
    fn test_hydrate_empty_store_starts_in_setup() {
        let store = Arc::new(InMemoryShiftStore::new());
        let session = ShiftSession::hydrate(store, today()).unwrap();
        assert_eq!(session.phase(), ShiftPhase::Setup);
        assert_eq!(session.shift().date, today());
    }

    #[test]
    fn test_hydrate_restores_saved_shift() {
        let (session, store) = open_session();
        let restored = ShiftSession::hydrate(store, today()).unwrap();
        assert_eq!(restored.shift(), session.shift());
        assert_eq!(restored.phase(), ShiftPhase::Open);
    }

    #[test]
    fn test_setup_validation() {
        let store = Arc::new(InMemoryShiftStore::new());
        let mut session = ShiftSession::hydrate(store.clone(), today()).unwrap();
        let mut bad = setup_input();
        bad.rig = "  ".to_string();

        let err = session.configure(&bad).unwrap_err();
        assert!(matches!(err, SessionError::Validation(ref m) if m.contains("rig")));
        assert_eq!(session.phase(), ShiftPhase::Setup);
        assert!(store.load_current().unwrap().is_none());
    }

    #[test]
    fn test_edits_rejected_during_setup() {
        let store = Arc::new(InMemoryShiftStore::new());
        let mut session = ShiftSession::hydrate(store, today()).unwrap();
        let err = session
            .set_task_status(BlockId::PreShift, "1.1", TaskStatus::Cumplido)
            .unwrap_err();
        assert!(matches!(err, SessionError::SetupRequired));
    }

    #[test]
    fn test_edits_write_through() {
        let (mut session, store) = open_session();
        session
            .set_task_status(BlockId::Operation, "2.2", TaskStatus::Desviacion)
            .unwrap();
        session.set_task_note(BlockId::Operation, "2.2", "Peso sobre gancho errático").unwrap();
        session
            .set_bitacora(BitacoraField::CriticalDecisions, "Se detuvo la maniobra")
            .unwrap();

        let saved = store.load_current().unwrap().unwrap();
        assert_eq!(&saved, session.shift());
        assert_eq!(saved.critical_decisions, "Se detuvo la maniobra");
    }

    #[test]
    fn test_unknown_task_leaves_store_untouched() {
        let (mut session, store) = open_session();
        let before = store.load_current().unwrap();
        let err = session
            .set_task_status(BlockId::Technical, "7.7", TaskStatus::Cumplido)
            .unwrap_err();
        assert!(matches!(err, SessionError::Checklist(_)));
        assert_eq!(store.load_current().unwrap(), before);
    }

    #[test]
    fn test_closure_requires_closure_block() {
        let (mut session, _store) = open_session();
        // Everything but 5.5 answered
        for block in BlockId::ALL {
            let ids: Vec<String> = session
                .shift()
                .block(block)
                .unwrap()
                .tasks
                .iter()
                .map(|t| t.id.clone())
                .collect();
            for id in ids.iter().filter(|id| id.as_str() != "5.5") {
                session.set_task_status(block, id, TaskStatus::Cumplido).unwrap();
            }
        }
        let before = session.shift().clone();

        let err = session.begin_closure().unwrap_err();
        assert!(matches!(err, SessionError::Validation(ref m) if m.contains("5.5")));
        assert_eq!(session.phase(), ShiftPhase::Open);
        assert_eq!(session.shift(), &before);
        assert!(!session.shift().is_closed);
    }

    #[test]
    fn test_successful_closure_sets_fields_together() {
        let (mut session, store) = open_session();
        answer_closure_block(&mut session);
        session
            .set_task_status(BlockId::PreShift, "1.1", TaskStatus::Desviacion)
            .unwrap();

        let ticket = session.begin_closure().unwrap();
        assert_eq!(session.phase(), ShiftPhase::Closing);
        assert_eq!(ticket.score(), 83); // 5 of 6
        assert_eq!(ticket.snapshot().score, 83);
        assert!(!session.shift().is_closed);

        let shift = session
            .complete_closure(ticket, Ok("## Reporte".to_string()))
            .unwrap();
        assert!(shift.is_closed);
        assert_eq!(shift.score, 83);
        assert_eq!(shift.ai_summary.as_deref(), Some("## Reporte"));
        assert_eq!(session.phase(), ShiftPhase::Closed);
        assert_eq!(store.load_current().unwrap().as_ref(), Some(session.shift()));
    }

    #[test]
    fn test_failed_closure_keeps_shift_open() {
        let (mut session, _store) = open_session();
        answer_closure_block(&mut session);
        let before = session.shift().clone();

        let ticket = session.begin_closure().unwrap();
        let err = session
            .complete_closure(ticket, Err(ReportError::Upstream("HTTP 500".to_string())))
            .unwrap_err();
        assert_eq!(err.to_string(), "ERROR DE CONEXIÓN: HTTP 500");
        assert_eq!(session.phase(), ShiftPhase::Open);
        assert_eq!(session.shift(), &before);

        // Retry allowed
        assert!(session.begin_closure().is_ok());
    }

    #[test]
    fn test_single_flight_guard() {
        let (mut session, _store) = open_session();
        answer_closure_block(&mut session);
        let _ticket = session.begin_closure().unwrap();
        assert!(matches!(session.begin_closure(), Err(SessionError::ClosureInFlight)));
        // Still editable while pending
        session
            .set_task_status(BlockId::Leadership, "4.1", TaskStatus::NoAplica)
            .unwrap();
    }

    #[test]
    fn test_closed_shift_rejects_edits() {
        let (mut session, _store) = open_session();
        answer_closure_block(&mut session);
        let ticket = session.begin_closure().unwrap();
        session.complete_closure(ticket, Ok("ok".to_string())).unwrap();

        assert!(matches!(
            session.set_task_note(BlockId::Closure, "5.1", "x"),
            Err(SessionError::ShiftClosed)
        ));
        assert!(matches!(
            session.set_bitacora(BitacoraField::AvoidedRisks, "x"),
            Err(SessionError::ShiftClosed)
        ));
        assert!(matches!(session.configure(&setup_input()), Err(SessionError::ShiftClosed)));
        assert!(matches!(session.begin_closure(), Err(SessionError::ShiftClosed)));
    }

    #[test]
    fn test_new_shift_archives_and_resets() {
        let (mut session, store) = open_session();
        answer_closure_block(&mut session);
        session.set_bitacora(BitacoraField::NextShiftAlerts, "Revisar BOP").unwrap();
        let ticket = session.begin_closure().unwrap();
        session.complete_closure(ticket, Ok("resumen".to_string())).unwrap();
        let outgoing = session.shift().clone();

        let now = Utc.with_ymd_and_hms(2025, 5, 11, 6, 0, 0).unwrap();
        let fresh = session.start_new_shift(now, None).unwrap().clone();

        let history = store.history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].shift, outgoing);
        assert_eq!(history[0].timestamp, now);

        assert_eq!(fresh.well_name, outgoing.well_name);
        assert_eq!(fresh.rig, outgoing.rig);
        assert_eq!(fresh.company_man, outgoing.company_man);
        assert_eq!(fresh.operation_type, OperationType::Workover);
        assert_eq!(fresh.date, now.date_naive());
        assert!(fresh.tasks().all(|t| t.status.is_none() && t.note.is_none()));
        assert!(fresh.next_shift_alerts.is_empty());
        assert!(!fresh.is_closed);
        assert_eq!(fresh.score, 0);
        assert!(fresh.ai_summary.is_none());
        assert_eq!(session.phase(), ShiftPhase::Open);
        assert_eq!(store.load_current().unwrap(), Some(fresh));
    }

    #[test]
    fn test_new_shift_with_reconfiguration() {
        let (mut session, _store) = open_session();
        let mut setup = setup_input();
        setup.well_name = "Auca-51".to_string();
        setup.operation_type = OperationType::Perforacion;
        setup.date = NaiveDate::from_ymd_opt(2025, 5, 12).unwrap();

        let fresh = session.start_new_shift(Utc::now(), Some(&setup)).unwrap();
        assert_eq!(fresh.well_name, "Auca-51");
        assert_eq!(fresh.operation_type, OperationType::Perforacion);
        assert_eq!(fresh.date, setup.date);
    }

    #[test]
    fn test_stale_closure_discarded_after_reset() {
        let (mut session, store) = open_session();
        answer_closure_block(&mut session);
        let ticket = session.begin_closure().unwrap();

        session.start_new_shift(Utc::now(), None).unwrap();
        assert_eq!(session.phase(), ShiftPhase::Open);

        let err = session
            .complete_closure(ticket, Ok("late".to_string()))
            .unwrap_err();
        assert!(matches!(err, SessionError::StaleClosure));
        assert!(!session.shift().is_closed);
        assert!(session.shift().ai_summary.is_none());
        // Abandoned shift was archived unclosed
        let history = store.history().unwrap();
        assert_eq!(history.len(), 1);
        assert!(!history[0].shift.is_closed);
    }

    #[test]
    fn test_new_shift_rejected_during_setup() {
        let store = Arc::new(InMemoryShiftStore::new());
        let mut session = ShiftSession::hydrate(store.clone(), today()).unwrap();
        assert!(matches!(
            session.start_new_shift(Utc::now(), None),
            Err(SessionError::SetupRequired)
        ));
        assert_eq!(store.history_count().unwrap(), 0);
    }

    #[test]
    fn test_hydrate_rejects_shift_off_template() {
        let store = Arc::new(InMemoryShiftStore::new());
        let mut shift = ShiftData::blank(today());
        shift.well_name = "Auca-51".to_string();
        shift.rig = "CPV-22".to_string();
        shift.blocks.retain(|b| b.id != BlockId::Closure);
        store.save_current(&shift).unwrap();

        let err = ShiftSession::hydrate(store, today()).err().unwrap();
        assert!(matches!(err, StorageError::Malformed(ref m) if m.contains("Auca-51")));
    }

    #[test]
    fn test_failed_write_rejects_edit() {
        let store = Arc::new(FailingStore::default());
        let mut session = ShiftSession::hydrate(store.clone(), today()).unwrap();
        session.configure(&setup_input()).unwrap();
        let before = session.shift().clone();

        store.set_failing(true);
        let err = session
            .set_task_status(BlockId::PreShift, "1.1", TaskStatus::Cumplido)
            .unwrap_err();
        assert!(matches!(err, SessionError::Storage(_)));
        assert_eq!(session.shift(), &before);
    }

    #[test]
    fn test_failed_closure_commit_returns_to_open() {
        let store = Arc::new(FailingStore::default());
        let mut session = ShiftSession::hydrate(store.clone(), today()).unwrap();
        session.configure(&setup_input()).unwrap();
        answer_closure_block(&mut session);
        let before = session.shift().clone();

        let ticket = session.begin_closure().unwrap();
        store.set_failing(true);
        let err = session
            .complete_closure(ticket, Ok("resumen".to_string()))
            .unwrap_err();
        assert!(matches!(err, SessionError::Storage(_)));
        assert_eq!(session.phase(), ShiftPhase::Open);
        assert_eq!(session.shift(), &before);

        store.set_failing(false);
        let ticket = session.begin_closure().unwrap();
        session.complete_closure(ticket, Ok("resumen".to_string())).unwrap();
        assert!(store.load_current().unwrap().unwrap().is_closed);
    }

    #[test]
    fn test_failed_reset_archives_nothing() {
        let store = Arc::new(FailingStore::default());
        let mut session = ShiftSession::hydrate(store.clone(), today()).unwrap();
        session.configure(&setup_input()).unwrap();
        answer_closure_block(&mut session);
        let ticket = session.begin_closure().unwrap();
        session.complete_closure(ticket, Ok("resumen".to_string())).unwrap();

        store.set_failing(true);
        let err = session.start_new_shift(Utc::now(), None).unwrap_err();
        assert!(matches!(err, SessionError::Storage(_)));
        assert_eq!(session.phase(), ShiftPhase::Closed);
        assert_eq!(store.history_count().unwrap(), 0);
        assert!(store.load_current().unwrap().unwrap().is_closed);

        // After a restart the closed shift is archived exactly once
        store.set_failing(false);
        let mut restarted = ShiftSession::hydrate(store.clone(), today()).unwrap();
        assert_eq!(restarted.phase(), ShiftPhase::Closed);
        restarted.start_new_shift(Utc::now(), None).unwrap();
        assert_eq!(store.history_count().unwrap(), 1);
        assert!(!store.load_current().unwrap().unwrap().is_closed);
    }
}
