//! Async façade over [`ShiftSession`]
//!
//! Serializes mutations through a `tokio::sync::RwLock` and runs the closure
//! report call without holding the lock, so the shift stays editable while
//! the narrative is generated.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;

use super::{SessionError, ShiftPhase, ShiftSession};
use crate::checklist::EditOutcome;
use crate::report::ReportGenerator;
use crate::scoring::ShiftMetrics;
use crate::types::{ArchivedShift, BitacoraField, BlockId, SetupInput, ShiftData, TaskStatus};

/// Current shift as seen by clients
#[derive(Debug, Clone, Serialize)]
pub struct ShiftView {
    pub phase: ShiftPhase,
    pub shift: ShiftData,
    pub metrics: ShiftMetrics,
}

impl ShiftView {
    fn of(session: &ShiftSession) -> Self {
        Self {
            phase: session.phase(),
            shift: session.shift().clone(),
            metrics: session.metrics(),
        }
    }
}

/// Shared handle to the session and its report generator
#[derive(Clone)]
pub struct ShiftService {
    session: Arc<RwLock<ShiftSession>>,
    generator: Arc<dyn ReportGenerator>,
}

impl ShiftService {
    pub fn new(session: ShiftSession, generator: Arc<dyn ReportGenerator>) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
            generator,
        }
    }

    pub fn generator_name(&self) -> &'static str {
        self.generator.generator_name()
    }

    pub async fn view(&self) -> ShiftView {
        ShiftView::of(&*self.session.read().await)
    }

    pub async fn metrics(&self) -> ShiftMetrics {
        self.session.read().await.metrics()
    }

    pub async fn phase(&self) -> ShiftPhase {
        self.session.read().await.phase()
    }

    pub async fn configure(&self, setup: SetupInput) -> Result<ShiftView, SessionError> {
        let mut session = self.session.write().await;
        session.configure(&setup)?;
        Ok(ShiftView::of(&session))
    }

    pub async fn set_task_status(
        &self,
        block_id: BlockId,
        task_id: &str,
        status: TaskStatus,
    ) -> Result<(EditOutcome, ShiftView), SessionError> {
        let mut session = self.session.write().await;
        let outcome = session.set_task_status(block_id, task_id, status)?;
        Ok((outcome, ShiftView::of(&session)))
    }

    pub async fn set_task_note(
        &self,
        block_id: BlockId,
        task_id: &str,
        note: &str,
    ) -> Result<(EditOutcome, ShiftView), SessionError> {
        let mut session = self.session.write().await;
        let outcome = session.set_task_note(block_id, task_id, note)?;
        Ok((outcome, ShiftView::of(&session)))
    }

    pub async fn set_bitacora(
        &self,
        field: BitacoraField,
        text: &str,
    ) -> Result<(EditOutcome, ShiftView), SessionError> {
        let mut session = self.session.write().await;
        let outcome = session.set_bitacora(field, text)?;
        Ok((outcome, ShiftView::of(&session)))
    }

    /// Grade, request the narrative and commit the closure.
    ///
    /// The session lock is released while the generator runs. The request
    /// and its commit run on a spawned task, so a caller that goes away
    /// mid-request does not leave the shift in `CLOSING`.
    pub async fn close_shift(&self) -> Result<ShiftView, SessionError> {
        let ticket = self.session.write().await.begin_closure()?;

        let session = Arc::clone(&self.session);
        let generator = Arc::clone(&self.generator);
        let closure = tokio::spawn(async move {
            let result = generator.generate(ticket.snapshot(), ticket.score()).await;

            let mut session = session.write().await;
            session.complete_closure(ticket, result)?;
            Ok::<_, SessionError>(ShiftView::of(&session))
        });

        closure.await?
    }

    pub async fn start_new_shift(&self, reconfigure: Option<SetupInput>) -> Result<ShiftView, SessionError> {
        let mut session = self.session.write().await;
        session.start_new_shift(Utc::now(), reconfigure.as_ref())?;
        Ok(ShiftView::of(&session))
    }

    pub async fn history(&self, limit: usize) -> Result<Vec<ArchivedShift>, SessionError> {
        Ok(self.session.read().await.history(limit)?)
    }

    pub async fn history_count(&self) -> Result<usize, SessionError> {
        Ok(self.session.read().await.store().history_count()?)
    }
}
