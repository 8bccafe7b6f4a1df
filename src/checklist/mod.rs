//! Checklist edits
//!
//! Pure transformations over a [`ShiftData`]. Every edit touches exactly one
//! field of one task (or one bitácora field) and leaves the rest of the
//! structure untouched. Edits against a closed shift are silently ignored.

use crate::types::{BitacoraField, BlockId, ShiftData, Task, TaskStatus};

/// Result of an accepted edit call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EditOutcome {
    /// The field now holds the requested value
    Applied,
    /// The shift is closed; nothing changed
    Ignored,
}

/// Lookup failures for block/task ids.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChecklistError {
    #[error("task '{task_id}' not found in block {block_id}")]
    UnknownTask { block_id: BlockId, task_id: String },
}

fn locate<'a>(
    shift: &'a mut ShiftData,
    block_id: BlockId,
    task_id: &str,
) -> Result<&'a mut Task, ChecklistError> {
    shift
        .blocks
        .iter_mut()
        .find(|b| b.id == block_id)
        .and_then(|b| b.task_mut(task_id))
        .ok_or_else(|| ChecklistError::UnknownTask {
            block_id,
            task_id: task_id.to_string(),
        })
}

/// Set the compliance status of one task.
///
/// The task's note is left as it was, even when moving away from
/// `DESVIACION`.
pub fn set_task_status(
    shift: &mut ShiftData,
    block_id: BlockId,
    task_id: &str,
    status: TaskStatus,
) -> Result<EditOutcome, ChecklistError> {
    if shift.is_closed {
        return Ok(EditOutcome::Ignored);
    }
    let task = locate(shift, block_id, task_id)?;
    task.status = Some(status);
    Ok(EditOutcome::Applied)
}

/// Set the technical note of one task.
pub fn set_task_note(
    shift: &mut ShiftData,
    block_id: BlockId,
    task_id: &str,
    note: &str,
) -> Result<EditOutcome, ChecklistError> {
    if shift.is_closed {
        return Ok(EditOutcome::Ignored);
    }
    let task = locate(shift, block_id, task_id)?;
    task.note = Some(note.to_string());
    Ok(EditOutcome::Applied)
}

/// Overwrite one of the three bitácora fields.
pub fn set_bitacora(shift: &mut ShiftData, field: BitacoraField, text: &str) -> EditOutcome {
    if shift.is_closed {
        return EditOutcome::Ignored;
    }
    *shift.bitacora_mut(field) = text.to_string();
    EditOutcome::Applied
}

/// Task ids of the closure/evidence block that still lack a status.
pub fn missing_closure_tasks(shift: &ShiftData) -> Vec<String> {
    match shift.block(BlockId::CLOSURE_EVIDENCE) {
        Some(block) => block
            .tasks
            .iter()
            .filter(|t| !t.is_answered())
            .map(|t| t.id.clone())
            .collect(),
        // A shift without a closure block can never satisfy the precondition
        None => vec![BlockId::CLOSURE_EVIDENCE.code().to_string()],
    }
}

/// Number of tasks flagged as deviations.
pub fn deviation_count(shift: &ShiftData) -> usize {
    shift
        .tasks()
        .filter(|t| t.status == Some(TaskStatus::Desviacion))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn open_shift() -> ShiftData {
        let mut shift = ShiftData::blank(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        shift.well_name = "AUCA-51".to_string();
        shift.rig = "CCDC-38".to_string();
        shift
    }

    #[test]
    fn test_set_status_touches_only_target() {
        let mut shift = open_shift();
        let before = shift.clone();

        let outcome = set_task_status(&mut shift, BlockId::Technical, "3.2", TaskStatus::Cumplido).unwrap();
        assert_eq!(outcome, EditOutcome::Applied);

        for (b_after, b_before) in shift.blocks.iter().zip(before.blocks.iter()) {
            for (t_after, t_before) in b_after.tasks.iter().zip(b_before.tasks.iter()) {
                if b_after.id == BlockId::Technical && t_after.id == "3.2" {
                    assert_eq!(t_after.status, Some(TaskStatus::Cumplido));
                    assert_eq!(t_after.label, t_before.label);
                } else {
                    assert_eq!(t_after, t_before);
                }
            }
        }
    }

    #[test]
    fn test_set_status_is_idempotent() {
        let mut once = open_shift();
        set_task_status(&mut once, BlockId::PreShift, "1.4", TaskStatus::NoAplica).unwrap();
        let mut twice = once.clone();
        set_task_status(&mut twice, BlockId::PreShift, "1.4", TaskStatus::NoAplica).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_note_survives_status_change() {
        let mut shift = open_shift();
        set_task_status(&mut shift, BlockId::Operation, "2.3", TaskStatus::Desviacion).unwrap();
        set_task_note(&mut shift, BlockId::Operation, "2.3", "Bomba 2 con vibración").unwrap();
        set_task_status(&mut shift, BlockId::Operation, "2.3", TaskStatus::Cumplido).unwrap();

        let task = shift.block(BlockId::Operation).unwrap().task("2.3").unwrap();
        assert_eq!(task.status, Some(TaskStatus::Cumplido));
        assert_eq!(task.note.as_deref(), Some("Bomba 2 con vibración"));
    }

    #[test]
    fn test_closed_shift_ignores_edits() {
        let mut shift = open_shift();
        shift.is_closed = true;
        let before = shift.clone();

        assert_eq!(
            set_task_status(&mut shift, BlockId::Closure, "5.1", TaskStatus::Cumplido).unwrap(),
            EditOutcome::Ignored
        );
        assert_eq!(
            set_task_note(&mut shift, BlockId::Closure, "5.1", "x").unwrap(),
            EditOutcome::Ignored
        );
        assert_eq!(
            set_bitacora(&mut shift, BitacoraField::AvoidedRisks, "x"),
            EditOutcome::Ignored
        );
        assert_eq!(shift, before);
    }

    #[test]
    fn test_unknown_task_reports_and_changes_nothing() {
        let mut shift = open_shift();
        let before = shift.clone();
        let err = set_task_status(&mut shift, BlockId::PreShift, "9.9", TaskStatus::Cumplido).unwrap_err();
        assert_eq!(
            err,
            ChecklistError::UnknownTask {
                block_id: BlockId::PreShift,
                task_id: "9.9".to_string()
            }
        );
        // Task id from another block is not found either
        assert!(set_task_note(&mut shift, BlockId::PreShift, "2.1", "x").is_err());
        assert_eq!(shift, before);
    }

    #[test]
    fn test_closure_block_tracking() {
        let mut shift = open_shift();
        assert_eq!(missing_closure_tasks(&shift).len(), 5);

        for id in ["5.1", "5.2", "5.3", "5.4"] {
            set_task_status(&mut shift, BlockId::Closure, id, TaskStatus::Cumplido).unwrap();
        }
        assert_eq!(missing_closure_tasks(&shift), vec!["5.5".to_string()]);

        set_task_status(&mut shift, BlockId::Closure, "5.5", TaskStatus::NoAplica).unwrap();
        assert!(missing_closure_tasks(&shift).is_empty());
    }

    #[test]
    fn test_bitacora_and_deviation_count() {
        let mut shift = open_shift();
        set_bitacora(&mut shift, BitacoraField::NextShiftAlerts, "Revisar conexión #7");
        assert_eq!(shift.next_shift_alerts, "Revisar conexión #7");

        set_task_status(&mut shift, BlockId::PreShift, "1.1", TaskStatus::Desviacion).unwrap();
        set_task_status(&mut shift, BlockId::Leadership, "4.2", TaskStatus::Desviacion).unwrap();
        set_task_status(&mut shift, BlockId::Leadership, "4.3", TaskStatus::Cumplido).unwrap();
        assert_eq!(deviation_count(&shift), 2);
    }
}
