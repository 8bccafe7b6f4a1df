//! Compliance Scoring Module
//!
//! Deterministic metrics over the checklist blocks. Two distinct figures are
//! produced and must never be mixed up:
//!
//! - **score**: `CUMPLIDO / (answered - NO_APLICA)`, the safety-compliance grade
//!   frozen into the shift at closure
//! - **progress**: `answered / 25`, a display-only completion bar where
//!   `NO_APLICA` counts as answered

use serde::Serialize;

use crate::types::{Block, TaskStatus, TOTAL_TASKS};

/// Round `100 × num / den` to the nearest integer, halves rounding up.
///
/// Caller guarantees `num <= den` and `den > 0`.
fn percent_half_up(num: usize, den: usize) -> u8 {
    let pct = (200 * num + den) / (2 * den);
    u8::try_from(pct.min(100)).unwrap_or(100)
}

/// Compliance score (0-100).
///
/// # Scoring Algorithm
///
/// - numerator: tasks with status `CUMPLIDO`
/// - denominator: tasks with any status other than `NO_APLICA`
/// - unanswered and `NO_APLICA` tasks are excluded from both sides
/// - an empty denominator scores 0
pub fn compute_score(blocks: &[Block]) -> u8 {
    let mut compliant = 0usize;
    let mut graded = 0usize;

    for task in blocks.iter().flat_map(|b| &b.tasks) {
        match task.status {
            Some(TaskStatus::Cumplido) => {
                compliant += 1;
                graded += 1;
            }
            Some(TaskStatus::Desviacion) => graded += 1,
            Some(TaskStatus::NoAplica) | None => {}
        }
    }

    if graded == 0 {
        return 0;
    }
    percent_half_up(compliant, graded)
}

/// Completion progress (0-100) over the fixed 25-task template.
pub fn compute_progress(blocks: &[Block]) -> u8 {
    let answered = blocks
        .iter()
        .flat_map(|b| &b.tasks)
        .filter(|t| t.status.is_some())
        .count();
    percent_half_up(answered.min(TOTAL_TASKS), TOTAL_TASKS)
}

/// Snapshot of all display metrics for a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftMetrics {
    pub score: u8,
    pub progress: u8,
    pub deviations: usize,
    pub not_applicable: usize,
    pub answered: usize,
    pub total_tasks: usize,
}

impl ShiftMetrics {
    pub fn from_blocks(blocks: &[Block]) -> Self {
        let mut deviations = 0;
        let mut not_applicable = 0;
        let mut answered = 0;
        for task in blocks.iter().flat_map(|b| &b.tasks) {
            match task.status {
                Some(TaskStatus::Desviacion) => deviations += 1,
                Some(TaskStatus::NoAplica) => not_applicable += 1,
                _ => {}
            }
            if task.status.is_some() {
                answered += 1;
            }
        }

        Self {
            score: compute_score(blocks),
            progress: compute_progress(blocks),
            deviations,
            not_applicable,
            answered,
            total_tasks: TOTAL_TASKS,
        }
    }
}
