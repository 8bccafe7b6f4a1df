//! Shift record types: Task, Block, ShiftData, ArchivedShift

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::template::template_blocks;
use super::{BitacoraField, BlockId, OperationType, TaskStatus};

/// A single checklist item.
///
/// `note` is only meaningful when `status` is `DESVIACION`, but it is kept
/// as-is when the status later changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Task {
    pub fn new(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            status: None,
            note: None,
        }
    }

    /// Whether the supervisor has answered this task (any status)
    pub fn is_answered(&self) -> bool {
        self.status.is_some()
    }
}

/// Named group of exactly five related tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub title: String,
    pub tasks: Vec<Task>,
}

impl Block {
    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    /// True when every task carries a status (`NO_APLICA` counts)
    pub fn is_complete(&self) -> bool {
        self.tasks.iter().all(Task::is_answered)
    }
}

/// Identity and setup fields captured when a shift is configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupInput {
    pub well_name: String,
    pub rig: String,
    #[serde(default)]
    pub company_man: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub operation_type: OperationType,
}

/// Complete state of one supervised shift.
///
/// Serialized with camelCase keys so the persisted record keeps the
/// `wellName` / `isClosed` / `aiSummary` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftData {
    pub well_name: String,
    pub rig: String,
    #[serde(default)]
    pub company_man: String,
    pub date: NaiveDate,
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub critical_decisions: String,
    #[serde(default)]
    pub avoided_risks: String,
    #[serde(default)]
    pub next_shift_alerts: String,
    #[serde(default)]
    pub is_closed: bool,
    /// Compliance score 0-100; a placeholder until `is_closed`
    #[serde(default)]
    pub score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    #[serde(default)]
    pub operation_type: OperationType,
}

impl ShiftData {
    /// Template shift with no identity captured yet.
    pub fn blank(date: NaiveDate) -> Self {
        Self {
            well_name: String::new(),
            rig: String::new(),
            company_man: String::new(),
            date,
            blocks: template_blocks(),
            critical_decisions: String::new(),
            avoided_risks: String::new(),
            next_shift_alerts: String::new(),
            is_closed: false,
            score: 0,
            ai_summary: None,
            operation_type: OperationType::default(),
        }
    }

    /// Fresh shift for `date` carrying over well, rig, company man and
    /// operation type from `self`; everything else back to template defaults.
    pub fn next_shift(&self, date: NaiveDate) -> Self {
        Self {
            well_name: self.well_name.clone(),
            rig: self.rig.clone(),
            company_man: self.company_man.clone(),
            operation_type: self.operation_type,
            ..Self::blank(date)
        }
    }

    /// Overwrite the identity fields and operative date.
    pub fn apply_setup(&mut self, setup: &SetupInput) {
        self.well_name = setup.well_name.trim().to_string();
        self.rig = setup.rig.trim().to_string();
        self.company_man = setup.company_man.trim().to_string();
        self.date = setup.date;
        self.operation_type = setup.operation_type;
    }

    /// Whether the mandatory setup fields (well and rig) are present
    pub fn has_identity(&self) -> bool {
        !self.well_name.trim().is_empty() && !self.rig.trim().is_empty()
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn bitacora(&self, field: BitacoraField) -> &str {
        match field {
            BitacoraField::CriticalDecisions => &self.critical_decisions,
            BitacoraField::AvoidedRisks => &self.avoided_risks,
            BitacoraField::NextShiftAlerts => &self.next_shift_alerts,
        }
    }

    pub(crate) fn bitacora_mut(&mut self, field: BitacoraField) -> &mut String {
        match field {
            BitacoraField::CriticalDecisions => &mut self.critical_decisions,
            BitacoraField::AvoidedRisks => &mut self.avoided_risks,
            BitacoraField::NextShiftAlerts => &mut self.next_shift_alerts,
        }
    }

    /// Iterate every task across all blocks in template order
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.blocks.iter().flat_map(|b| b.tasks.iter())
    }
}

/// A shift snapshot appended to history when a new shift starts.
///
/// Serialized as the shift fields plus a `timestamp` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedShift {
    #[serde(flatten)]
    pub shift: ShiftData,
    /// When the shift was archived
    pub timestamp: DateTime<Utc>,
}
