//! Core enums: TaskStatus, OperationType, BlockId, BitacoraField

use serde::{Deserialize, Serialize};

// ============================================================================
// Task Status (tri-state compliance)
// ============================================================================

/// Compliance status recorded by the supervisor for a single checklist task.
///
/// - **Cumplido**: task performed as required (counts toward the score)
/// - **NoAplica**: not applicable this shift (excluded from the score)
/// - **Desviacion**: deviation found; a technical note is expected
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Cumplido,
    NoAplica,
    Desviacion,
}

impl TaskStatus {
    /// Wire / prompt code
    pub fn code(&self) -> &'static str {
        match self {
            TaskStatus::Cumplido => "CUMPLIDO",
            TaskStatus::NoAplica => "NO_APLICA",
            TaskStatus::Desviacion => "DESVIACION",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Operation Type (Drilling vs Workover)
// ============================================================================

/// Operation type determines which technical parameters the narrative may cite
///
/// - **Perforacion**: drilling; rotary parameters allowed when the notes carry them
/// - **Workover**: intervention; rotary parameters forbidden, focus on trips,
///   overpull, tool setting, integrity tests and completion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    #[default]
    Perforacion,
    Workover,
}

impl OperationType {
    /// Get display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            OperationType::Perforacion => "Perforación",
            OperationType::Workover => "Workover",
        }
    }

    /// Get short code for logging
    pub fn short_code(&self) -> &'static str {
        match self {
            OperationType::Perforacion => "PERFORACION",
            OperationType::Workover => "WORKOVER",
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Block identifiers (fixed order)
// ============================================================================

/// The five checklist blocks, in template order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockId {
    PreShift,
    Operation,
    Technical,
    Leadership,
    Closure,
}

impl BlockId {
    /// All blocks in template order
    pub const ALL: [BlockId; 5] = [
        BlockId::PreShift,
        BlockId::Operation,
        BlockId::Technical,
        BlockId::Leadership,
        BlockId::Closure,
    ];

    /// The block whose tasks must all be answered before closing a shift
    pub const CLOSURE_EVIDENCE: BlockId = BlockId::Closure;

    pub fn code(&self) -> &'static str {
        match self {
            BlockId::PreShift => "PRE_SHIFT",
            BlockId::Operation => "OPERATION",
            BlockId::Technical => "TECHNICAL",
            BlockId::Leadership => "LEADERSHIP",
            BlockId::Closure => "CLOSURE",
        }
    }

    /// Parse a block code as used in URLs (`PRE_SHIFT`, `pre_shift`, ...)
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|b| b.code().eq_ignore_ascii_case(s.trim()))
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Bitácora (free-text operational log)
// ============================================================================

/// One of the three free-text log fields kept alongside the checklist.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum BitacoraField {
    CriticalDecisions,
    AvoidedRisks,
    NextShiftAlerts,
}
