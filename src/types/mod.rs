//! Shared data structures for the shift-handover checklist
//!
//! - `state`: status, operation type, block and bitácora identifiers
//! - `shift`: Task, Block, ShiftData and the archived history entry
//! - `template`: the fixed 5 × 5 checklist content

mod state;
mod shift;
pub mod template;

pub use state::*;
pub use shift::*;
pub use template::{matches_template, template_blocks, TASKS_PER_BLOCK, TOTAL_TASKS};
