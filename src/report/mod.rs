//! Closure narrative generation
//!
//! ## Architecture
//!
//! - **prompt**: builds the single instruction string from a shift snapshot
//! - **requester**: client side; exchanges the instruction with the report
//!   endpoint and collapses every failure into one [`ReportError`]
//! - **gemini**: server side; the upstream model behind the report endpoint

pub mod gemini;
pub mod prompt;
pub mod requester;

pub use gemini::{GeminiClient, GeneratorError, TextGenerator};
pub use prompt::{build_instruction, PromptStyle};
pub use requester::{HttpReportRequester, ReportError, ReportGenerator, REPORT_ERROR_MARKER};
