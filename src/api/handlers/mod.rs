//! API route handlers
//!
//! Request handling logic for all API endpoints including:
//! - Current shift, setup, checklist and bitácora edits
//! - Closure and new-shift transitions, archived history
//! - The report-generation endpoint backed by the upstream model

mod report;
mod shift;
mod status;

pub use report::*;
pub use shift::*;
pub use status::*;

use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Utc};

use super::envelope::ApiErrorResponse;
use crate::checklist::ChecklistError;
use crate::report::TextGenerator;
use crate::session::{SessionError, ShiftService};

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Lifecycle controller for the current shift
    pub service: ShiftService,
    /// Upstream model for `/report`; `None` when no credential is configured
    pub generator: Option<Arc<dyn TextGenerator>>,
    /// Environment variable expected to hold the credential
    pub api_key_env: String,
    pub started_at: DateTime<Utc>,
}

impl ApiState {
    pub fn new(
        service: ShiftService,
        generator: Option<Arc<dyn TextGenerator>>,
        api_key_env: &str,
    ) -> Self {
        Self {
            service,
            generator,
            api_key_env: api_key_env.to_string(),
            started_at: Utc::now(),
        }
    }
}

/// Map a lifecycle error onto the response envelope.
pub(crate) fn session_error_response(err: SessionError) -> Response {
    use axum::http::StatusCode;

    match err {
        SessionError::Validation(msg) => ApiErrorResponse::bad_request(msg),
        SessionError::Checklist(e @ ChecklistError::UnknownTask { .. }) => {
            ApiErrorResponse::not_found(e.to_string())
        }
        e @ SessionError::SetupRequired => {
            ApiErrorResponse::build(StatusCode::CONFLICT, "SETUP_REQUIRED", e.to_string())
        }
        e @ SessionError::ShiftClosed => {
            ApiErrorResponse::build(StatusCode::CONFLICT, "SHIFT_CLOSED", e.to_string())
        }
        e @ SessionError::ClosureInFlight => {
            ApiErrorResponse::build(StatusCode::CONFLICT, "CLOSURE_IN_FLIGHT", e.to_string())
        }
        e @ SessionError::StaleClosure => {
            ApiErrorResponse::build(StatusCode::CONFLICT, "STALE_CLOSURE", e.to_string())
        }
        SessionError::Report(e) => ApiErrorResponse::bad_gateway(e.to_string()),
        SessionError::Storage(e) => {
            tracing::error!(error = %e, "Storage failure");
            ApiErrorResponse::internal(format!("Storage error: {}", e))
        }
        e @ SessionError::ClosureTask(_) => {
            tracing::error!(error = %e, "Closure task aborted");
            ApiErrorResponse::internal(e.to_string())
        }
    }
}
