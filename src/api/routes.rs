//! API route definitions
//!
//! - /api/v1/health - Service health and current shift phase
//! - /api/v1/shift/* - Current shift, edits, closure, new shift, history
//! - /api/v1/report - Narrative generation via the upstream model

use axum::{
    routing::{any, get, post, put},
    Router,
};

use super::handlers::{self, ApiState};

/// Create all API routes
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Current shift
        .route("/shift", get(handlers::get_shift))
        .route("/shift/metrics", get(handlers::get_metrics))
        .route("/shift/setup", post(handlers::setup_shift))
        // Checklist and bitácora edits
        .route("/shift/blocks/:block/tasks/:task/status", put(handlers::set_task_status))
        .route("/shift/blocks/:block/tasks/:task/note", put(handlers::set_task_note))
        .route("/shift/bitacora", put(handlers::set_bitacora))
        // Lifecycle transitions
        .route("/shift/close", post(handlers::close_shift))
        .route("/shift/new", post(handlers::new_shift))
        .route("/shift/history", get(handlers::shift_history))
        // Report generation (method checked in the handler)
        .route("/report", any(handlers::generate_report))
        .with_state(state)
}
