//! Health endpoint

use axum::extract::State;
use axum::response::Response;
use chrono::Utc;
use serde::Serialize;

use super::ApiState;
use crate::api::envelope::ApiResponse;
use crate::session::ShiftPhase;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: i64,
    pub phase: ShiftPhase,
    pub report_generator: &'static str,
    /// Whether `/report` can reach the upstream model
    pub upstream_configured: bool,
    pub archived_shifts: Option<usize>,
}

/// GET /api/v1/health
pub async fn health(State(state): State<ApiState>) -> Response {
    let archived_shifts = match state.service.history_count().await {
        Ok(n) => Some(n),
        Err(e) => {
            tracing::warn!(error = %e, "Could not count archived shifts");
            None
        }
    };

    ApiResponse::ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
        phase: state.service.phase().await,
        report_generator: state.service.generator_name(),
        upstream_configured: state.generator.is_some(),
        archived_shifts,
    })
}
