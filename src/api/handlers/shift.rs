//! Shift endpoints

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{session_error_response, ApiState};
use crate::api::envelope::{ApiErrorResponse, ApiResponse};
use crate::checklist::EditOutcome;
use crate::session::ShiftView;
use crate::types::{BitacoraField, BlockId, SetupInput, TaskStatus};

const DEFAULT_HISTORY_LIMIT: usize = 20;
const MAX_HISTORY_LIMIT: usize = 200;

#[derive(Debug, Deserialize)]
pub struct TaskStatusRequest {
    pub status: TaskStatus,
}

#[derive(Debug, Deserialize)]
pub struct TaskNoteRequest {
    pub note: String,
}

#[derive(Debug, Deserialize)]
pub struct BitacoraRequest {
    pub field: BitacoraField,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// Edit result: outcome plus the updated shift
#[derive(Debug, Serialize)]
pub struct EditResponse {
    pub outcome: EditOutcome,
    #[serde(flatten)]
    pub view: ShiftView,
}

fn edit_response(result: Result<(EditOutcome, ShiftView), crate::session::SessionError>) -> Response {
    match result {
        Ok((outcome, view)) => ApiResponse::ok(EditResponse { outcome, view }),
        Err(e) => session_error_response(e),
    }
}

fn parse_block(raw: &str) -> Result<BlockId, Response> {
    BlockId::parse(raw).ok_or_else(|| ApiErrorResponse::not_found(format!("Unknown block '{}'", raw)))
}

/// GET /api/v1/shift
pub async fn get_shift(State(state): State<ApiState>) -> Response {
    ApiResponse::ok(state.service.view().await)
}

/// GET /api/v1/shift/metrics
pub async fn get_metrics(State(state): State<ApiState>) -> Response {
    ApiResponse::ok(state.service.metrics().await)
}

/// POST /api/v1/shift/setup
pub async fn setup_shift(
    State(state): State<ApiState>,
    payload: Result<Json<SetupInput>, JsonRejection>,
) -> Response {
    let Json(setup) = match payload {
        Ok(p) => p,
        Err(e) => return ApiErrorResponse::bad_request(format!("Invalid setup: {}", e.body_text())),
    };

    match state.service.configure(setup).await {
        Ok(view) => ApiResponse::ok(view),
        Err(e) => session_error_response(e),
    }
}

/// PUT /api/v1/shift/blocks/:block/tasks/:task/status
pub async fn set_task_status(
    State(state): State<ApiState>,
    Path((block, task)): Path<(String, String)>,
    payload: Result<Json<TaskStatusRequest>, JsonRejection>,
) -> Response {
    let block_id = match parse_block(&block) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let Json(request) = match payload {
        Ok(p) => p,
        Err(e) => {
            return ApiErrorResponse::bad_request(format!(
                "Invalid status: {}. Use CUMPLIDO, NO_APLICA or DESVIACION.",
                e.body_text()
            ))
        }
    };

    edit_response(state.service.set_task_status(block_id, &task, request.status).await)
}

/// PUT /api/v1/shift/blocks/:block/tasks/:task/note
pub async fn set_task_note(
    State(state): State<ApiState>,
    Path((block, task)): Path<(String, String)>,
    payload: Result<Json<TaskNoteRequest>, JsonRejection>,
) -> Response {
    let block_id = match parse_block(&block) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let Json(request) = match payload {
        Ok(p) => p,
        Err(e) => return ApiErrorResponse::bad_request(format!("Invalid note: {}", e.body_text())),
    };

    edit_response(state.service.set_task_note(block_id, &task, &request.note).await)
}

/// PUT /api/v1/shift/bitacora
pub async fn set_bitacora(
    State(state): State<ApiState>,
    payload: Result<Json<BitacoraRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(p) => p,
        Err(e) => {
            return ApiErrorResponse::bad_request(format!(
                "Invalid bitácora update: {}. Fields: criticalDecisions, avoidedRisks, nextShiftAlerts.",
                e.body_text()
            ))
        }
    };

    edit_response(state.service.set_bitacora(request.field, &request.text).await)
}

/// POST /api/v1/shift/close
pub async fn close_shift(State(state): State<ApiState>) -> Response {
    match state.service.close_shift().await {
        Ok(view) => ApiResponse::ok(view),
        Err(e) => session_error_response(e),
    }
}

/// POST /api/v1/shift/new
///
/// An empty body carries the identity over; a setup body reconfigures it.
pub async fn new_shift(State(state): State<ApiState>, body: Bytes) -> Response {
    let reconfigure = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        match serde_json::from_slice::<SetupInput>(&body) {
            Ok(setup) => Some(setup),
            Err(e) => return ApiErrorResponse::bad_request(format!("Invalid setup: {}", e)),
        }
    };

    match state.service.start_new_shift(reconfigure).await {
        Ok(view) => ApiResponse::ok(view),
        Err(e) => session_error_response(e),
    }
}

/// GET /api/v1/shift/history?limit=N
pub async fn shift_history(State(state): State<ApiState>, Query(q): Query<HistoryQuery>) -> Response {
    let limit = q.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).min(MAX_HISTORY_LIMIT);

    match state.service.history(limit).await {
        Ok(entries) => ApiResponse::ok(entries),
        Err(e) => session_error_response(e),
    }
}
