//! Report-generation endpoint
//!
//! Receives `{"prompt": "..."}`, forwards the prompt to the upstream model
//! and answers `{"data": {"text": "..."}}`.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::Method;
use axum::response::Response;
use serde::Serialize;
use tracing::{info, warn};

use super::ApiState;
use crate::api::envelope::{ApiErrorResponse, ApiResponse};
use crate::report::GeneratorError;

#[derive(Debug, Serialize)]
pub struct GeneratedReport {
    pub text: String,
}

/// Non-blank `prompt` string of a JSON body
fn extract_prompt(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("prompt")
        .and_then(|p| p.as_str())
        .filter(|p| !p.trim().is_empty())
        .map(str::to_string)
}

/// Message from an upstream error body: its `error.message` when present,
/// otherwise the raw body.
fn upstream_message(status: u16, body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let message = parsed.as_ref().and_then(|v| {
        v.pointer("/error/message")
            .and_then(|m| m.as_str())
            .or_else(|| v.get("error").and_then(|e| e.as_str()))
    });

    match message {
        Some(m) if !m.trim().is_empty() => m.to_string(),
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => format!("Upstream returned HTTP {}", status),
    }
}

/// ANY /api/v1/report
pub async fn generate_report(State(state): State<ApiState>, method: Method, body: Bytes) -> Response {
    if method != Method::POST {
        return ApiErrorResponse::method_not_allowed(format!("Method {} not allowed; use POST", method));
    }

    let Some(generator) = state.generator.as_ref() else {
        warn!(env = %state.api_key_env, "Report requested but no generator credential is configured");
        return ApiErrorResponse::config_error(format!("Missing {}", state.api_key_env));
    };

    let Some(prompt) = extract_prompt(&body) else {
        return ApiErrorResponse::bad_request("Missing prompt");
    };

    info!(backend = generator.backend_name(), prompt_chars = prompt.chars().count(), "Generating report");

    match generator.generate(&prompt).await {
        Ok(text) => ApiResponse::ok(GeneratedReport { text }),
        Err(GeneratorError::Upstream { status, body }) => {
            warn!(status, "Upstream model rejected report request");
            ApiErrorResponse::upstream(status, upstream_message(status, &body))
        }
        Err(e) => {
            warn!(error = %e, "Report generation failed");
            ApiErrorResponse::internal(e.to_string())
        }
    }
}
