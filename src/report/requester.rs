//! Report Requester: client side of the narrative-generation boundary
//!
//! Sends one instruction string to the report endpoint and turns whatever
//! comes back into either the generated narrative or a single [`ReportError`].
//! Network failures, non-success statuses, unparseable bodies and
//! application-level error fields all collapse into the same error shape.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::prompt::{build_instruction, PromptStyle};
use crate::types::ShiftData;

/// Every failure text starts with this marker
pub const REPORT_ERROR_MARKER: &str = "ERROR";

/// Failed narrative generation.
///
/// The `Display` text is what the supervisor sees; it always starts with
/// [`REPORT_ERROR_MARKER`] followed by the most specific diagnostic available.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    /// Request never produced a response
    #[error("ERROR DE CONEXIÓN: {0}")]
    Transport(String),
    /// Endpoint answered with a failure status or an error field
    #[error("ERROR DE CONEXIÓN: {0}")]
    Upstream(String),
    /// Success status but the body did not match the response contract
    #[error("ERROR DE CONEXIÓN: {0}")]
    Malformed(String),
    /// Success status with no generated text
    #[error("ERROR: Respuesta vacía del servidor.")]
    EmptyResponse,
}

/// Narrative generator seen by the lifecycle controller
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    /// Produce the closure narrative for `shift` graded at `score`
    async fn generate(&self, shift: &ShiftData, score: u8) -> Result<String, ReportError>;

    /// Get the generator name for logging
    fn generator_name(&self) -> &'static str;
}

#[derive(Debug, Serialize)]
struct PromptBody<'a> {
    prompt: &'a str,
}

/// Accepted response shapes: the `{data: {text}}` envelope or a bare `{text}`.
#[derive(Debug, Default, Deserialize)]
struct ReportEnvelope {
    #[serde(default)]
    data: Option<GeneratedText>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    #[serde(default)]
    text: Option<String>,
}

impl ReportEnvelope {
    fn generated_text(self) -> Option<String> {
        self.data
            .and_then(|d| d.text)
            .or(self.text)
            .filter(|t| !t.trim().is_empty())
    }
}

/// Human-readable form of an error field: `{message}` objects, plain
/// strings, or the raw JSON of anything else.
fn describe_error_field(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.trim().is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(map) => match map.get("message").and_then(|m| m.as_str()) {
            Some(message) if !message.trim().is_empty() => Some(message.to_string()),
            _ => Some(value.to_string()),
        },
        other => Some(other.to_string()),
    }
}

/// Pick the diagnostic: parsed error field > raw body > HTTP status code.
fn best_diagnostic(envelope: Option<&ReportEnvelope>, raw: &str, status: u16) -> String {
    envelope
        .and_then(|e| e.error.as_ref())
        .and_then(describe_error_field)
        .or_else(|| {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| format!("HTTP {}", status))
}

/// Interpret one response from the report endpoint.
pub fn interpret_response(status: u16, raw: &str) -> Result<String, ReportError> {
    let envelope = serde_json::from_str::<ReportEnvelope>(raw).ok();
    let success = (200..300).contains(&status);

    if !success {
        return Err(ReportError::Upstream(best_diagnostic(envelope.as_ref(), raw, status)));
    }

    let Some(envelope) = envelope else {
        if raw.trim().is_empty() {
            return Err(ReportError::EmptyResponse);
        }
        return Err(ReportError::Malformed(best_diagnostic(None, raw, status)));
    };

    if let Some(detail) = envelope.error.as_ref().and_then(describe_error_field) {
        return Err(ReportError::Upstream(detail));
    }

    envelope.generated_text().ok_or(ReportError::EmptyResponse)
}

/// HTTP client for the report endpoint
#[derive(Clone)]
pub struct HttpReportRequester {
    http: reqwest::Client,
    endpoint: String,
    style: PromptStyle,
}

impl HttpReportRequester {
    /// Create a requester posting to `endpoint` with the given request timeout
    pub fn new(endpoint: &str, timeout: Duration, style: PromptStyle) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            style,
        })
    }

    /// Endpoint URL for logging
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Exchange one instruction string with the endpoint
    pub async fn request(&self, instruction: &str) -> Result<String, ReportError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .json(&PromptBody { prompt: instruction })
            .send()
            .await
            .map_err(|e| ReportError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        let raw = resp
            .text()
            .await
            .map_err(|e| ReportError::Transport(e.to_string()))?;

        interpret_response(status, &raw)
    }
}

#[async_trait]
impl ReportGenerator for HttpReportRequester {
    async fn generate(&self, shift: &ShiftData, score: u8) -> Result<String, ReportError> {
        let instruction = build_instruction(shift, score, &self.style);
        tracing::info!(
            well = %shift.well_name,
            score,
            endpoint = %self.endpoint,
            prompt_chars = instruction.chars().count(),
            "Requesting closure narrative"
        );

        let result = self.request(&instruction).await;
        if let Err(e) = &result {
            tracing::warn!(well = %shift.well_name, error = %e, "Narrative generation failed");
        }
        result
    }

    fn generator_name(&self) -> &'static str {
        "HttpReportRequester"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use chrono::NaiveDate;

    #[test]
    fn test_success_envelope() {
        let raw = r###"{"data":{"text":"## Reporte"},"meta":{"version":"1"}}"###;
        assert_eq!(interpret_response(200, raw).unwrap(), "## Reporte");
    }

    #[test]
    fn test_bare_text_shape() {
        assert_eq!(interpret_response(200, r#"{"text":"ok"}"#).unwrap(), "ok");
    }

    #[test]
    fn test_success_without_text_is_empty_response() {
        assert_eq!(interpret_response(200, r#"{"data":{}}"#), Err(ReportError::EmptyResponse));
        assert_eq!(interpret_response(200, r#"{"data":{"text":""}}"#), Err(ReportError::EmptyResponse));
        assert_eq!(interpret_response(204, ""), Err(ReportError::EmptyResponse));
        assert_eq!(
            ReportError::EmptyResponse.to_string(),
            "ERROR: Respuesta vacía del servidor."
        );
    }

    #[test]
    fn test_error_field_preferred_over_body() {
        let raw = r#"{"error":{"code":"CONFIG_ERROR","message":"Missing GEMINI_API_KEY"}}"#;
        let err = interpret_response(500, raw).unwrap_err();
        assert_eq!(err.to_string(), "ERROR DE CONEXIÓN: Missing GEMINI_API_KEY");
    }

    #[test]
    fn test_string_error_field() {
        let err = interpret_response(400, r#"{"error":"Missing prompt"}"#).unwrap_err();
        assert_eq!(err, ReportError::Upstream("Missing prompt".to_string()));
    }

    #[test]
    fn test_raw_body_when_not_json() {
        let err = interpret_response(502, "Bad Gateway from proxy").unwrap_err();
        assert_eq!(err.to_string(), "ERROR DE CONEXIÓN: Bad Gateway from proxy");
    }

    #[test]
    fn test_status_code_when_body_empty() {
        let err = interpret_response(503, "").unwrap_err();
        assert_eq!(err.to_string(), "ERROR DE CONEXIÓN: HTTP 503");
    }

    #[test]
    fn test_error_field_on_success_status() {
        let err = interpret_response(200, r#"{"error":"quota exceeded"}"#).unwrap_err();
        assert_eq!(err, ReportError::Upstream("quota exceeded".to_string()));
    }

    #[test]
    fn test_malformed_success_body() {
        let err = interpret_response(200, "<html>oops</html>").unwrap_err();
        assert_eq!(err, ReportError::Malformed("<html>oops</html>".to_string()));
        assert!(err.to_string().starts_with(REPORT_ERROR_MARKER));
    }

    async fn spawn_endpoint(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });
        format!("http://{}/api/v1/report", addr)
    }

    fn sample_shift() -> ShiftData {
        let mut shift = ShiftData::blank(NaiveDate::from_ymd_opt(2025, 4, 2).unwrap());
        shift.well_name = "ACA-22".to_string();
        shift.rig = "SLR-3".to_string();
        shift
    }

    #[tokio::test]
    async fn test_requester_round_trip() {
        let router = Router::new().route(
            "/api/v1/report",
            post(|Json(body): Json<serde_json::Value>| async move {
                let prompt = body["prompt"].as_str().unwrap_or_default().to_string();
                let echoed = if prompt.contains("ACA-22") && prompt.contains("(Score): 75%") {
                    "narrativa ok"
                } else {
                    "prompt incompleto"
                };
                Json(serde_json::json!({ "data": { "text": echoed } }))
            }),
        );
        let endpoint = spawn_endpoint(router).await;
        let requester =
            HttpReportRequester::new(&endpoint, Duration::from_secs(5), PromptStyle::default()).unwrap();

        let text = requester.generate(&sample_shift(), 75).await.unwrap();
        assert_eq!(text, "narrativa ok");
    }

    #[tokio::test]
    async fn test_requester_forwards_upstream_failure() {
        let router = Router::new().route(
            "/api/v1/report",
            post(|| async {
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(serde_json::json!({ "error": { "code": "UPSTREAM_ERROR", "message": "quota" } })),
                )
            }),
        );
        let endpoint = spawn_endpoint(router).await;
        let requester =
            HttpReportRequester::new(&endpoint, Duration::from_secs(5), PromptStyle::default()).unwrap();

        let err = requester.generate(&sample_shift(), 10).await.unwrap_err();
        assert_eq!(err.to_string(), "ERROR DE CONEXIÓN: quota");
    }

    #[tokio::test]
    async fn test_requester_transport_failure() {
        // Bind then drop to get a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let requester = HttpReportRequester::new(
            &format!("http://{}/api/v1/report", addr),
            Duration::from_secs(2),
            PromptStyle::default(),
        )
        .unwrap();

        let err = requester.generate(&sample_shift(), 10).await.unwrap_err();
        assert!(matches!(err, ReportError::Transport(_)));
        assert!(err.to_string().starts_with("ERROR DE CONEXIÓN: "));
    }
}
