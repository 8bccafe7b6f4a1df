//! REST API module using Axum
//!
//! Provides the `/api/v1` HTTP endpoints for the shift handover service:
//! the shift lifecycle operations and the report-generation endpoint.

pub mod envelope;
pub mod handlers;
mod routes;

pub use handlers::ApiState;

use axum::http::{header, Method};
use axum::response::Response;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use envelope::ApiErrorResponse;

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// Set `HANDOVER_CORS_ORIGINS` to a comma-separated list of allowed origins
/// for a separately hosted form client.
fn build_cors_layer() -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE]);

    match std::env::var("HANDOVER_CORS_ORIGINS") {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            base.allow_origin(allowed)
        }
        Err(_) => base,
    }
}

async fn not_found() -> Response {
    ApiErrorResponse::not_found("No such endpoint")
}

/// Create the complete application router.
pub fn create_app(state: ApiState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes(state))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}
