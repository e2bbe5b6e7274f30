// GET/PUT handlers: version, state snapshot, limit reconfiguration

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::AppState;
use crate::alarm::MemoryLimit;
use crate::version::{NAME, VERSION};

/// GET /version — returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/state — latest published monitor view.
pub(super) async fn state_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.control.state().as_ref().clone())
}

#[derive(Debug, Deserialize)]
pub(super) struct LimitRequest {
    /// Integer percentage 0..=100, or null to unset.
    limit: Option<u16>,
}

/// PUT /api/limit — replaces the memory limit and responds once the new limit is published;
/// 400 when out of range, 503 once the poller stopped.
pub(super) async fn set_limit_handler(
    State(state): State<AppState>,
    Json(request): Json<LimitRequest>,
) -> Response {
    let limit = match request.limit.map(MemoryLimit::new).transpose() {
        Ok(limit) => limit,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };
    match state.control.reconfigure_limit(limit).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}
