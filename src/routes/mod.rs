// HTTP + WebSocket surface for presentation collaborators

mod http;
mod ws;

use axum::{
    Router,
    routing::{get, put},
};
use tower_http::cors::{Any, CorsLayer};

use crate::poller::PollerControl;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) control: PollerControl,
}

pub fn app(control: PollerControl) -> Router {
    let state = AppState { control };
    Router::new()
        .route("/", get(|| async { "healthwatch: polling machine health" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/state", get(http::state_handler)) // GET /api/state
        .route("/api/limit", put(http::set_limit_handler)) // PUT /api/limit
        .route("/ws/state", get(ws::ws_state)) // WS /ws/state
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
