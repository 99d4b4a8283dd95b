use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::state::AppState;

/// `GET /health` — liveness check.
///
/// Configuration is resolved before the listener starts, so a running server
/// is always healthy. The body reports how many upstream calls a full grid
/// render costs.
///
/// Response shape:
/// ```json
/// { "status": "ok", "version": "0.1.0", "properties": 2, "requests_per_render": 7 }
/// ```
#[tracing::instrument(skip(state))]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "properties": state.configurator.properties().len(),
            "requests_per_render": state.configurator.total_requests(),
        })),
    )
}
