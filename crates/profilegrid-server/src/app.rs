use std::sync::Arc;

use axum::{http::HeaderValue, routing::get, Router};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{routes, state::AppState};

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// Middleware is applied in outer-to-inner order (outermost runs first on
/// request, last on response):
///
/// 1. `TraceLayer` — structured request/response logging via `tracing`.
/// 2. `CorsLayer` — configured origins, or any origin when none are set.
pub fn build_app(state: Arc<AppState>) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/periods", get(routes::periods::list_periods))
        .route("/api/properties", get(routes::properties::list_properties))
        .route(
            "/api/properties/{id}/requests",
            get(routes::properties::get_requests),
        )
        .route(
            "/api/properties/{id}/grid",
            get(routes::grid::get_property_grid),
        )
        .route("/api/grid", get(routes::grid::get_grid))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(allow_origin)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
