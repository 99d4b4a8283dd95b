use axum::{response::IntoResponse, Json};
use serde_json::json;

use profilegrid_core::period::preset_links;

/// `GET /api/periods` — quick-link period selectors.
pub async fn list_periods() -> impl IntoResponse {
    Json(json!({ "data": preset_links() }))
}
