use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::{error::AppError, state::AppState};

/// `GET /api/properties` — configured properties, their request keys and the
/// predefined template ids a property may list.
pub async fn list_properties(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let data: Vec<_> = state
        .configurator
        .properties()
        .iter()
        .map(|p| {
            json!({
                "id": p.id,
                "label": p.label,
                "requests": p.requests.keys().collect::<Vec<_>>(),
            })
        })
        .collect();

    Json(json!({
        "data": data,
        "total_requests": state.configurator.total_requests(),
        "available_templates": state.configurator.catalog().ids().collect::<Vec<_>>(),
    }))
}

/// `GET /api/properties/{id}/requests` — fully resolved requests of one property.
pub async fn get_requests(
    State(state): State<Arc<AppState>>,
    Path(property_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let property = state
        .configurator
        .property(&property_id)
        .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;
    Ok(Json(json!({ "data": property })))
}
