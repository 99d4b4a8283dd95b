use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use profilegrid_core::{
    grid::{build_grid, grid_width_px, render_property},
    Period,
};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct GridQuery {
    pub period: Option<String>,
}

fn parse_period(query: &GridQuery) -> Result<Period, AppError> {
    let raw = query
        .period
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("period is required (e.g. last-7)".to_string()))?;
    Ok(raw.trim().parse::<Period>()?)
}

/// `GET /api/grid?period=last-N` — every property side by side.
///
/// Issues one upstream call per resolved request, sequentially. A property
/// whose call fails carries an `error` and the rest of the grid still renders.
pub async fn get_grid(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GridQuery>,
) -> Result<impl IntoResponse, AppError> {
    let period = parse_period(&query)?;
    let grid = build_grid(
        &state.configurator,
        state.client.as_ref(),
        period,
        state.today(),
    )
    .await?;
    Ok(Json(json!({ "data": grid })))
}

/// `GET /api/properties/{id}/grid?period=last-N` — a single column.
pub async fn get_property_grid(
    State(state): State<Arc<AppState>>,
    Path(property_id): Path<String>,
    Query(query): Query<GridQuery>,
) -> Result<impl IntoResponse, AppError> {
    let period = parse_period(&query)?;
    let property = state
        .configurator
        .property(&property_id)
        .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;

    let range = period.resolve(state.today())?;
    let column = render_property(state.client.as_ref(), property, range).await;
    Ok(Json(json!({
        "data": {
            "period": period,
            "range": range,
            "width_px": grid_width_px(1),
            "columns": [column],
        }
    })))
}
