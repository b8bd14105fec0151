//! `/api/status`, `/api/power/up`, `/api/power/down`.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use super::state::ApiState;
use crate::api_error::{ok_json, ApiError};

/// GET /api/status
pub(crate) async fn get_status(State(state): State<Arc<ApiState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let status = state.status_provider.get_status().await?;
    Ok(ok_json(status))
}

/// POST /api/power/up
pub(crate) async fn power_up(State(state): State<Arc<ApiState>>) -> Result<Json<serde_json::Value>, ApiError> {
    state.status_provider.power_up().await?;
    Ok(ok_json(serde_json::json!({ "powered": "up" })))
}

/// POST /api/power/down
pub(crate) async fn power_down(State(state): State<Arc<ApiState>>) -> Result<Json<serde_json::Value>, ApiError> {
    state.status_provider.power_down().await?;
    Ok(ok_json(serde_json::json!({ "powered": "down" })))
}
