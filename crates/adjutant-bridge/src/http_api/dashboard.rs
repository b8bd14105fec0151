//! `/api/dashboard` -- the single aggregated view the UI loads on open.
//!
//! Runs every constituent query concurrently and independently. A failing
//! section never fails the whole response: each result is wrapped in a
//! [`DashboardSection`] that carries either data or an error string.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use adjutant_beads::BeadFilter;
use adjutant_core::types::BeadStatus;
use adjutant_messages::MessageFilter;

use super::state::ApiState;
use crate::api_error::ApiError;

#[derive(Debug, Serialize)]
pub(crate) struct DashboardSection<T: Serialize> {
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> DashboardSection<T> {
    fn from_result(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(data) => Self { data: Some(data), error: None },
            Err(err) => Self { data: None, error: Some(err.to_string()) },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Dashboard {
    status: DashboardSection<serde_json::Value>,
    beads_open: DashboardSection<serde_json::Value>,
    beads_in_progress: DashboardSection<serde_json::Value>,
    beads_recently_closed: DashboardSection<serde_json::Value>,
    crew: DashboardSection<serde_json::Value>,
    unread_counts: DashboardSection<serde_json::Value>,
    epics_with_progress: DashboardSection<serde_json::Value>,
    mail_preview: DashboardSection<serde_json::Value>,
}

/// GET /api/dashboard
pub(crate) async fn dashboard(State(state): State<Arc<ApiState>>) -> Json<Dashboard> {
    let (status, beads_open, beads_in_progress, beads_recently_closed, crew, unread_counts, epics_with_progress, mail_preview) = tokio::join!(
        fetch_status(&state),
        fetch_beads_open(&state),
        fetch_beads_in_progress(&state),
        fetch_beads_recently_closed(&state),
        fetch_crew(&state),
        fetch_unread_counts(&state),
        fetch_epics_with_progress(&state),
        fetch_mail_preview(&state),
    );

    Json(Dashboard {
        status: DashboardSection::from_result(status),
        beads_open: DashboardSection::from_result(beads_open),
        beads_in_progress: DashboardSection::from_result(beads_in_progress),
        beads_recently_closed: DashboardSection::from_result(beads_recently_closed),
        crew: DashboardSection::from_result(crew),
        unread_counts: DashboardSection::from_result(unread_counts),
        epics_with_progress: DashboardSection::from_result(epics_with_progress),
        mail_preview: DashboardSection::from_result(mail_preview),
    })
}

async fn fetch_status(state: &ApiState) -> Result<serde_json::Value, ApiError> {
    let status = state.status_provider.get_status().await?;
    Ok(serde_json::to_value(status).map_err(|e| ApiError::Internal(e.to_string()))?)
}

async fn fetch_beads_open(state: &ApiState) -> Result<serde_json::Value, ApiError> {
    let filter = BeadFilter { status: Some(BeadStatus::Open), ..Default::default() };
    let beads = state.beads.list(filter).await?;
    Ok(serde_json::to_value(beads).map_err(|e| ApiError::Internal(e.to_string()))?)
}

async fn fetch_beads_in_progress(state: &ApiState) -> Result<serde_json::Value, ApiError> {
    let filter = BeadFilter { status: Some(BeadStatus::InProgress), ..Default::default() };
    let beads = state.beads.list(filter).await?;
    Ok(serde_json::to_value(beads).map_err(|e| ApiError::Internal(e.to_string()))?)
}

async fn fetch_beads_recently_closed(state: &ApiState) -> Result<serde_json::Value, ApiError> {
    let beads = state.beads.list_recently_closed(24).await?;
    Ok(serde_json::to_value(beads).map_err(|e| ApiError::Internal(e.to_string()))?)
}

async fn fetch_crew(state: &ApiState) -> Result<serde_json::Value, ApiError> {
    let crew = state.mcp_sessions.list();
    Ok(serde_json::to_value(crew).map_err(|e| ApiError::Internal(e.to_string()))?)
}

async fn fetch_unread_counts(state: &ApiState) -> Result<serde_json::Value, ApiError> {
    let counts = state.messages.unread_counts(None).await?;
    Ok(serde_json::to_value(counts).map_err(|e| ApiError::Internal(e.to_string()))?)
}

async fn fetch_epics_with_progress(state: &ApiState) -> Result<serde_json::Value, ApiError> {
    let epics = state.beads.epics_with_progress(None).await?;
    Ok(serde_json::to_value(epics).map_err(|e| ApiError::Internal(e.to_string()))?)
}

async fn fetch_mail_preview(state: &ApiState) -> Result<serde_json::Value, ApiError> {
    let filter = MessageFilter { limit: 10, ..Default::default() };
    let messages = state.messages.read(filter).await?;
    Ok(serde_json::to_value(messages).map_err(|e| ApiError::Internal(e.to_string()))?)
}
