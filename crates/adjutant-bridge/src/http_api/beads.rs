//! `/api/beads`, `/api/beads/graph`, `/api/epics-with-progress`.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use adjutant_beads::BeadFilter;
use adjutant_core::types::{BeadStatus, BeadType};

use super::state::ApiState;
use crate::api_error::{ok_json, ApiError};

fn parse_bead_type(s: &str) -> Result<BeadType, ApiError> {
    match s {
        "epic" => Ok(BeadType::Epic),
        "task" => Ok(BeadType::Task),
        "bug" => Ok(BeadType::Bug),
        other => Err(ApiError::Validation(format!("unknown bead type: {other}"))),
    }
}

fn parse_bead_status(s: &str) -> Result<BeadStatus, ApiError> {
    BeadStatus::parse(s).ok_or_else(|| ApiError::Validation(format!("unknown bead status: {s}")))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListBeadsQuery {
    pub status: Option<String>,
    pub assignee: Option<String>,
    #[serde(rename = "type")]
    pub bead_type: Option<String>,
    pub limit: Option<u32>,
    pub rig: Option<String>,
}

/// GET /api/beads?status&assignee&type&limit&rig
pub(crate) async fn list_beads(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ListBeadsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let filter = BeadFilter {
        status: query.status.as_deref().map(parse_bead_status).transpose()?,
        assignee: query.assignee,
        bead_type: query.bead_type.as_deref().map(parse_bead_type).transpose()?,
        limit: query.limit,
        rig: query.rig,
    };
    let beads = state.beads.list(filter).await?;
    Ok(ok_json(beads))
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateBeadRequest {
    pub status: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub priority: Option<u8>,
}

/// PATCH /api/beads/:id
pub(crate) async fn update_bead(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Json(request): Json<UpdateBeadRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let status = request.status.as_deref().map(parse_bead_status).transpose()?;
    let bead = state
        .beads
        .update(&id, status, request.title, request.description, request.assignee, request.priority)
        .await?;
    Ok(ok_json(bead))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GraphQuery {
    pub rig: Option<String>,
}

/// GET /api/beads/graph?rig
pub(crate) async fn bead_graph(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<GraphQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let graph = state.beads.graph(query.rig.as_deref()).await?;
    Ok(ok_json(graph))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EpicsQuery {
    pub status: Option<String>,
}

/// GET /api/epics-with-progress?status
pub(crate) async fn epics_with_progress(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<EpicsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let status = query.status.as_deref().map(parse_bead_status).transpose()?;
    let epics = state.beads.epics_with_progress(status).await?;
    Ok(ok_json(epics))
}
