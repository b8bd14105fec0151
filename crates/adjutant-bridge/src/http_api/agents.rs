//! `/api/agents` -- connected MCP agent sessions and spawning new ones.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use adjutant_core::types::WorkspaceType;

use super::state::ApiState;
use crate::api_error::{ok_json, ApiError};

/// GET /api/agents -- list currently connected MCP agent sessions.
pub(crate) async fn list_agents(State(state): State<Arc<ApiState>>) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(ok_json(state.mcp_sessions.list()))
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpawnAgentRequest {
    pub rig: Option<String>,
    pub project_id: Option<String>,
    pub callsign: Option<String>,
}

/// POST /api/agents/spawn -- start a tmux-backed coding session for a rig or
/// registered project. The spawned session becomes a tracked MCP agent once
/// the process inside it calls `initialize`.
pub(crate) async fn spawn_agent(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SpawnAgentRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let project_path = if let Some(project_id) = &request.project_id {
        state
            .projects
            .list()
            .await
            .into_iter()
            .find(|p| &p.id == project_id)
            .map(|p| p.path)
            .ok_or_else(|| ApiError::NotFound(format!("no project with id {project_id}")))?
    } else if let Some(rig) = &request.rig {
        rig.clone()
    } else {
        return Err(ApiError::Validation("either rig or project_id is required".into()));
    };

    let record = state
        .session_bridge
        .create(project_path, "claude".to_string(), request.callsign, WorkspaceType::Primary)
        .await?;
    Ok(ok_json(record))
}
