//! `/api/projects`.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use adjutant_projects::RegisterSource;

use super::state::ApiState;
use crate::api_error::{ok_json, ApiError};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CreateProjectRequest {
    ClonePath { path: String },
    CloneUrl { clone_url: String, into: String },
    Empty { name: String, at: String },
}

impl From<CreateProjectRequest> for RegisterSource {
    fn from(req: CreateProjectRequest) -> Self {
        match req {
            CreateProjectRequest::ClonePath { path } => RegisterSource::Path(PathBuf::from(path)),
            CreateProjectRequest::CloneUrl { clone_url, into } => {
                RegisterSource::CloneUrl { url: clone_url, into: PathBuf::from(into) }
            }
            CreateProjectRequest::Empty { name, at } => RegisterSource::Empty { name, at: PathBuf::from(at) },
        }
    }
}

/// GET /api/projects
pub(crate) async fn list_projects(State(state): State<Arc<ApiState>>) -> Json<serde_json::Value> {
    ok_json(state.projects.list().await)
}

/// POST /api/projects
pub(crate) async fn create_project(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<CreateProjectRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let project = state.projects.register(request.into()).await?;
    Ok(ok_json(project))
}

/// POST /api/projects/:id/activate
pub(crate) async fn activate_project(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let project = state.projects.activate(&id).await?;
    Ok(ok_json(project))
}

/// DELETE /api/projects/:id
pub(crate) async fn unregister_project(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.projects.unregister(&id).await?;
    Ok(ok_json(serde_json::json!({ "unregistered": id })))
}

/// GET /api/projects/:id/overview
pub(crate) async fn project_overview(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let project = state
        .projects
        .list()
        .await
        .into_iter()
        .find(|p| p.id == id)
        .ok_or_else(|| ApiError::NotFound(format!("no project with id {id}")))?;
    let overview = state.beads.project_overview(&project.path).await?;
    Ok(ok_json(overview))
}
