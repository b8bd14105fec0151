//! `/api/proposals`.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use adjutant_core::types::{ProposalStatus, ProposalType};

use super::state::ApiState;
use crate::api_error::{ok_json, ApiError};

fn parse_proposal_type(s: &str) -> Result<ProposalType, ApiError> {
    match s {
        "product" => Ok(ProposalType::Product),
        "engineering" => Ok(ProposalType::Engineering),
        other => Err(ApiError::Validation(format!("unknown proposal type: {other}"))),
    }
}

fn parse_proposal_status(s: &str) -> Result<ProposalStatus, ApiError> {
    match s {
        "pending" => Ok(ProposalStatus::Pending),
        "accepted" => Ok(ProposalStatus::Accepted),
        "dismissed" => Ok(ProposalStatus::Dismissed),
        "completed" => Ok(ProposalStatus::Completed),
        other => Err(ApiError::Validation(format!("unknown proposal status: {other}"))),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateProposalRequest {
    pub author: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub proposal_type: String,
}

/// POST /api/proposals
pub(crate) async fn create_proposal(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<CreateProposalRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let proposal_type = parse_proposal_type(&request.proposal_type)?;
    let proposal = state
        .proposals
        .create(request.author, request.title, request.description, proposal_type)
        .await?;
    Ok(ok_json(proposal))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListProposalsQuery {
    pub status: Option<String>,
}

/// GET /api/proposals?status
pub(crate) async fn list_proposals(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ListProposalsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let status = query.status.as_deref().map(parse_proposal_status).transpose()?;
    let proposals = state.proposals.list(status).await?;
    Ok(ok_json(proposals))
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateProposalRequest {
    pub status: String,
}

/// PATCH /api/proposals/:id
pub(crate) async fn update_proposal(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Json(request): Json<UpdateProposalRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::Validation("id must be a uuid".into()))?;
    let target = parse_proposal_status(&request.status)?;
    let proposal = state.proposals.update_status(id, target).await?;
    Ok(ok_json(proposal))
}
