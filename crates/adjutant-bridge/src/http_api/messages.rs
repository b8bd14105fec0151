//! `/api/messages`.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use adjutant_core::types::MessageRole;
use adjutant_messages::MessageFilter;

use super::state::ApiState;
use crate::api_error::{ok_json, ApiError};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListMessagesQuery {
    pub agent_id: Option<String>,
    pub thread_id: Option<String>,
    pub limit: Option<u32>,
    pub before: Option<String>,
    pub before_id: Option<String>,
}

/// GET /api/messages?agent_id?&thread?&limit?&before?
pub(crate) async fn list_messages(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ListMessagesQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let before_cursor = match (query.before, query.before_id) {
        (Some(ts), Some(id)) => {
            let ts: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts)
                .map_err(|e| ApiError::Validation(format!("invalid before: {e}")))?
                .with_timezone(&Utc);
            let id = Uuid::parse_str(&id).map_err(|e| ApiError::Validation(format!("invalid before_id: {e}")))?;
            Some((ts, id))
        }
        (None, None) => None,
        _ => return Err(ApiError::Validation("before and before_id must be supplied together".into())),
    };

    let filter = MessageFilter {
        thread_id: query.thread_id,
        agent_id: query.agent_id,
        before_cursor,
        limit: query.limit.unwrap_or(50),
    };
    let messages = state.messages.read(filter).await?;
    Ok(ok_json(messages))
}

#[derive(Debug, Deserialize)]
pub(crate) struct SendMessageRequest {
    pub sender: String,
    pub recipient: String,
    pub body: String,
    pub thread_id: Option<String>,
    pub event_type: Option<String>,
    pub priority: Option<u8>,
    pub metadata: Option<serde_json::Value>,
}

/// POST /api/messages -- user-initiated send.
pub(crate) async fn send_message(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let message = state
        .messages
        .insert(
            request.sender,
            request.recipient,
            MessageRole::User,
            request.body,
            request.thread_id,
            request.event_type,
            request.priority,
            request.metadata,
        )
        .await?;
    Ok(ok_json(message))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UnreadQuery {
    pub agent_id: Option<String>,
}

/// GET /api/messages/unread
pub(crate) async fn unread_counts(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<UnreadQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let counts = state.messages.unread_counts(query.agent_id).await?;
    Ok(ok_json(counts))
}
