//! HTTP API error types.
//!
//! Maps the error taxonomy every component error enum carries onto the
//! uniform `{success, data?, error?}` envelope and an HTTP status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use adjutant_beads::BeadsError;
use adjutant_harness::tool_handlers::ToolError;
use adjutant_messages::MessageStoreError;
use adjutant_projects::ProjectsError;
use adjutant_session::SessionError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    AlreadyExists(String),
    #[error("{0}")]
    AlreadyRunning(String),
    #[error("{0}")]
    AlreadyStopped(String),
    #[error("{0}")]
    NotSupported(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Storage(String),
    #[error("{0}")]
    Subprocess(String),
    #[error("{0}")]
    Upstream(String),
    #[error("{0}")]
    Timeout(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::InvalidArgument(_) => "INVALID_ARGUMENT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::AlreadyExists(_) => "ALREADY_EXISTS",
            ApiError::AlreadyRunning(_) => "ALREADY_RUNNING",
            ApiError::AlreadyStopped(_) => "ALREADY_STOPPED",
            ApiError::NotSupported(_) => "NOT_SUPPORTED",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Storage(_) => "STORAGE_ERROR",
            ApiError::Subprocess(_) => "SUBPROCESS_ERROR",
            ApiError::Upstream(_) => "UPSTREAM_ERROR",
            ApiError::Timeout(_) => "TIMEOUT",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::AlreadyExists(_) | ApiError::AlreadyRunning(_) | ApiError::AlreadyStopped(_) => {
                StatusCode::CONFLICT
            }
            ApiError::NotSupported(_) => StatusCode::NOT_IMPLEMENTED,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Storage(_) | ApiError::Subprocess(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "success": false,
            "error": { "code": self.code(), "message": self.to_string() },
        }));
        (status, body).into_response()
    }
}

/// Wraps `data` in the uniform success envelope.
pub fn ok_json<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(json!({ "success": true, "data": data }))
}

impl From<MessageStoreError> for ApiError {
    fn from(e: MessageStoreError) -> Self {
        match e {
            MessageStoreError::NotFound(m) => ApiError::NotFound(m),
            MessageStoreError::Validation(m) => ApiError::Validation(m),
            MessageStoreError::Storage(m) => ApiError::Storage(m),
        }
    }
}

impl From<BeadsError> for ApiError {
    fn from(e: BeadsError) -> Self {
        match e {
            BeadsError::NotFound(m) => ApiError::NotFound(m),
            BeadsError::Validation(m) => ApiError::Validation(m),
            BeadsError::Subprocess(m) => ApiError::Subprocess(m),
            BeadsError::Timeout => ApiError::Timeout("bd invocation timed out".into()),
        }
    }
}

impl From<ProjectsError> for ApiError {
    fn from(e: ProjectsError) -> Self {
        match e {
            ProjectsError::NotFound(m) => ApiError::NotFound(m),
            ProjectsError::Validation(m) => ApiError::Validation(m),
            ProjectsError::Storage(m) => ApiError::Storage(m),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotFound(m) => ApiError::NotFound(m),
            SessionError::InputLockHeld { session, client } => ApiError::InvalidArgument(format!(
                "input lock for session {session} is held by another client ({client})"
            )),
            other => ApiError::Subprocess(other.to_string()),
        }
    }
}

impl From<ToolError> for ApiError {
    fn from(e: ToolError) -> Self {
        match e.code {
            "VALIDATION_ERROR" => ApiError::Validation(e.message),
            "INVALID_ARGUMENT" => ApiError::InvalidArgument(e.message),
            "NOT_FOUND" => ApiError::NotFound(e.message),
            "NOT_SUPPORTED" => ApiError::NotSupported(e.message),
            "STORAGE_ERROR" => ApiError::Storage(e.message),
            "SUBPROCESS_ERROR" => ApiError::Subprocess(e.message),
            _ => ApiError::Internal(e.message),
        }
    }
}
