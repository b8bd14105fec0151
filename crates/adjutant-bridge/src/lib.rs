//! HTTP/WebSocket transport layer exposing the Adjutant daemon's stores and
//! gateways to clients and MCP-connected agents.
//!
//! Key modules:
//! - [`http_api`] — Axum router: messages, beads, projects, agents, status,
//!   dashboard, proposals, MCP, and the `/ws/chat` fanout
//! - [`protocol`] — WebSocket wire frames
//! - [`auth`] — API key authentication middleware
//! - [`api_error`] — uniform error envelope
//! - [`status_provider`] — daemon status/power-control capability

pub mod api_error;
pub mod auth;
pub mod http_api;
pub mod json_response;
pub mod origin_validation;
pub mod protocol;
pub mod status_provider;
