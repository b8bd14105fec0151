//! Shared application state handed to every Axum handler.

use std::sync::Arc;

use adjutant_beads::BdGateway;
use adjutant_core::config::Config;
use adjutant_core::event_bus::EventBus;
use adjutant_harness::session::McpSessionRegistry;
use adjutant_harness::tool_handlers::ToolContext;
use adjutant_messages::{MessageStore, ProposalStore};
use adjutant_projects::ProjectRegistry;
use adjutant_session::bridge::SessionBridge;

use super::websocket::WsHub;
use crate::status_provider::StatusProvider;

/// Everything a request handler needs: the stores and gateways the daemon
/// constructed at startup, plus the WebSocket fanout hub.
#[derive(Clone)]
pub struct ApiState {
    pub messages: Arc<MessageStore>,
    pub proposals: Arc<ProposalStore>,
    pub beads: Arc<BdGateway>,
    pub projects: Arc<ProjectRegistry>,
    pub mcp_sessions: Arc<McpSessionRegistry>,
    pub events: Arc<EventBus>,
    pub session_bridge: Arc<SessionBridge>,
    pub ws_hub: Arc<WsHub>,
    pub config: Arc<Config>,
    pub status_provider: Arc<dyn StatusProvider>,
}

impl ApiState {
    /// Builds the [`ToolContext`] MCP tool dispatch needs out of the same
    /// shared stores the REST surface uses.
    pub fn tool_context(&self) -> ToolContext {
        ToolContext {
            messages: self.messages.clone(),
            proposals: self.proposals.clone(),
            beads: self.beads.clone(),
            projects: self.projects.clone(),
            sessions: self.mcp_sessions.clone(),
            events: self.events.clone(),
        }
    }
}
