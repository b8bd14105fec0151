//! MCP session registry: per-connection identity binding and state.
//!
//! A session is created at `initialize` and carries the agent id resolved
//! from the request context for its entire lifetime — tool handlers must
//! never trust an `agent_id` supplied in call parameters over the one bound
//! here.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use adjutant_core::types::{AgentStatus, ProjectContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum McpSessionState {
    Uninitialized,
    Active,
    Terminated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpSession {
    pub id: String,
    pub agent_id: String,
    pub connected_at: DateTime<Utc>,
    pub project: Option<ProjectContext>,
    pub state: McpSessionState,
    pub status: AgentStatus,
    pub current_task: Option<String>,
    pub current_bead_id: Option<String>,
}

impl McpSession {
    fn new(agent_id: String, project: Option<ProjectContext>) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            agent_id,
            connected_at: Utc::now(),
            project,
            state: McpSessionState::Active,
            status: AgentStatus::Idle,
            current_task: None,
            current_bead_id: None,
        }
    }
}

/// Holds every connected MCP session. Sessions do not survive a process
/// restart — the map is purely in-memory.
#[derive(Default)]
pub struct McpSessionRegistry {
    sessions: DashMap<String, McpSession>,
}

impl McpSessionRegistry {
    pub fn new() -> Self {
        Self { sessions: DashMap::new() }
    }

    /// Binds a fresh session id to `agent_id`, resolved by the caller from
    /// `X-Agent-Id`/`agentId` — never from a tool parameter.
    pub fn create(&self, agent_id: impl Into<String>, project: Option<ProjectContext>) -> McpSession {
        let session = McpSession::new(agent_id.into(), project);
        self.sessions.insert(session.id.clone(), session.clone());
        session
    }

    pub fn get(&self, session_id: &str) -> Option<McpSession> {
        self.sessions.get(session_id).map(|s| s.clone())
    }

    /// Updates the session's status/current task/current bead in place and
    /// returns the resulting session. Callers publish `AgentStatusChanged`
    /// themselves so the event carries the same values the session now holds.
    pub fn set_status(
        &self,
        session_id: &str,
        status: AgentStatus,
        task: Option<String>,
        bead_id: Option<String>,
    ) -> Option<McpSession> {
        let mut entry = self.sessions.get_mut(session_id)?;
        entry.status = status;
        entry.current_task = task;
        entry.current_bead_id = bead_id;
        Some(entry.clone())
    }

    /// Terminates and reaps the session. Returns the session that was
    /// removed, if it existed.
    pub fn terminate(&self, session_id: &str) -> Option<McpSession> {
        self.sessions.remove(session_id).map(|(_, mut s)| {
            s.state = McpSessionState::Terminated;
            s
        })
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn list(&self) -> Vec<McpSession> {
        self.sessions.iter().map(|e| e.value().clone()).collect()
    }
}
