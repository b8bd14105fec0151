//! The `StatusProvider` capability -- daemon status reporting and, where
//! the deployment supports it, power control.
//!
//! The daemon can run standalone or embedded in a larger swarm that owns
//! physical power state for the machines it schedules on. Rather than
//! branch on deployment kind throughout the HTTP layer, that difference is
//! captured behind one small trait with a finite capability set, matching
//! the one status/power implementation this crate ships.

use async_trait::async_trait;
use serde::Serialize;

use crate::api_error::ApiError;

#[derive(Debug, Clone, Serialize)]
pub struct DaemonStatus {
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub connected_agents: usize,
    pub active_sessions: usize,
    pub has_power_control: bool,
}

#[async_trait]
pub trait StatusProvider: Send + Sync {
    async fn get_status(&self) -> Result<DaemonStatus, ApiError>;

    fn has_power_control(&self) -> bool {
        false
    }

    async fn power_up(&self) -> Result<(), ApiError> {
        Err(ApiError::NotSupported("power control is not available in this deployment".into()))
    }

    async fn power_down(&self) -> Result<(), ApiError> {
        Err(ApiError::NotSupported("power control is not available in this deployment".into()))
    }
}

/// The only provider this crate ships: a standalone daemon with no
/// external power-management plane. Future deployments that do own power
/// state (e.g. a fleet scheduler) add their own [`StatusProvider`] impl
/// without touching the HTTP handlers.
pub struct StandaloneStatusProvider {
    pub mcp_sessions: std::sync::Arc<adjutant_harness::session::McpSessionRegistry>,
    pub session_bridge: std::sync::Arc<adjutant_session::bridge::SessionBridge>,
    pub started_at: std::time::Instant,
}

#[async_trait]
impl StatusProvider for StandaloneStatusProvider {
    async fn get_status(&self) -> Result<DaemonStatus, ApiError> {
        Ok(DaemonStatus {
            version: env!("CARGO_PKG_VERSION"),
            uptime_seconds: self.started_at.elapsed().as_secs(),
            connected_agents: self.mcp_sessions.len(),
            active_sessions: self.session_bridge.list().await.len(),
            has_power_control: false,
        })
    }
}
