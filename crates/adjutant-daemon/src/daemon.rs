//! Constructs every shared store and the background upkeep loop, then hands
//! the lot to `adjutant_bridge::http_api::api_router`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::Router;
use tracing::{info, warn};

use adjutant_beads::BdGateway;
use adjutant_bridge::http_api::{api_router, ApiState, WsHub};
use adjutant_bridge::status_provider::{StandaloneStatusProvider, StatusProvider};
use adjutant_core::config::Config;
use adjutant_core::event_bus::EventBus;
use adjutant_harness::session::McpSessionRegistry;
use adjutant_harness::shutdown::ShutdownSignal;
use adjutant_messages::{MessageStore, ProposalStore};
use adjutant_projects::ProjectRegistry;
use adjutant_session::bridge::SessionBridge;

/// How often the upkeep loop re-runs its maintenance passes.
#[derive(Debug, Clone)]
pub struct DaemonIntervals {
    /// Re-scan the workspace for `.beads` directories (spec default: 30s,
    /// via `BeadsConfig::prefix_map_refresh_ms`).
    pub prefix_map_refresh: Duration,
    /// Force a fanout publish so clients stuck on a dead TCP connection
    /// trip the slow-client disconnect in `WsHub::publish`.
    pub connection_sweep: Duration,
}

impl DaemonIntervals {
    pub fn from_config(config: &Config) -> Self {
        Self {
            prefix_map_refresh: Duration::from_millis(config.beads.prefix_map_refresh_ms),
            connection_sweep: Duration::from_secs(300),
        }
    }
}

/// Every store and gateway the daemon owns for the lifetime of the process.
pub struct Daemon {
    config: Arc<Config>,
    state: Arc<ApiState>,
    intervals: DaemonIntervals,
    shutdown: ShutdownSignal,
}

impl Daemon {
    /// Builds every shared store from `config`, restores persisted session
    /// state, and performs the initial `.beads` directory scan.
    pub async fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let events = Arc::new(EventBus::new());

        let messages = Arc::new(
            MessageStore::open(&config.cache.path, events.clone())
                .await
                .context("opening message store")?,
        );

        let proposals_path = PathBuf::from(&config.projects.state_dir).join("proposals.db");
        let proposals =
            Arc::new(ProposalStore::open(&proposals_path).await.context("opening proposal store")?);

        let workspace_root = PathBuf::from(&config.daemon.workspace_root);
        let beads = Arc::new(BdGateway::new(
            workspace_root,
            config.beads.bd_timeout_ms,
            "adjutant-daemon",
            events.clone(),
        ));
        beads.refresh_prefix_map().await.context("initial beads prefix-map scan")?;

        let projects_path = PathBuf::from(&config.projects.state_dir).join("projects.json");
        let projects = Arc::new(
            ProjectRegistry::load(&projects_path, events.clone())
                .await
                .context("loading project registry")?,
        );

        let mcp_sessions = Arc::new(McpSessionRegistry::new());

        let session_bridge = Arc::new(SessionBridge::new(&config.projects.state_dir, events.clone()));
        let restored = session_bridge.restore().await.context("restoring terminal sessions")?;
        info!(restored, "terminal sessions restored from disk");

        let ws_hub = Arc::new(WsHub::new(config.websocket.replay_buffer_size));
        tokio::spawn(ws_hub.clone().run_event_pump(events.clone()));

        let status_provider: Arc<dyn StatusProvider> = Arc::new(StandaloneStatusProvider {
            mcp_sessions: mcp_sessions.clone(),
            session_bridge: session_bridge.clone(),
            started_at: Instant::now(),
        });

        let state = Arc::new(ApiState {
            messages,
            proposals,
            beads,
            projects,
            mcp_sessions,
            events,
            session_bridge,
            ws_hub,
            config: config.clone(),
            status_provider,
        });

        let intervals = DaemonIntervals::from_config(&config);

        Ok(Self { config, state, intervals, shutdown: ShutdownSignal::new() })
    }

    pub fn shutdown_handle(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    pub fn shutdown(&self) {
        self.shutdown.trigger();
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn api_state(&self) -> &Arc<ApiState> {
        &self.state
    }

    pub fn router(&self) -> Router {
        api_router(
            self.state.clone(),
            self.config.security.api_key.clone(),
            self.config.security.mcp_public_prefixes.clone(),
            self.config.security.allowed_origins.clone(),
        )
    }

    /// Spawns the background upkeep loop. Runs until `shutdown()` fires.
    pub fn spawn_upkeep_loop(&self) {
        let state = self.state.clone();
        let intervals = self.intervals.clone();
        let mut shutdown_rx = self.shutdown.subscribe();

        tokio::spawn(async move {
            let mut prefix_tick = tokio::time::interval(intervals.prefix_map_refresh);
            let mut sweep_tick = tokio::time::interval(intervals.connection_sweep);
            prefix_tick.tick().await;
            sweep_tick.tick().await;

            loop {
                tokio::select! {
                    _ = prefix_tick.tick() => {
                        if let Err(e) = state.beads.refresh_prefix_map().await {
                            warn!(error = %e, "prefix-map refresh failed");
                        }
                    }
                    _ = sweep_tick.tick() => {
                        // A slow client's sender is dropped the next time a
                        // publish finds its buffer still full (WsHub::publish).
                        // Publishing a heartbeat here guarantees that check
                        // runs even on an otherwise quiet connection, so a
                        // client stuck on a dead TCP connection is reaped
                        // instead of lingering in the registry forever.
                        state.ws_hub.publish("heartbeat", serde_json::json!({})).await;
                    }
                    _ = shutdown_rx.recv() => {
                        info!("upkeep loop stopping");
                        break;
                    }
                }
            }
        });
    }

    /// Run the daemon as a standalone server using a pre-bound listener
    /// (blocking). The caller binds the listener so it can pick a dynamic
    /// port before the lockfile is written.
    pub async fn run_with_listener(&self, listener: tokio::net::TcpListener) -> Result<()> {
        let bind_addr = listener.local_addr()?;
        self.spawn_upkeep_loop();

        let router = self.router();
        let mut shutdown_rx = self.shutdown.subscribe();
        info!(%bind_addr, "API server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await
            .context("API server error")?;

        info!("daemon stopped");
        Ok(())
    }
}
