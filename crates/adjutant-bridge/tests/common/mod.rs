//! Shared fixture for spinning up a real `ApiState`/`api_router` against
//! temp-directory-backed stores, the same stores `adjutant-daemon` builds
//! at startup, minus the daemon process wrapper.

use std::sync::Arc;
use std::time::Instant;

use adjutant_beads::BdGateway;
use adjutant_bridge::http_api::{api_router, ApiState, WsHub};
use adjutant_bridge::status_provider::StandaloneStatusProvider;
use adjutant_core::config::Config;
use adjutant_core::event_bus::EventBus;
use adjutant_harness::session::McpSessionRegistry;
use adjutant_messages::{MessageStore, ProposalStore};
use adjutant_projects::ProjectRegistry;
use adjutant_session::bridge::SessionBridge;

#[allow(dead_code)]
pub struct TestServer {
    pub base_url: String,
    pub state: Arc<ApiState>,
    _dir: tempfile::TempDir,
}

#[allow(dead_code)]
pub async fn start(config: Config) -> TestServer {
    let dir = tempfile::tempdir().expect("create temp dir");
    let events = Arc::new(EventBus::new());

    let messages = Arc::new(MessageStore::open_in_memory(events.clone()).await.expect("open messages"));
    let proposals = Arc::new(ProposalStore::open_in_memory().await.expect("open proposals"));
    let beads = Arc::new(BdGateway::new(dir.path().to_path_buf(), config.beads.bd_timeout_ms, "test", events.clone()));
    let projects = Arc::new(
        ProjectRegistry::load(dir.path().join("projects.json"), events.clone())
            .await
            .expect("load projects"),
    );
    let mcp_sessions = Arc::new(McpSessionRegistry::new());
    let session_bridge = Arc::new(SessionBridge::new(dir.path().join("sessions"), events.clone()));
    let ws_hub = Arc::new(WsHub::new(config.websocket.replay_buffer_size));
    let config = Arc::new(config);

    let status_provider = Arc::new(StandaloneStatusProvider {
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

    let router = api_router(
        state.clone(),
        config.security.api_key.clone(),
        config.security.mcp_public_prefixes.clone(),
        config.security.allowed_origins.clone(),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral port");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestServer { base_url: format!("http://{addr}"), state, _dir: dir }
}
