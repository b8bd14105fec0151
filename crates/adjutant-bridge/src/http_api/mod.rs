// ---------------------------------------------------------------------------
// HTTP API module directory
// ---------------------------------------------------------------------------
//
// One module per REST resource group, following the reference split of
// the original monolith. This file wires them together and owns the
// Axum router.

mod agents;
mod beads;
mod dashboard;
mod mcp;
mod messages;
mod projects;
mod proposals;
pub mod state;
mod status;
mod websocket;

pub use state::ApiState;
pub use websocket::WsHub;

// ---------------------------------------------------------------------------
// Router + middleware
// ---------------------------------------------------------------------------

pub mod router {
    use std::sync::Arc;

    use axum::{
        body::Body,
        extract::Request,
        middleware::{self as axum_middleware, Next},
        response::Response,
        routing::{delete, get, patch, post},
        Router,
    };
    use tower_http::cors::CorsLayer;

    use super::*;
    use crate::auth::AuthLayer;
    use adjutant_telemetry::middleware::metrics_middleware;
    use adjutant_telemetry::tracing_setup::request_id_middleware;

    /// Build the full API router with all REST, MCP, and WebSocket routes.
    ///
    /// When `api_key` is `Some`, the [`AuthLayer`] middleware requires every
    /// non-exempt request to carry a valid key. Paths under
    /// `mcp_public_prefixes` always skip that check, since agent
    /// connections authenticate at the MCP layer instead.
    pub fn api_router(
        state: Arc<ApiState>,
        api_key: Option<String>,
        mcp_public_prefixes: Vec<String>,
        allowed_origins: Vec<String>,
    ) -> Router {
        Router::new()
            // Messages
            .route("/api/messages", get(messages::list_messages))
            .route("/api/messages", post(messages::send_message))
            .route("/api/messages/unread", get(messages::unread_counts))
            // Beads
            .route("/api/beads", get(beads::list_beads))
            .route("/api/beads/{id}", patch(beads::update_bead))
            .route("/api/beads/graph", get(beads::bead_graph))
            .route("/api/epics-with-progress", get(beads::epics_with_progress))
            // Agents
            .route("/api/agents", get(agents::list_agents))
            .route("/api/agents/spawn", post(agents::spawn_agent))
            // Status / power
            .route("/api/status", get(status::get_status))
            .route("/api/power/up", post(status::power_up))
            .route("/api/power/down", post(status::power_down))
            // Projects
            .route("/api/projects", get(projects::list_projects))
            .route("/api/projects", post(projects::create_project))
            .route("/api/projects/{id}/activate", post(projects::activate_project))
            .route("/api/projects/{id}", delete(projects::unregister_project))
            .route("/api/projects/{id}/overview", get(projects::project_overview))
            // Dashboard
            .route("/api/dashboard", get(dashboard::dashboard))
            // Proposals
            .route("/api/proposals", post(proposals::create_proposal))
            .route("/api/proposals", get(proposals::list_proposals))
            .route("/api/proposals/{id}", patch(proposals::update_proposal))
            // MCP streamable-HTTP transport
            .route("/mcp", post(mcp::mcp_post))
            .route("/mcp", get(mcp::mcp_get))
            .route("/mcp", delete(mcp::mcp_delete))
            // WebSocket fanout + fallbacks
            .route("/ws/chat", get(websocket::ws_chat_handler))
            .route("/api/events", get(websocket::events_sse_handler))
            .route("/api/events/poll", get(websocket::events_poll_handler))
            .layer(axum_middleware::from_fn(metrics_middleware))
            .layer(axum_middleware::from_fn(request_id_middleware))
            .layer(axum_middleware::from_fn(isolation_headers_middleware))
            .layer(AuthLayer::new(api_key, mcp_public_prefixes))
            .layer(
                CorsLayer::new()
                    .allow_origin(tower_http::cors::AllowOrigin::predicate(
                        move |origin: &axum::http::HeaderValue,
                              _request_parts: &axum::http::request::Parts| {
                            if let Ok(origin_str) = origin.to_str() {
                                if origin_str.starts_with("http://localhost")
                                    || origin_str.starts_with("http://127.0.0.1")
                                    || origin_str.starts_with("https://localhost")
                                    || origin_str.starts_with("https://127.0.0.1")
                                {
                                    return true;
                                }
                                allowed_origins.iter().any(|allowed| origin_str == allowed)
                            } else {
                                false
                            }
                        },
                    ))
                    .allow_methods([
                        axum::http::Method::GET,
                        axum::http::Method::POST,
                        axum::http::Method::PUT,
                        axum::http::Method::DELETE,
                        axum::http::Method::PATCH,
                        axum::http::Method::OPTIONS,
                    ])
                    .allow_headers([
                        axum::http::header::CONTENT_TYPE,
                        axum::http::header::AUTHORIZATION,
                        axum::http::HeaderName::from_static("mcp-session-id"),
                        axum::http::HeaderName::from_static("x-agent-id"),
                    ])
                    .allow_credentials(true),
            )
            .with_state(state)
    }

    /// Add browser cross-origin isolation headers.
    async fn isolation_headers_middleware(request: Request<Body>, next: Next) -> Response {
        let mut response = next.run(request).await;
        let headers = response.headers_mut();
        headers.insert(
            "Cross-Origin-Opener-Policy",
            axum::http::HeaderValue::from_static("same-origin"),
        );
        headers.insert(
            "Cross-Origin-Resource-Policy",
            axum::http::HeaderValue::from_static("same-origin"),
        );
        headers.insert("X-Content-Type-Options", axum::http::HeaderValue::from_static("nosniff"));
        headers.insert("X-Frame-Options", axum::http::HeaderValue::from_static("DENY"));
        headers.insert(
            "Strict-Transport-Security",
            axum::http::HeaderValue::from_static("max-age=63072000; includeSubDomains"),
        );
        headers.insert("Referrer-Policy", axum::http::HeaderValue::from_static("strict-origin-when-cross-origin"));
        response
    }
}

pub use router::api_router;
