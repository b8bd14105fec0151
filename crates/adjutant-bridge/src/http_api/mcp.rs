//! Streamable HTTP MCP transport (spec §4.3).
//!
//! `POST /mcp` with no `Mcp-Session-Id` header and an `initialize` body opens
//! a new session: the agent id is resolved from `X-Agent-Id`/`?agentId=` on
//! that request ONLY and bound to the session for its whole lifetime. Every
//! later `POST /mcp` routes by the `Mcp-Session-Id` header; tool call
//! parameters are never trusted for identity. `DELETE /mcp` terminates the
//! session.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use adjutant_core::event_bus::Event;
use adjutant_core::types::{AgentConnection, AgentStatus, ProjectContext};
use adjutant_harness::mcp::{
    error_codes, InitializeResult, JsonRpcRequest, JsonRpcResponse, McpTool, ServerCapabilities,
    ServerInfo, ToolsCapability, MCP_PROTOCOL_VERSION,
};
use adjutant_harness::tool_handlers::dispatch;

use super::state::ApiState;

const SESSION_HEADER: &str = "mcp-session-id";

#[derive(Debug, Deserialize)]
pub(crate) struct InitializeQuery {
    #[serde(rename = "agentId")]
    agent_id: Option<String>,
    #[serde(rename = "projectId")]
    project_id: Option<String>,
    #[serde(rename = "projectPath")]
    project_path: Option<String>,
    #[serde(rename = "beadsDir")]
    beads_dir: Option<String>,
}

fn resolve_agent_id(headers: &HeaderMap, query: &InitializeQuery) -> Option<String> {
    headers
        .get("x-agent-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| query.agent_id.clone())
}

fn resolve_project_context(query: &InitializeQuery) -> Option<ProjectContext> {
    let (Some(project_id), Some(project_path), Some(beads_dir)) =
        (query.project_id.clone(), query.project_path.clone(), query.beads_dir.clone())
    else {
        return None;
    };
    Some(ProjectContext { project_id, project_path, beads_dir })
}

/// The tool catalog every session's `tools/list` advertises.
fn tool_catalog() -> Vec<McpTool> {
    let def = |name: &str, description: &str, schema: serde_json::Value| McpTool {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: schema,
        annotations: None,
    };
    vec![
        def(
            "send_message",
            "Send a message to another agent or thread.",
            serde_json::json!({"type":"object","properties":{
                "recipient":{"type":"string"},"body":{"type":"string"},
                "thread_id":{"type":"string"},"event_type":{"type":"string"},
                "priority":{"type":"integer"},"metadata":{"type":"object"}
            },"required":["recipient","body"]}),
        ),
        def(
            "read_messages",
            "Read messages addressed to the calling agent.",
            serde_json::json!({"type":"object","properties":{
                "thread_id":{"type":"string"},"limit":{"type":"integer"},
                "before_cursor":{"type":"object"}
            }}),
        ),
        def("list_threads", "List message threads for the calling agent.", serde_json::json!({"type":"object","properties":{}})),
        def(
            "mark_read",
            "Mark one message, or all of the calling agent's messages, as read.",
            serde_json::json!({"type":"object","properties":{"message_id":{"type":"string"}}}),
        ),
        def(
            "set_status",
            "Report the calling agent's current status.",
            serde_json::json!({"type":"object","properties":{
                "status":{"type":"string","enum":["working","blocked","idle","done"]},
                "task":{"type":"string"},"bead_id":{"type":"string"}
            },"required":["status"]}),
        ),
        def(
            "report_progress",
            "Report progress on the calling agent's current task.",
            serde_json::json!({"type":"object","properties":{
                "task":{"type":"string"},"percentage":{"type":"integer"},"description":{"type":"string"}
            },"required":["task","percentage"]}),
        ),
        def(
            "announce",
            "Broadcast an announcement to all agents.",
            serde_json::json!({"type":"object","properties":{"body":{"type":"string"},"thread_id":{"type":"string"}},"required":["body"]}),
        ),
        def(
            "create_bead",
            "Create a bead in the calling agent's active project.",
            serde_json::json!({"type":"object","properties":{
                "title":{"type":"string"},"description":{"type":"string"},
                "type":{"type":"string","enum":["epic","task","bug"]},"priority":{"type":"integer"}
            },"required":["title"]}),
        ),
        def(
            "update_bead",
            "Update a bead's fields.",
            serde_json::json!({"type":"object","properties":{
                "id":{"type":"string"},"status":{"type":"string"},"title":{"type":"string"},
                "description":{"type":"string"},"assignee":{"type":"string"},"priority":{"type":"integer"}
            },"required":["id"]}),
        ),
        def(
            "close_bead",
            "Close a bead.",
            serde_json::json!({"type":"object","properties":{"id":{"type":"string"},"reason":{"type":"string"}},"required":["id"]}),
        ),
        def(
            "list_beads",
            "List beads matching a filter.",
            serde_json::json!({"type":"object","properties":{
                "status":{"type":"string"},"assignee":{"type":"string"},"type":{"type":"string"},
                "limit":{"type":"integer"},"rig":{"type":"string"}
            }}),
        ),
        def("show_bead", "Fetch a single bead by id.", serde_json::json!({"type":"object","properties":{"id":{"type":"string"}},"required":["id"]})),
        def(
            "create_proposal",
            "File a product or engineering proposal.",
            serde_json::json!({"type":"object","properties":{
                "title":{"type":"string"},"description":{"type":"string"},
                "type":{"type":"string","enum":["product","engineering"]}
            },"required":["title","description","type"]}),
        ),
        def(
            "list_proposals",
            "List proposals, optionally filtered by status.",
            serde_json::json!({"type":"object","properties":{"status":{"type":"string"}}}),
        ),
        def("list_agents", "List currently connected agent sessions.", serde_json::json!({"type":"object","properties":{}})),
        def("get_project_state", "Fetch the bead overview for the calling agent's active project.", serde_json::json!({"type":"object","properties":{}})),
        def(
            "search_messages",
            "Full-text search the calling agent's messages.",
            serde_json::json!({"type":"object","properties":{"query":{"type":"string"},"limit":{"type":"integer"}},"required":["query"]}),
        ),
    ]
}

async fn handle_initialize(
    state: &Arc<ApiState>,
    headers: &HeaderMap,
    query: &InitializeQuery,
    id: Option<serde_json::Value>,
) -> impl IntoResponse {
    let Some(agent_id) = resolve_agent_id(headers, query) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, "X-Agent-Id header or ?agentId= is required")),
        )
            .into_response();
    };

    let project = resolve_project_context(query);
    let session = state.mcp_sessions.create(agent_id.clone(), project.clone());
    state.events.publish(Event::McpAgentConnected(AgentConnection {
        session_id: session.id.clone(),
        agent_id,
        connected_at: session.connected_at,
        project,
        status: AgentStatus::Idle,
        current_task: None,
        current_bead_id: None,
    }));

    let result = InitializeResult {
        protocol_version: MCP_PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: Some(ToolsCapability { list_changed: false }),
            resources: None,
            prompts: None,
        },
        server_info: ServerInfo { name: "adjutant".to_string(), version: env!("CARGO_PKG_VERSION").to_string() },
    };
    let body = JsonRpcResponse::success(id, serde_json::to_value(result).expect("InitializeResult serializes"));

    let mut response = (StatusCode::OK, Json(body)).into_response();
    response
        .headers_mut()
        .insert("mcp-session-id", session.id.parse().expect("session id is header-safe"));
    response.into_response()
}

async fn handle_tools_list(id: Option<serde_json::Value>) -> impl IntoResponse {
    let tools = tool_catalog();
    Json(JsonRpcResponse::success(id, serde_json::json!({ "tools": tools })))
}

async fn handle_tools_call(
    state: &Arc<ApiState>,
    session_id: &str,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> impl IntoResponse {
    let params = params.unwrap_or(serde_json::Value::Null);
    let tool_name = params.get("name").and_then(serde_json::Value::as_str).unwrap_or_default();
    let arguments = params.get("arguments").cloned().unwrap_or(serde_json::json!({}));

    let ctx = state.tool_context();
    match dispatch(&ctx, session_id, tool_name, arguments).await {
        Ok(result) => Json(JsonRpcResponse::success(
            id,
            serde_json::json!({ "content": [{ "type": "text", "text": result.to_string() }], "isError": false }),
        )),
        Err(err) => Json(JsonRpcResponse::success(
            id,
            serde_json::json!({ "content": [{ "type": "text", "text": err.message }], "isError": true }),
        )),
    }
}

/// `POST /mcp`
pub(crate) async fn mcp_post(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Query(query): Query<InitializeQuery>,
    Json(request): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    let session_header = headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok()).map(str::to_string);

    if request.method == "initialize" {
        return handle_initialize(&state, &headers, &query, request.id).await.into_response();
    }

    let Some(session_id) = session_header else {
        return (
            StatusCode::BAD_REQUEST,
            Json(JsonRpcResponse::error(request.id, error_codes::INVALID_REQUEST, "Mcp-Session-Id header is required")),
        )
            .into_response();
    };

    if state.mcp_sessions.get(&session_id).is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(JsonRpcResponse::error(request.id, error_codes::INVALID_PARAMS, "unknown session")),
        )
            .into_response();
    }

    match request.method.as_str() {
        "tools/list" => handle_tools_list(request.id).await.into_response(),
        "tools/call" => handle_tools_call(&state, &session_id, request.id, request.params).await.into_response(),
        "notifications/initialized" => StatusCode::NO_CONTENT.into_response(),
        other => Json(JsonRpcResponse::error(
            request.id,
            error_codes::METHOD_NOT_FOUND,
            format!("unknown method: {other}"),
        ))
        .into_response(),
    }
}

/// `DELETE /mcp`
pub(crate) async fn mcp_delete(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> impl IntoResponse {
    let Some(session_id) = headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok()) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    match state.mcp_sessions.terminate(session_id) {
        Some(session) => {
            state.events.publish(Event::McpAgentDisconnected {
                session_id: session.id,
                agent_id: session.agent_id,
            });
            StatusCode::NO_CONTENT.into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// `GET /mcp` -- server-initiated event stream for a session. No server-push
/// notifications are defined yet; the stream stays open (heartbeat comments
/// only) until the client disconnects or the session is terminated.
pub(crate) async fn mcp_get(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> impl IntoResponse {
    use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
    use futures_util::stream::{self, StreamExt};

    let Some(session_id) = headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok()).map(str::to_string) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    if state.mcp_sessions.get(&session_id).is_none() {
        return StatusCode::NOT_FOUND.into_response();
    }

    let interval = tokio::time::interval(std::time::Duration::from_secs(30));
    let sessions = state.mcp_sessions.clone();
    let ticks = stream::unfold(interval, |mut interval| async move {
        interval.tick().await;
        Some(((), interval))
    });
    let stream = ticks
        .take_while(move |()| {
            let present = sessions.get(&session_id).is_some();
            async move { present }
        })
        .map(|()| Ok(SseEvent::default().comment("keep-alive")));

    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}
