//! MCP tool dispatch: the handler behind every tool name a connected agent
//! can call. Every handler receives the session bound at `initialize` time —
//! an `agent_id` appearing in tool arguments is always ignored in favor of
//! the one resolved onto the session.

use std::path::Path;
use std::sync::Arc;

use adjutant_beads::{BdGateway, BeadFilter, BeadsError};
use adjutant_core::event_bus::{Event, EventBus};
use adjutant_core::types::{AgentStatus, BeadStatus, BeadType, MessageRole, ProposalStatus, ProposalType};
use adjutant_messages::{MessageFilter, MessageStore, MessageStoreError, ProposalStore};
use adjutant_projects::{ProjectRegistry, ProjectsError};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::session::{McpSession, McpSessionRegistry};

#[derive(Debug, Clone)]
pub struct ToolError {
    pub code: &'static str,
    pub message: String,
}

impl ToolError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
    fn validation(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }
    fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new("INVALID_ARGUMENT", message)
    }
    fn not_supported(message: impl Into<String>) -> Self {
        Self::new("NOT_SUPPORTED", message)
    }
}

impl From<MessageStoreError> for ToolError {
    fn from(err: MessageStoreError) -> Self {
        match err {
            MessageStoreError::NotFound(msg) => ToolError::new("NOT_FOUND", msg),
            MessageStoreError::Validation(msg) => ToolError::validation(msg),
            MessageStoreError::Storage(msg) => ToolError::new("STORAGE_ERROR", msg),
        }
    }
}

impl From<BeadsError> for ToolError {
    fn from(err: BeadsError) -> Self {
        match err {
            BeadsError::NotFound(msg) => ToolError::new("NOT_FOUND", msg),
            BeadsError::Validation(msg) => ToolError::validation(msg),
            BeadsError::Subprocess(msg) => ToolError::new("SUBPROCESS_ERROR", msg),
            BeadsError::Timeout => ToolError::new("SUBPROCESS_ERROR", "bd invocation timed out"),
        }
    }
}

impl From<ProjectsError> for ToolError {
    fn from(err: ProjectsError) -> Self {
        match err {
            ProjectsError::NotFound(msg) => ToolError::new("NOT_FOUND", msg),
            ProjectsError::Validation(msg) => ToolError::validation(msg),
            ProjectsError::Storage(msg) => ToolError::new("STORAGE_ERROR", msg),
        }
    }
}

/// Everything a tool handler needs, bundled once in `adjutant-daemon::main`
/// and shared across every session.
pub struct ToolContext {
    pub messages: Arc<MessageStore>,
    pub proposals: Arc<ProposalStore>,
    pub beads: Arc<BdGateway>,
    pub projects: Arc<ProjectRegistry>,
    pub sessions: Arc<McpSessionRegistry>,
    pub events: Arc<EventBus>,
}

/// Routes a tool call to its handler. `session_id` must already be bound —
/// an unknown session is always `INVALID_ARGUMENT`, per the MCP transport's
/// session-lifetime contract.
pub async fn dispatch(
    ctx: &ToolContext,
    session_id: &str,
    tool: &str,
    args: Value,
) -> Result<Value, ToolError> {
    let session = ctx
        .sessions
        .get(session_id)
        .ok_or_else(|| ToolError::invalid_argument("unknown session"))?;

    match tool {
        "send_message" => send_message(ctx, &session, args).await,
        "read_messages" => read_messages(ctx, &session, args).await,
        "list_threads" => list_threads(ctx, &session).await,
        "mark_read" => mark_read(ctx, &session, args).await,
        "set_status" => set_status(ctx, &session, args).await,
        "report_progress" => report_progress(ctx, &session, args).await,
        "announce" => announce(ctx, &session, args).await,
        "create_bead" => create_bead(ctx, &session, args).await,
        "update_bead" => update_bead(ctx, args).await,
        "close_bead" => close_bead(ctx, args).await,
        "list_beads" => list_beads(ctx, args).await,
        "show_bead" => show_bead(ctx, args).await,
        "create_proposal" => create_proposal(ctx, &session, args).await,
        "list_proposals" => list_proposals(ctx, args).await,
        "list_agents" => list_agents(ctx).await,
        "get_project_state" => get_project_state(ctx, &session).await,
        "search_messages" => search_messages(ctx, &session, args).await,
        other => Err(ToolError::not_supported(format!("unknown tool: {other}"))),
    }
}

fn require_str(args: &Value, field: &str) -> Result<String, ToolError> {
    args.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ToolError::validation(format!("{field} is required")))
}

fn opt_str(args: &Value, field: &str) -> Option<String> {
    args.get(field).and_then(Value::as_str).map(str::to_string)
}

fn opt_u8(args: &Value, field: &str) -> Option<u8> {
    args.get(field).and_then(Value::as_u64).map(|v| v as u8)
}

fn opt_status(args: &Value, field: &str) -> Result<Option<BeadStatus>, ToolError> {
    match opt_str(args, field) {
        Some(s) => BeadStatus::parse(&s)
            .map(Some)
            .ok_or_else(|| ToolError::validation(format!("unknown bead status: {s}"))),
        None => Ok(None),
    }
}

fn parse_bead_type(s: &str) -> Result<BeadType, ToolError> {
    match s {
        "epic" => Ok(BeadType::Epic),
        "task" => Ok(BeadType::Task),
        "bug" => Ok(BeadType::Bug),
        other => Err(ToolError::validation(format!("unknown bead type: {other}"))),
    }
}

fn parse_before_cursor(args: &Value) -> Result<Option<(DateTime<Utc>, Uuid)>, ToolError> {
    let Some(cursor) = args.get("before_cursor") else { return Ok(None) };
    let created_at = cursor
        .get("created_at")
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::validation("before_cursor.created_at is required"))?;
    let id = cursor
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::validation("before_cursor.id is required"))?;
    let created_at = DateTime::parse_from_rfc3339(created_at)
        .map_err(|e| ToolError::validation(format!("invalid before_cursor.created_at: {e}")))?
        .with_timezone(&Utc);
    let id = Uuid::parse_str(id).map_err(|e| ToolError::validation(format!("invalid before_cursor.id: {e}")))?;
    Ok(Some((created_at, id)))
}

// ---------------------------------------------------------------------------
// Messaging tools
// ---------------------------------------------------------------------------

async fn send_message(ctx: &ToolContext, session: &McpSession, args: Value) -> Result<Value, ToolError> {
    let recipient = require_str(&args, "recipient")?;
    let body = require_str(&args, "body")?;
    let thread_id = opt_str(&args, "thread_id");
    let event_type = opt_str(&args, "event_type");
    let priority = opt_u8(&args, "priority");
    let metadata = args.get("metadata").cloned();

    let message = ctx
        .messages
        .insert(
            session.agent_id.clone(),
            recipient,
            MessageRole::Agent,
            body,
            thread_id,
            event_type,
            priority,
            metadata,
        )
        .await?;
    Ok(serde_json::to_value(message).expect("Message serializes"))
}

async fn read_messages(ctx: &ToolContext, session: &McpSession, args: Value) -> Result<Value, ToolError> {
    let filter = MessageFilter {
        thread_id: opt_str(&args, "thread_id"),
        agent_id: Some(session.agent_id.clone()),
        before_cursor: parse_before_cursor(&args)?,
        limit: args.get("limit").and_then(Value::as_u64).map(|l| l as u32).unwrap_or(50),
    };
    let messages = ctx.messages.read(filter).await?;
    Ok(json!({ "messages": messages }))
}

async fn list_threads(ctx: &ToolContext, session: &McpSession) -> Result<Value, ToolError> {
    let threads = ctx.messages.list_threads(Some(session.agent_id.clone())).await?;
    Ok(json!({ "threads": threads }))
}

async fn mark_read(ctx: &ToolContext, session: &McpSession, args: Value) -> Result<Value, ToolError> {
    match opt_str(&args, "message_id") {
        Some(message_id) => {
            let id = Uuid::parse_str(&message_id)
                .map_err(|_| ToolError::validation("message_id must be a uuid"))?;
            ctx.messages.mark_read(id).await?;
            Ok(json!({ "marked": 1 }))
        }
        None => {
            let count = ctx.messages.mark_read_bulk(session.agent_id.clone()).await?;
            Ok(json!({ "marked": count }))
        }
    }
}

async fn search_messages(ctx: &ToolContext, session: &McpSession, args: Value) -> Result<Value, ToolError> {
    let query = require_str(&args, "query")?;
    let limit = args.get("limit").and_then(Value::as_u64).map(|l| l as u32).unwrap_or(50);
    let messages = ctx.messages.search(query, Some(session.agent_id.clone()), limit).await?;
    Ok(json!({ "messages": messages }))
}

// ---------------------------------------------------------------------------
// Status tools
// ---------------------------------------------------------------------------

async fn set_status(ctx: &ToolContext, session: &McpSession, args: Value) -> Result<Value, ToolError> {
    let status = match require_str(&args, "status")?.as_str() {
        "working" => AgentStatus::Working,
        "blocked" => AgentStatus::Blocked,
        "idle" => AgentStatus::Idle,
        "done" => AgentStatus::Done,
        other => return Err(ToolError::validation(format!("unknown status: {other}"))),
    };
    let task = opt_str(&args, "task");
    let bead_id = opt_str(&args, "bead_id");

    let updated = ctx
        .sessions
        .set_status(&session.id, status, task.clone(), bead_id.clone())
        .ok_or_else(|| ToolError::invalid_argument("unknown session"))?;

    ctx.events.publish(Event::AgentStatusChanged {
        agent_id: updated.agent_id.clone(),
        status,
        task,
        bead_id,
    });
    Ok(serde_json::to_value(updated).expect("McpSession serializes"))
}

async fn report_progress(ctx: &ToolContext, session: &McpSession, args: Value) -> Result<Value, ToolError> {
    let task = require_str(&args, "task")?;
    let percentage = args
        .get("percentage")
        .and_then(Value::as_u64)
        .ok_or_else(|| ToolError::validation("percentage is required"))?;
    if percentage > 100 {
        return Err(ToolError::validation("percentage must be between 0 and 100"));
    }
    let description = opt_str(&args, "description");

    ctx.events.publish(Event::AgentProgress {
        agent_id: session.agent_id.clone(),
        task,
        percentage: percentage as u8,
        description,
    });
    Ok(json!({ "acknowledged": true }))
}

async fn announce(ctx: &ToolContext, session: &McpSession, args: Value) -> Result<Value, ToolError> {
    let body = require_str(&args, "body")?;
    let thread_id = opt_str(&args, "thread_id");

    let message = ctx
        .messages
        .insert(session.agent_id.clone(), "*", MessageRole::Announcement, body, thread_id, None, None, None)
        .await?;
    ctx.events.publish(Event::AgentAnnouncement(message.clone()));
    Ok(serde_json::to_value(message).expect("Message serializes"))
}

// ---------------------------------------------------------------------------
// Bead tools
// ---------------------------------------------------------------------------

async fn create_bead(ctx: &ToolContext, session: &McpSession, args: Value) -> Result<Value, ToolError> {
    let project = session
        .project
        .as_ref()
        .ok_or_else(|| ToolError::invalid_argument("session has no project context"))?;
    let title = require_str(&args, "title")?;
    let description = opt_str(&args, "description");
    let bead_type = match opt_str(&args, "type") {
        Some(s) => parse_bead_type(&s)?,
        None => BeadType::Task,
    };
    let priority = opt_u8(&args, "priority").unwrap_or(2);

    let bead = ctx
        .beads
        .create(Path::new(&project.beads_dir), title, description, bead_type, priority)
        .await?;
    Ok(serde_json::to_value(bead).expect("Bead serializes"))
}

async fn update_bead(ctx: &ToolContext, args: Value) -> Result<Value, ToolError> {
    let id = require_str(&args, "id")?;
    let status = opt_status(&args, "status")?;
    let title = opt_str(&args, "title");
    let description = opt_str(&args, "description");
    let assignee = opt_str(&args, "assignee");
    let priority = opt_u8(&args, "priority");

    let bead = ctx.beads.update(&id, status, title, description, assignee, priority).await?;
    Ok(serde_json::to_value(bead).expect("Bead serializes"))
}

async fn close_bead(ctx: &ToolContext, args: Value) -> Result<Value, ToolError> {
    let id = require_str(&args, "id")?;
    let reason = opt_str(&args, "reason");
    let bead = ctx.beads.close(&id, reason).await?;
    Ok(serde_json::to_value(bead).expect("Bead serializes"))
}

async fn list_beads(ctx: &ToolContext, args: Value) -> Result<Value, ToolError> {
    let bead_type = match opt_str(&args, "type") {
        Some(s) => Some(parse_bead_type(&s)?),
        None => None,
    };
    let filter = BeadFilter {
        status: opt_status(&args, "status")?,
        assignee: opt_str(&args, "assignee"),
        bead_type,
        limit: args.get("limit").and_then(Value::as_u64).map(|l| l as u32),
        rig: opt_str(&args, "rig"),
    };
    let beads = ctx.beads.list_all(filter).await?;
    Ok(json!({ "beads": beads }))
}

async fn show_bead(ctx: &ToolContext, args: Value) -> Result<Value, ToolError> {
    let id = require_str(&args, "id")?;
    let bead = ctx.beads.get(&id).await?;
    Ok(serde_json::to_value(bead).expect("Bead serializes"))
}

// ---------------------------------------------------------------------------
// Proposal tools
// ---------------------------------------------------------------------------

async fn create_proposal(ctx: &ToolContext, session: &McpSession, args: Value) -> Result<Value, ToolError> {
    let title = require_str(&args, "title")?;
    let description = require_str(&args, "description")?;
    let proposal_type = match require_str(&args, "type")?.as_str() {
        "product" => ProposalType::Product,
        "engineering" => ProposalType::Engineering,
        other => return Err(ToolError::validation(format!("unknown proposal type: {other}"))),
    };

    let proposal = ctx
        .proposals
        .create(session.agent_id.clone(), title, description, proposal_type)
        .await?;
    Ok(serde_json::to_value(proposal).expect("Proposal serializes"))
}

async fn list_proposals(ctx: &ToolContext, args: Value) -> Result<Value, ToolError> {
    let status = match opt_str(&args, "status") {
        Some(s) => Some(parse_proposal_status(&s)?),
        None => None,
    };
    let proposals = ctx.proposals.list(status).await?;
    Ok(json!({ "proposals": proposals }))
}

fn parse_proposal_status(s: &str) -> Result<ProposalStatus, ToolError> {
    match s {
        "pending" => Ok(ProposalStatus::Pending),
        "accepted" => Ok(ProposalStatus::Accepted),
        "dismissed" => Ok(ProposalStatus::Dismissed),
        "completed" => Ok(ProposalStatus::Completed),
        other => Err(ToolError::validation(format!("unknown proposal status: {other}"))),
    }
}

// ---------------------------------------------------------------------------
// Query tools
// ---------------------------------------------------------------------------

async fn list_agents(ctx: &ToolContext) -> Result<Value, ToolError> {
    Ok(json!({ "agents": ctx.sessions.list() }))
}

async fn get_project_state(ctx: &ToolContext, session: &McpSession) -> Result<Value, ToolError> {
    let project = session
        .project
        .as_ref()
        .ok_or_else(|| ToolError::invalid_argument("session has no project context"))?;
    let overview = ctx.beads.project_overview(&project.project_path).await?;
    Ok(serde_json::to_value(overview).expect("ProjectOverview serializes"))
}
