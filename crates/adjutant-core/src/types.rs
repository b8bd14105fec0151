//! Shared data model: the record types every store crate (`adjutant-messages`,
//! `adjutant-beads`, `adjutant-projects`, `adjutant-session`) and the bridge
//! crate pass across their boundaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Message / Thread
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    Agent,
    User,
    Announcement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Unread,
    Read,
}

/// A single entry in the agent-messaging log.
///
/// Identity, ordering, and delivery status are server-owned; everything
/// else is supplied by the sender at `insert` time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender: String,
    pub recipient: String,
    pub role: MessageRole,
    pub body: String,
    pub thread_id: Option<String>,
    pub delivery_status: Option<DeliveryStatus>,
    pub event_type: Option<String>,
    pub priority: Option<u8>,
    pub created_at: DateTime<Utc>,
    pub metadata: Option<serde_json::Value>,
}

/// Derived view over a set of messages sharing a `thread_id`. Never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub thread_id: String,
    pub count: u64,
    pub latest_body: String,
    pub latest_created_at: DateTime<Utc>,
    pub agent_id: Option<String>,
}

// ---------------------------------------------------------------------------
// AgentConnection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Working,
    Blocked,
    Idle,
    Done,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectContext {
    pub project_id: String,
    pub project_path: String,
    pub beads_dir: String,
}

/// One connected agent's MCP transport instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConnection {
    pub session_id: String,
    pub agent_id: String,
    pub connected_at: DateTime<Utc>,
    pub project: Option<ProjectContext>,
    pub status: AgentStatus,
    pub current_task: Option<String>,
    pub current_bead_id: Option<String>,
}

impl AgentConnection {
    pub fn new(session_id: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            agent_id: agent_id.into(),
            connected_at: Utc::now(),
            project: None,
            status: AgentStatus::Idle,
            current_task: None,
            current_bead_id: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Bead / EpicProgress
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeadType {
    Epic,
    Task,
    Bug,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeadStatus {
    Backlog,
    Open,
    InProgress,
    Hooked,
    Blocked,
    Testing,
    Merging,
    Complete,
    Closed,
    Deferred,
}

impl BeadStatus {
    pub const ALL: &'static [BeadStatus] = &[
        BeadStatus::Backlog,
        BeadStatus::Open,
        BeadStatus::InProgress,
        BeadStatus::Hooked,
        BeadStatus::Blocked,
        BeadStatus::Testing,
        BeadStatus::Merging,
        BeadStatus::Complete,
        BeadStatus::Closed,
        BeadStatus::Deferred,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BeadStatus::Backlog => "backlog",
            BeadStatus::Open => "open",
            BeadStatus::InProgress => "in_progress",
            BeadStatus::Hooked => "hooked",
            BeadStatus::Blocked => "blocked",
            BeadStatus::Testing => "testing",
            BeadStatus::Merging => "merging",
            BeadStatus::Complete => "complete",
            BeadStatus::Closed => "closed",
            BeadStatus::Deferred => "deferred",
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, BeadStatus::Closed | BeadStatus::Complete)
    }
}

/// A work item tracked by the external `bd` CLI. The core retains a
/// read-through projection of the fields it needs; `bd` itself is the
/// source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bead {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub bead_type: BeadType,
    pub status: BeadStatus,
    pub priority: u8,
    pub assignee: Option<String>,
    pub rig: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub labels: Vec<String>,
    pub depends_on: Vec<String>,
}

impl Bead {
    /// A wisp is a scratch/ephemeral bead, encoded as a `~` marker in the id
    /// suffix (e.g. `adj-022~scratch`). Filtered from most listings.
    pub fn is_wisp(&self) -> bool {
        self.id.contains('~')
    }

    /// The database-routing prefix: the characters before the first `-`.
    pub fn prefix(&self) -> &str {
        self.id.split('-').next().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EpicProgress {
    pub closed_children: u32,
    pub total_children: u32,
}

impl EpicProgress {
    pub fn ratio(&self) -> f64 {
        if self.total_children == 0 {
            0.0
        } else {
            self.closed_children as f64 / self.total_children as f64
        }
    }

    pub fn is_fully_closed(&self) -> bool {
        self.total_children > 0 && self.closed_children == self.total_children
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpicWithProgress {
    pub epic: Bead,
    pub progress: EpicProgress,
}

// ---------------------------------------------------------------------------
// Proposal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalType {
    Product,
    Engineering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Dismissed,
    Completed,
}

impl ProposalStatus {
    /// Proposal status transitions form a DAG: `pending -> accepted ->
    /// completed`, `pending -> dismissed`, both terminal.
    pub fn can_transition_to(&self, target: ProposalStatus) -> bool {
        matches!(
            (self, target),
            (ProposalStatus::Pending, ProposalStatus::Accepted)
                | (ProposalStatus::Pending, ProposalStatus::Dismissed)
                | (ProposalStatus::Accepted, ProposalStatus::Completed)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: Uuid,
    pub author: String,
    pub title: String,
    pub description: String,
    pub proposal_type: ProposalType,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Proposal {
    pub fn new(
        author: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        proposal_type: ProposalType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author: author.into(),
            title: title.into(),
            description: description.into(),
            proposal_type,
            status: ProposalStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectMode {
    Standalone,
    Swarm,
    Gastown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub path: String,
    pub git_remote: Option<String>,
    pub mode: ProjectMode,
    pub active: bool,
    pub has_beads: bool,
}

// ---------------------------------------------------------------------------
// TerminalSession / OutputEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalStatus {
    Idle,
    Working,
    WaitingPermission,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceType {
    Primary,
    Worktree,
    Copy,
}

/// Persisted record for a tmux-backed terminal session. The live
/// connected-client set and output ring buffer are runtime-only state
/// owned by `adjutant-session` and are not part of this persisted form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalSessionRecord {
    pub id: String,
    pub name: String,
    pub tmux_target: String,
    pub project_path: String,
    pub mode: String,
    pub status: TerminalStatus,
    pub workspace_type: WorkspaceType,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// Parsed interpretation of a chunk of raw terminal output. `Raw` is
/// always available as ground truth; the other variants are best-effort.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputEvent {
    Message { text: String },
    ToolUse { tool: String, input: serde_json::Value },
    ToolResult { tool: String, output: String, truncated: bool },
    Status { value: ThinkingStatus },
    PermissionRequest { request_id: String, action: String, details: String },
    Error { text: String },
    Raw { bytes: Vec<u8> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThinkingStatus {
    Thinking,
    Working,
    Idle,
}
