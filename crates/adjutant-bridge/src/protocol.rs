//! WebSocket wire frames for `/ws/chat`.
//!
//! Client -> server: a single `auth` handshake frame, then optional
//! ephemeral `typing` frames. Server -> client: `auth_ok`/`error` for the
//! handshake, `replay:truncated` when the requested replay window has
//! aged out of the ring, and `frame` for every broadcast event.

use serde::{Deserialize, Serialize};

use adjutant_core::event_bus::Event;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Auth {
        api_key: Option<String>,
        last_seen_seq: Option<u64>,
        server_boot_id: Option<String>,
    },
    Typing {
        agent_id: String,
        thread_id: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ServerFrame {
    AuthOk {
        #[serde(rename = "type")]
        frame_type: &'static str,
        client_id: String,
        server_boot_id: String,
        seq: u64,
    },
    Error {
        #[serde(rename = "type")]
        frame_type: &'static str,
        code: String,
        message: String,
    },
    ReplayTruncated {
        #[serde(rename = "type")]
        frame_type: &'static str,
    },
    Event(OutboundFrame),
}

impl ServerFrame {
    pub fn auth_ok(client_id: String, server_boot_id: String, seq: u64) -> Self {
        Self::AuthOk { frame_type: "auth_ok", client_id, server_boot_id, seq }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error { frame_type: "error", code: code.into(), message: message.into() }
    }

    pub fn replay_truncated() -> Self {
        Self::ReplayTruncated { frame_type: "replay:truncated" }
    }
}

/// A single broadcast frame: `{ type, seq, server_boot_id, payload }`.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundFrame {
    #[serde(rename = "type")]
    pub frame_type: String,
    pub seq: u64,
    pub server_boot_id: String,
    pub payload: serde_json::Value,
}

/// Maps an event-bus event onto the frame type spec §4.8 broadcasts, or
/// `None` for events that only matter to the REST/dashboard surface.
pub fn frame_type_for_event(event: &Event) -> Option<&'static str> {
    match event {
        Event::MessageCreated(_) => Some("chat_message"),
        Event::AgentStatusChanged { .. } => Some("agent:status_changed"),
        Event::AgentProgress { .. } => Some("agent:progress"),
        Event::AgentAnnouncement(_) => Some("announcement"),
        Event::SessionOutput { .. } => Some("session_output"),
        Event::SessionRaw { .. } => Some("session_raw"),
        Event::SessionStatus { .. } => Some("session_status"),
        Event::SessionPermission { .. } => Some("session_permission"),
        Event::SessionEnded { .. } => Some("session_ended"),
        _ => None,
    }
}
