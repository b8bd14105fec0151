//! Runtime bookkeeping for tmux-backed terminal sessions: the connected-client
//! set, input lock, output ring buffer, disconnect grace period, and pending
//! input queue. [`TerminalSessionRecord`] (the persisted half) lives in
//! `adjutant-core`; this module owns everything that only matters while the
//! daemon is up.

use std::collections::HashSet;

use adjutant_core::types::{TerminalSessionRecord, TerminalStatus};
use chrono::{DateTime, Utc};

use crate::handle::SessionHandle;
use crate::input_queue::InputQueue;
use crate::parser::OutputParser;
use crate::ring_buffer::RingBuffer;

/// Grace period for reconnection after the last client detaches while the
/// tmux session (and its agent process) is still running.
pub const DISCONNECT_GRACE: std::time::Duration = std::time::Duration::from_secs(30);

/// Bytes retained for replay-on-attach and for the disconnect grace window.
pub const RING_BUFFER_SIZE: usize = 65536;

/// Full runtime state for one terminal session.
pub struct TerminalState {
    pub record: TerminalSessionRecord,
    pub clients: HashSet<String>,
    /// Client id currently allowed to send input (first-to-attach wins).
    pub input_lock: Option<String>,
    pub ring_buffer: RingBuffer,
    pub input_queue: InputQueue,
    pub parser: OutputParser,
    pub handle: Option<SessionHandle>,
    pub pipe_pane_active: bool,
    disconnected_since: Option<DateTime<Utc>>,
}

impl TerminalState {
    pub fn new(record: TerminalSessionRecord) -> Self {
        Self {
            record,
            clients: HashSet::new(),
            input_lock: None,
            ring_buffer: RingBuffer::new(RING_BUFFER_SIZE),
            input_queue: InputQueue::new(),
            parser: OutputParser::new(),
            handle: None,
            pipe_pane_active: false,
            disconnected_since: None,
        }
    }

    pub fn mark_all_disconnected(&mut self) {
        if self.clients.is_empty() && self.disconnected_since.is_none() {
            self.disconnected_since = Some(Utc::now());
        }
    }

    pub fn mark_reconnected(&mut self) {
        self.disconnected_since = None;
    }

    pub fn grace_expired(&self) -> bool {
        match self.disconnected_since {
            Some(since) => {
                Utc::now().signed_duration_since(since).to_std().unwrap_or_default() >= DISCONNECT_GRACE
            }
            None => false,
        }
    }
}

/// Lookup table for all active terminal sessions. Not internally
/// synchronized; callers share it behind an `RwLock`/`Mutex`.
#[derive(Default)]
pub struct TerminalRegistry {
    terminals: std::collections::HashMap<String, TerminalState>,
}

impl TerminalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, state: TerminalState) {
        self.terminals.insert(state.record.id.clone(), state);
    }

    pub fn remove(&mut self, id: &str) -> Option<TerminalState> {
        self.terminals.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&TerminalState> {
        self.terminals.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut TerminalState> {
        self.terminals.get_mut(id)
    }

    pub fn list(&self) -> Vec<&TerminalSessionRecord> {
        self.terminals.values().map(|t| &t.record).collect()
    }

    pub fn list_by_status(&self, status: TerminalStatus) -> Vec<&TerminalSessionRecord> {
        self.terminals
            .values()
            .filter(|t| t.record.status == status)
            .map(|t| &t.record)
            .collect()
    }
}
