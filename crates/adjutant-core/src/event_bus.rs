//! In-process pub/sub for cross-component signals.
//!
//! Every store crate (`adjutant-messages`, `adjutant-beads`,
//! `adjutant-projects`, `adjutant-session`) and the bridge publish onto a
//! shared [`EventBus`] instance wired together in `adjutant-daemon::main`.
//! The bus owns no data; it only routes. A slow subscriber must never
//! block a publisher, so each subscriber gets a bounded queue with a
//! drop-oldest policy under pressure, mirroring the reference
//! `at-bridge::event_bus` design generalized from unbounded to bounded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{AgentConnection, AgentStatus, Bead, Message, Project};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum Event {
    MessageCreated(Message),
    MessageRead { message_id: Uuid, agent_id: Option<String> },
    McpAgentConnected(AgentConnection),
    McpAgentDisconnected { session_id: String, agent_id: String },
    AgentStatusChanged {
        agent_id: String,
        status: AgentStatus,
        task: Option<String>,
        bead_id: Option<String>,
    },
    AgentProgress {
        agent_id: String,
        task: String,
        percentage: u8,
        description: Option<String>,
    },
    AgentAnnouncement(Message),
    BeadCreated(Bead),
    BeadUpdated(Bead),
    BeadClosed(Bead),
    ProjectActivated(Project),
    ProjectRegistered(Project),
    ProjectUnregistered(Project),
    SessionOutput { session_id: String, payload: serde_json::Value },
    SessionRaw { session_id: String, bytes: Vec<u8> },
    SessionStatus { session_id: String, payload: serde_json::Value },
    SessionPermission { session_id: String, payload: serde_json::Value },
    SessionEnded { session_id: String, payload: serde_json::Value },
}

struct Subscriber {
    id: u64,
    tx: flume::Sender<Event>,
    /// A second handle onto the same bounded channel, used only to pop the
    /// oldest buffered item when the channel reports full. flume receivers
    /// are MPMC, so dropping via this handle is visible to the subscriber's
    /// own receiver too.
    evictor: flume::Receiver<Event>,
    dropped: Arc<AtomicU64>,
}

/// A live subscription returned by [`EventBus::subscribe`].
pub struct Subscription {
    pub id: u64,
    pub rx: flume::Receiver<Event>,
    dropped: Arc<AtomicU64>,
}

impl Subscription {
    /// Number of events this subscriber has had evicted under backpressure.
    /// Exposed for tests to assert drop-oldest behavior actually engaged.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Default bound on each subscriber's queue when a caller does not specify
/// one via [`EventBus::subscribe_with_capacity`].
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 256;

pub struct EventBus {
    subscribers: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self { subscribers: Mutex::new(Vec::new()), next_id: AtomicU64::new(1) }
    }

    pub fn subscribe(&self) -> Subscription {
        self.subscribe_with_capacity(DEFAULT_SUBSCRIBER_CAPACITY)
    }

    pub fn subscribe_with_capacity(&self, capacity: usize) -> Subscription {
        let (tx, rx) = flume::bounded(capacity.max(1));
        let dropped = Arc::new(AtomicU64::new(0));
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut subs = self.subscribers.lock().expect("event bus mutex poisoned");
        subs.push(Subscriber { id, tx, evictor: rx.clone(), dropped: dropped.clone() });
        Subscription { id, rx, dropped }
    }

    pub fn unsubscribe(&self, id: u64) {
        let mut subs = self.subscribers.lock().expect("event bus mutex poisoned");
        subs.retain(|s| s.id != id);
    }

    /// Fan out `event` to every live subscriber. Never blocks: a full queue
    /// evicts its oldest entry before the new one is pushed.
    pub fn publish(&self, event: Event) {
        let subs = self.subscribers.lock().expect("event bus mutex poisoned");
        for sub in subs.iter() {
            match sub.tx.try_send(event.clone()) {
                Ok(()) => {}
                Err(flume::TrySendError::Full(ev)) => {
                    let _ = sub.evictor.try_recv();
                    sub.dropped.fetch_add(1, Ordering::Relaxed);
                    let _ = sub.tx.try_send(ev);
                }
                Err(flume::TrySendError::Disconnected(_)) => {
                    // Dead subscriber; reaped lazily on next unsubscribe/shutdown.
                }
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().expect("event bus mutex poisoned").len()
    }
}
