//! Facade tying together tmux session lifecycle, output capture/parsing,
//! the input lock, and persistence. This is the one piece of the reference
//! crate that needed re-architecture rather than adaptation: the transport
//! moved from a raw PTY to the tmux CLI plus a named FIFO per session.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use adjutant_core::event_bus::{Event, EventBus};
use adjutant_core::types::{OutputEvent, TerminalSessionRecord, TerminalStatus, ThinkingStatus, WorkspaceType};
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Result, SessionError};
use crate::handle::SessionHandle;
use crate::terminal::{TerminalRegistry, TerminalState};
use crate::terminal_persistence::TerminalPersistence;
use crate::tmux;

pub struct SessionBridge {
    registry: Arc<RwLock<TerminalRegistry>>,
    persistence: TerminalPersistence,
    events: Arc<EventBus>,
    fifo_dir: PathBuf,
}

impl SessionBridge {
    pub fn new(data_dir: impl Into<PathBuf>, events: Arc<EventBus>) -> Self {
        let data_dir = data_dir.into();
        Self {
            registry: Arc::new(RwLock::new(TerminalRegistry::new())),
            persistence: TerminalPersistence::new(&data_dir),
            events,
            fifo_dir: data_dir.join("session-fifos"),
        }
    }

    /// Re-hydrate persisted session records on daemon startup. Sessions whose
    /// tmux target no longer exists are dropped rather than re-created.
    pub async fn restore(&self) -> Result<usize> {
        let records = self.persistence.load().await?;
        let mut registry = self.registry.write().await;
        let mut restored = 0;
        for record in records {
            if tmux::has_session(&record.tmux_target).await.unwrap_or(false) {
                registry.insert(TerminalState::new(record));
                restored += 1;
            }
        }
        Ok(restored)
    }

    async fn persist(&self) -> Result<()> {
        let registry = self.registry.read().await;
        let records: Vec<TerminalSessionRecord> = registry.list().into_iter().cloned().collect();
        drop(registry);
        self.persistence.save(&records).await
    }

    pub async fn create(
        &self,
        project_path: String,
        mode: String,
        name: Option<String>,
        workspace_type: WorkspaceType,
    ) -> Result<TerminalSessionRecord> {
        let id = Uuid::new_v4().to_string();
        let tmux_target = format!("adjutant-{id}");
        tmux::new_session(&tmux_target, Path::new(&project_path), Some(&mode)).await?;

        let now = Utc::now();
        let record = TerminalSessionRecord {
            id: id.clone(),
            name: name.unwrap_or_else(|| mode.clone()),
            tmux_target,
            project_path,
            mode,
            status: TerminalStatus::Idle,
            workspace_type,
            created_at: now,
            last_activity: now,
        };

        self.registry.write().await.insert(TerminalState::new(record.clone()));
        self.persist().await?;
        Ok(record)
    }

    /// Adds `client_id` to the connected set. If this is the first client,
    /// starts `pipe-pane` capture and the background reader/writer threads.
    /// Returns the replay buffer contents when `replay` is true.
    pub async fn attach(&self, session_id: &str, client_id: &str, replay: bool) -> Result<Vec<u8>> {
        let mut registry = self.registry.write().await;
        let state = registry.get_mut(session_id).ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;

        if state.clients.is_empty() {
            let fifo_path = self.fifo_dir.join(format!("{session_id}.fifo"));
            let handle = SessionHandle::spawn(state.record.tmux_target.clone(), fifo_path.clone())?;
            tmux::pipe_pane_start(&state.record.tmux_target, &fifo_path).await?;
            spawn_capture_pump(
                session_id.to_string(),
                handle.reader.clone(),
                Arc::clone(&self.registry),
                Arc::clone(&self.events),
            );
            state.handle = Some(handle);
            state.pipe_pane_active = true;
        }

        state.clients.insert(client_id.to_string());
        state.mark_reconnected();
        if state.input_lock.is_none() {
            state.input_lock = Some(client_id.to_string());
        }

        let replay_bytes = if replay { state.ring_buffer.snapshot() } else { Vec::new() };
        Ok(replay_bytes)
    }

    /// Removes `client_id` from the connected set. If no clients remain,
    /// stops `pipe-pane` (falling back to periodic `capture-pane` snapshots
    /// via [`SessionBridge::snapshot`]) and starts the disconnect grace timer.
    pub async fn detach(&self, session_id: &str, client_id: &str) -> Result<()> {
        let mut registry = self.registry.write().await;
        let state = registry.get_mut(session_id).ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;

        state.clients.remove(client_id);
        if state.input_lock.as_deref() == Some(client_id) {
            state.input_lock = None;
        }

        if state.clients.is_empty() && state.pipe_pane_active {
            tmux::pipe_pane_stop(&state.record.tmux_target).await?;
            state.pipe_pane_active = false;
            state.mark_all_disconnected();
        }
        Ok(())
    }

    /// Forcibly grants the input lock to `client_id`, who must already be attached.
    pub async fn steal_input_lock(&self, session_id: &str, client_id: &str) -> Result<()> {
        let mut registry = self.registry.write().await;
        let state = registry.get_mut(session_id).ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        if !state.clients.contains(client_id) {
            return Err(SessionError::InputLockHeld {
                session: session_id.to_string(),
                client: client_id.to_string(),
            });
        }
        state.input_lock = Some(client_id.to_string());
        Ok(())
    }

    /// Send `text` to the session, subject to the input lock. If the session
    /// is mid-turn, the text is queued instead of sent immediately.
    pub async fn input(&self, session_id: &str, client_id: &str, text: &str) -> Result<()> {
        let registry = self.registry.read().await;
        let state = registry.get(session_id).ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;

        if state.input_lock.as_deref() != Some(client_id) {
            return Err(SessionError::InputLockHeld {
                session: session_id.to_string(),
                client: client_id.to_string(),
            });
        }

        if state.input_queue.is_working() {
            drop(registry);
            let mut registry = self.registry.write().await;
            if let Some(state) = registry.get_mut(session_id) {
                state.input_queue.offer(text.to_string());
            }
            return Ok(());
        }

        let handle = state.handle.as_ref().ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        handle.send(text.as_bytes())
    }

    pub async fn interrupt(&self, session_id: &str) -> Result<()> {
        let registry = self.registry.read().await;
        let state = registry.get(session_id).ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        tmux::send_interrupt(&state.record.tmux_target).await
    }

    pub async fn permission(&self, session_id: &str, _request_id: &str, approved: bool) -> Result<()> {
        let registry = self.registry.read().await;
        let state = registry.get(session_id).ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        tmux::send_keys(&state.record.tmux_target, if approved { "y" } else { "n" }, true).await
    }

    pub async fn kill(&self, session_id: &str) -> Result<()> {
        let mut registry = self.registry.write().await;
        let state = registry.remove(session_id).ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        drop(registry);

        tmux::kill_session(&state.record.tmux_target).await?;
        self.persist().await?;
        self.events.publish(Event::SessionEnded {
            session_id: session_id.to_string(),
            payload: serde_json::json!({ "tmux_target": state.record.tmux_target }),
        });
        Ok(())
    }

    /// Point-in-time pane snapshot, used while no client is attached and
    /// `pipe-pane` capture is stopped.
    pub async fn snapshot(&self, session_id: &str) -> Result<String> {
        let registry = self.registry.read().await;
        let state = registry.get(session_id).ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        tmux::capture_pane(&state.record.tmux_target).await
    }

    pub async fn list(&self) -> Vec<TerminalSessionRecord> {
        self.registry.read().await.list().into_iter().cloned().collect()
    }
}

/// Background task draining one session's FIFO reader, updating the ring
/// buffer and parser state, and publishing events for attached clients.
fn spawn_capture_pump(
    session_id: String,
    reader: flume::Receiver<Vec<u8>>,
    registry: Arc<RwLock<TerminalRegistry>>,
    events: Arc<EventBus>,
) {
    tokio::spawn(async move {
        while let Ok(chunk) = reader.recv_async().await {
            let (parsed, has_clients) = {
                let mut guard = registry.write().await;
                let Some(state) = guard.get_mut(&session_id) else { break };
                state.ring_buffer.push(&chunk);
                (state.parser.feed(&chunk), !state.clients.is_empty())
            };

            if has_clients {
                events.publish(Event::SessionRaw { session_id: session_id.clone(), bytes: chunk });
            }

            for event in parsed {
                publish_parsed_event(&session_id, &event, &registry, &events).await;
            }
        }
    });
}

async fn publish_parsed_event(
    session_id: &str,
    event: &OutputEvent,
    registry: &Arc<RwLock<TerminalRegistry>>,
    events: &Arc<EventBus>,
) {
    if let OutputEvent::Status { value } = event {
        let mut registry = registry.write().await;
        if let Some(state) = registry.get_mut(session_id) {
            state.input_queue.set_working(matches!(value, ThinkingStatus::Working | ThinkingStatus::Thinking));
            state.record.status = match value {
                ThinkingStatus::Working | ThinkingStatus::Thinking => TerminalStatus::Working,
                ThinkingStatus::Idle => TerminalStatus::Idle,
            };
        }
    }

    let payload = serde_json::to_value(event).unwrap_or(serde_json::Value::Null);
    match event {
        OutputEvent::PermissionRequest { .. } => {
            events.publish(Event::SessionPermission { session_id: session_id.to_string(), payload });
        }
        OutputEvent::Status { .. } => {
            events.publish(Event::SessionStatus { session_id: session_id.to_string(), payload });
        }
        _ => {
            events.publish(Event::SessionOutput { session_id: session_id.to_string(), payload });
        }
    }
}
