//! `/ws/chat` fanout hub plus SSE/long-poll fallbacks (spec §4.8).
//!
//! A single background task subscribes to the shared [`EventBus`] and turns
//! every event the wire protocol names into an [`OutboundFrame`], appending
//! it to a bounded replay ring and pushing it to every registered client.
//! Reconnecting clients supply `last_seen_seq`; frames already evicted from
//! the ring are reported as `replay:truncated` rather than silently skipped.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::sse::{Event as SseEvent, Sse};
use axum::{extract::State, response::IntoResponse};
use dashmap::DashMap;
use futures_util::stream::Stream;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::Mutex;
use uuid::Uuid;

use adjutant_core::event_bus::{Event, EventBus};

use crate::origin_validation::{get_default_allowed_origins, validate_websocket_origin};
use crate::protocol::{frame_type_for_event, ClientFrame, OutboundFrame, ServerFrame};

use super::state::ApiState;

/// Bounded replay ring plus live client registry for `/ws/chat`.
pub struct WsHub {
    server_boot_id: Uuid,
    seq: AtomicU64,
    replay: Mutex<VecDeque<OutboundFrame>>,
    replay_capacity: usize,
    clients: DashMap<String, flume::Sender<OutboundFrame>>,
}

impl WsHub {
    pub fn new(replay_capacity: usize) -> Self {
        Self {
            server_boot_id: Uuid::new_v4(),
            seq: AtomicU64::new(0),
            replay: Mutex::new(VecDeque::with_capacity(replay_capacity.max(1))),
            replay_capacity: replay_capacity.max(1),
            clients: DashMap::new(),
        }
    }

    pub fn server_boot_id(&self) -> String {
        self.server_boot_id.to_string()
    }

    pub fn current_seq(&self) -> u64 {
        self.seq.load(Ordering::Relaxed)
    }

    pub fn register(&self, client_id: String, tx: flume::Sender<OutboundFrame>) {
        self.clients.insert(client_id, tx);
    }

    pub fn unregister(&self, client_id: &str) {
        self.clients.remove(client_id);
    }

    /// Appends `frame_type`/`payload` to the replay ring and fans it out to
    /// every registered client. Returns the frame's assigned sequence number.
    pub async fn publish(&self, frame_type: &str, payload: serde_json::Value) -> u64 {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let frame = OutboundFrame {
            frame_type: frame_type.to_string(),
            seq,
            server_boot_id: self.server_boot_id.to_string(),
            payload,
        };

        {
            let mut ring = self.replay.lock().await;
            if ring.len() >= self.replay_capacity {
                ring.pop_front();
            }
            ring.push_back(frame.clone());
        }

        // A slow client whose outbound buffer is still full on the next
        // publish is disconnected rather than left to back up forever;
        // dropping its sender here unblocks the matching `rx.recv_async()`
        // in `handle_ws_chat`, which then closes the socket.
        let mut slow = Vec::new();
        for client in self.clients.iter() {
            if let Err(flume::TrySendError::Full(_)) = client.value().try_send(frame.clone()) {
                slow.push(client.key().clone());
            }
        }
        for client_id in slow {
            self.clients.remove(&client_id);
        }
        seq
    }

    /// Frames strictly after `last_seen_seq`. `None` means the requested
    /// window has already aged out of the ring (`replay:truncated`).
    pub async fn replay_since(&self, last_seen_seq: u64) -> Option<Vec<OutboundFrame>> {
        let ring = self.replay.lock().await;
        let Some(oldest) = ring.front() else {
            return Some(Vec::new());
        };
        if last_seen_seq + 1 < oldest.seq {
            return None;
        }
        Some(ring.iter().filter(|f| f.seq > last_seen_seq).cloned().collect())
    }

    /// Background task: subscribes to the event bus and publishes every
    /// frame-worthy event. Runs for the lifetime of the daemon.
    pub async fn run_event_pump(self: Arc<Self>, events: Arc<EventBus>) {
        let sub = events.subscribe();
        while let Ok(event) = sub.rx.recv_async().await {
            if let Some(frame_type) = frame_type_for_event(&event) {
                let payload = event_payload(&event);
                self.publish(frame_type, payload).await;
            }
        }
    }
}

fn event_payload(event: &Event) -> serde_json::Value {
    serde_json::to_value(event)
        .ok()
        .and_then(|v| v.get("payload").cloned())
        .unwrap_or(serde_json::Value::Null)
}

// ---------------------------------------------------------------------------
// /ws/chat
// ---------------------------------------------------------------------------

pub(crate) async fn ws_chat_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(status) = validate_websocket_origin(&headers, &get_default_allowed_origins()) {
        return status.into_response();
    }
    ws.on_upgrade(move |socket| handle_ws_chat(socket, state))
}

async fn handle_ws_chat(socket: WebSocket, state: Arc<ApiState>) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Handshake: first frame must be `auth`.
    let auth = loop {
        match ws_rx.next().await {
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientFrame>(&text) {
                Ok(ClientFrame::Auth { api_key, last_seen_seq, server_boot_id }) => {
                    break Some((api_key, last_seen_seq, server_boot_id))
                }
                Ok(ClientFrame::Typing { .. }) => continue,
                Err(_) => break None,
            },
            Some(Ok(Message::Close(_))) | None => return,
            Some(Ok(_)) => continue,
            Some(Err(_)) => return,
        }
    };

    let Some((api_key, last_seen_seq, client_boot_id)) = auth else {
        let _ = ws_tx
            .send(frame_to_message(&ServerFrame::error(
                "VALIDATION_ERROR",
                "first frame must be an auth frame",
            )))
            .await;
        return;
    };

    if let Some(expected) = &state.config.security.api_key {
        if api_key.as_deref() != Some(expected.as_str()) {
            let _ = ws_tx
                .send(frame_to_message(&ServerFrame::error("UNAUTHORIZED", "invalid api key")))
                .await;
            return;
        }
    }

    let client_id = Uuid::new_v4().simple().to_string();
    let boot_id = state.ws_hub.server_boot_id();
    let seq = state.ws_hub.current_seq();
    if ws_tx
        .send(frame_to_message(&ServerFrame::auth_ok(client_id.clone(), boot_id.clone(), seq)))
        .await
        .is_err()
    {
        return;
    }

    // Replay buffered frames if the client reconnected with a matching boot id.
    if let Some(last_seen_seq) = last_seen_seq {
        let same_boot = client_boot_id.as_deref() == Some(boot_id.as_str());
        if same_boot {
            match state.ws_hub.replay_since(last_seen_seq).await {
                Some(frames) => {
                    for frame in frames {
                        if ws_tx.send(outbound_to_message(&frame)).await.is_err() {
                            return;
                        }
                    }
                }
                None => {
                    if ws_tx.send(frame_to_message(&ServerFrame::replay_truncated())).await.is_err() {
                        return;
                    }
                }
            }
        }
    }

    let (tx, rx) = flume::bounded::<OutboundFrame>(256);
    state.ws_hub.register(client_id.clone(), tx);

    let mut heartbeat = tokio::time::interval(Duration::from_secs(30));
    loop {
        tokio::select! {
            frame = rx.recv_async() => {
                match frame {
                    Ok(frame) => {
                        if ws_tx.send(outbound_to_message(&frame)).await.is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
            _ = heartbeat.tick() => {
                if ws_tx.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }
            incoming = ws_rx.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(ClientFrame::Typing { agent_id, thread_id }) =
                            serde_json::from_str::<ClientFrame>(&text)
                        {
                            let payload = serde_json::json!({ "agent_id": agent_id, "thread_id": thread_id });
                            state.ws_hub.publish("typing", payload).await;
                        }
                    }
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    state.ws_hub.unregister(&client_id);
}

fn frame_to_message(frame: &ServerFrame) -> Message {
    Message::Text(serde_json::to_string(frame).unwrap_or_default().into())
}

fn outbound_to_message(frame: &OutboundFrame) -> Message {
    Message::Text(serde_json::to_string(frame).unwrap_or_default().into())
}

// ---------------------------------------------------------------------------
// SSE fallback: GET /api/events
// ---------------------------------------------------------------------------

pub(crate) async fn events_sse_handler(
    State(state): State<Arc<ApiState>>,
) -> Sse<impl Stream<Item = Result<SseEvent, std::convert::Infallible>>> {
    let (tx, rx) = flume::bounded::<OutboundFrame>(256);
    let client_id = Uuid::new_v4().simple().to_string();
    state.ws_hub.register(client_id, tx);

    // A stale entry in `clients` is harmless: `publish` only ever does a
    // `try_send`, so once this stream drops and `rx` disconnects, the next
    // publish attempt is a no-op for this client rather than an error.
    let stream = rx.into_stream().map(|frame| {
        Ok(SseEvent::default()
            .event(frame.frame_type.clone())
            .data(serde_json::to_string(&frame).unwrap_or_default()))
    });
    Sse::new(stream).keep_alive(axum::response::sse::KeepAlive::default())
}

// ---------------------------------------------------------------------------
// Long-poll fallback: GET /api/events/poll?since=<seq>
// ---------------------------------------------------------------------------

#[derive(Debug, serde::Deserialize)]
pub(crate) struct PollQuery {
    since: Option<u64>,
}

pub(crate) async fn events_poll_handler(
    State(state): State<Arc<ApiState>>,
    axum::extract::Query(query): axum::extract::Query<PollQuery>,
) -> impl IntoResponse {
    let since = query.since.unwrap_or(0);
    match state.ws_hub.replay_since(since).await {
        Some(frames) => crate::api_error::ok_json(serde_json::json!({ "frames": frames })),
        None => crate::api_error::ok_json(serde_json::json!({ "frames": [], "truncated": true })),
    }
}
