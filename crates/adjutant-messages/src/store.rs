use std::sync::Arc;

use adjutant_core::cache::{enum_from_sql, enum_to_sql, SqliteDb};
use adjutant_core::event_bus::{Event, EventBus};
use adjutant_core::types::{DeliveryStatus, Message, MessageRole, ThreadSummary};
use chrono::{DateTime, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MessageStoreError;

/// Filter + pagination window for [`MessageStore::read`].
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    pub thread_id: Option<String>,
    pub agent_id: Option<String>,
    /// Cursor: strictly-older-than `(created_at, id)`, newest-first order.
    pub before_cursor: Option<(DateTime<Utc>, Uuid)>,
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnreadCount {
    pub agent_id: String,
    pub count: u64,
}

pub struct MessageStore {
    db: SqliteDb,
    events: Arc<EventBus>,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    sender TEXT NOT NULL,
    recipient TEXT NOT NULL,
    role TEXT NOT NULL,
    body TEXT NOT NULL,
    thread_id TEXT,
    event_type TEXT,
    priority INTEGER,
    delivery_status TEXT NOT NULL,
    metadata_json TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_messages_created ON messages(created_at DESC, id);
CREATE INDEX IF NOT EXISTS idx_messages_recipient ON messages(recipient, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_messages_thread ON messages(thread_id, created_at DESC);

CREATE VIRTUAL TABLE IF NOT EXISTS messages_fts USING fts5(
    body, content='messages', content_rowid='rowid'
);

CREATE TRIGGER IF NOT EXISTS messages_ai AFTER INSERT ON messages BEGIN
    INSERT INTO messages_fts(rowid, body) VALUES (new.rowid, new.body);
END;
";

impl MessageStore {
    pub async fn open(
        path: impl AsRef<std::path::Path>,
        events: Arc<EventBus>,
    ) -> Result<Self, MessageStoreError> {
        let db = SqliteDb::open(path).await?;
        let store = Self { db, events };
        store.init_schema().await?;
        Ok(store)
    }

    pub async fn open_in_memory(events: Arc<EventBus>) -> Result<Self, MessageStoreError> {
        let db = SqliteDb::open_in_memory().await?;
        let store = Self { db, events };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), MessageStoreError> {
        self.db
            .call(|conn| {
                conn.execute_batch(SCHEMA)?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        &self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        role: MessageRole,
        body: impl Into<String>,
        thread_id: Option<String>,
        event_type: Option<String>,
        priority: Option<u8>,
        metadata: Option<serde_json::Value>,
    ) -> Result<Message, MessageStoreError> {
        let sender = sender.into();
        let recipient = recipient.into();
        let body = body.into();
        if body.trim().is_empty() {
            return Err(MessageStoreError::Validation("body must not be empty".into()));
        }
        if recipient.trim().is_empty() {
            return Err(MessageStoreError::Validation("recipient is required".into()));
        }

        let message = Message {
            id: Uuid::new_v4(),
            sender,
            recipient,
            role,
            body,
            thread_id,
            delivery_status: Some(DeliveryStatus::Unread),
            event_type,
            priority,
            created_at: Utc::now(),
            metadata,
        };

        let row = message.clone();
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO messages
                        (id, sender, recipient, role, body, thread_id, event_type,
                         priority, delivery_status, metadata_json, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                    rusqlite::params![
                        row.id.to_string(),
                        row.sender,
                        row.recipient,
                        enum_to_sql(&row.role),
                        row.body,
                        row.thread_id,
                        row.event_type,
                        row.priority,
                        enum_to_sql(&row.delivery_status.unwrap()),
                        row.metadata.map(|m| m.to_string()),
                        row.created_at.to_rfc3339(),
                    ],
                )?;
                Ok(())
            })
            .await?;

        self.events.publish(Event::MessageCreated(message.clone()));
        Ok(message)
    }

    pub async fn read(&self, filter: MessageFilter) -> Result<Vec<Message>, MessageStoreError> {
        let limit = filter.limit.clamp(1, 500);
        self.db
            .call(move |conn| {
                let mut sql = String::from("SELECT * FROM messages WHERE 1=1");
                let mut params: Vec<SqlValue> = Vec::new();

                if let Some(thread_id) = &filter.thread_id {
                    sql.push_str(" AND thread_id = ?");
                    params.push(SqlValue::Text(thread_id.clone()));
                }
                if let Some(agent_id) = &filter.agent_id {
                    sql.push_str(" AND (sender = ? OR recipient = ?)");
                    params.push(SqlValue::Text(agent_id.clone()));
                    params.push(SqlValue::Text(agent_id.clone()));
                }
                if let Some((ts, id)) = &filter.before_cursor {
                    sql.push_str(" AND (created_at < ? OR (created_at = ? AND id < ?))");
                    let ts = ts.to_rfc3339();
                    params.push(SqlValue::Text(ts.clone()));
                    params.push(SqlValue::Text(ts));
                    params.push(SqlValue::Text(id.to_string()));
                }
                sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ?");
                params.push(SqlValue::Integer(limit as i64));

                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params_from_iter(params.iter()), row_to_message)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await
            .map_err(Into::into)
    }

    pub async fn mark_read(&self, message_id: Uuid) -> Result<(), MessageStoreError> {
        let changed = self
            .db
            .call(move |conn| {
                conn.execute(
                    "UPDATE messages SET delivery_status = ?1 WHERE id = ?2",
                    rusqlite::params![enum_to_sql(&DeliveryStatus::Read), message_id.to_string()],
                )
            })
            .await?;
        if changed == 0 {
            return Err(MessageStoreError::NotFound(message_id.to_string()));
        }
        self.events
            .publish(Event::MessageRead { message_id, agent_id: None });
        Ok(())
    }

    pub async fn mark_read_bulk(&self, agent_id: impl Into<String>) -> Result<u64, MessageStoreError> {
        let agent_id = agent_id.into();
        let agent_for_query = agent_id.clone();
        let changed = self
            .db
            .call(move |conn| {
                conn.execute(
                    "UPDATE messages SET delivery_status = ?1 WHERE recipient = ?2 AND delivery_status != ?1",
                    rusqlite::params![enum_to_sql(&DeliveryStatus::Read), agent_for_query],
                )
            })
            .await?;
        self.events
            .publish(Event::MessageRead { message_id: Uuid::nil(), agent_id: Some(agent_id) });
        Ok(changed as u64)
    }

    pub async fn list_threads(
        &self,
        agent_id: Option<String>,
    ) -> Result<Vec<ThreadSummary>, MessageStoreError> {
        self.db
            .call(move |conn| {
                let mut sql = String::from(
                    "SELECT thread_id, COUNT(*) as count, MAX(created_at) as latest_created_at
                     FROM messages WHERE thread_id IS NOT NULL",
                );
                let mut params: Vec<SqlValue> = Vec::new();
                if let Some(agent_id) = &agent_id {
                    sql.push_str(" AND (sender = ? OR recipient = ?)");
                    params.push(SqlValue::Text(agent_id.clone()));
                    params.push(SqlValue::Text(agent_id.clone()));
                }
                sql.push_str(" GROUP BY thread_id ORDER BY latest_created_at DESC");

                let mut stmt = conn.prepare(&sql)?;
                let mut rows = stmt.query(params_from_iter(params.iter()))?;
                let mut out = Vec::new();
                while let Some(row) = rows.next()? {
                    let thread_id: String = row.get("thread_id")?;
                    let count: i64 = row.get("count")?;
                    let latest_created_at: String = row.get("latest_created_at")?;

                    let latest_body: String = conn.query_row(
                        "SELECT body FROM messages WHERE thread_id = ?1
                         ORDER BY created_at DESC, id DESC LIMIT 1",
                        [&thread_id],
                        |r| r.get(0),
                    )?;

                    out.push(ThreadSummary {
                        thread_id,
                        count: count as u64,
                        latest_body,
                        latest_created_at: DateTime::parse_from_rfc3339(&latest_created_at)
                            .map(|dt| dt.with_timezone(&Utc))
                            .unwrap_or_else(|_| Utc::now()),
                        agent_id: agent_id.clone(),
                    });
                }
                Ok(out)
            })
            .await
            .map_err(Into::into)
    }

    pub async fn search(
        &self,
        query: impl Into<String>,
        agent_id: Option<String>,
        limit: u32,
    ) -> Result<Vec<Message>, MessageStoreError> {
        let query = query.into();
        let limit = limit.clamp(1, 500);
        self.db
            .call(move |conn| {
                let mut sql = String::from(
                    "SELECT m.* FROM messages m
                     JOIN messages_fts f ON f.rowid = m.rowid
                     WHERE messages_fts MATCH ?1",
                );
                let mut params: Vec<SqlValue> = vec![SqlValue::Text(query)];
                if let Some(agent_id) = &agent_id {
                    sql.push_str(" AND (m.sender = ? OR m.recipient = ?)");
                    params.push(SqlValue::Text(agent_id.clone()));
                    params.push(SqlValue::Text(agent_id.clone()));
                }
                sql.push_str(" ORDER BY m.created_at DESC, m.id DESC LIMIT ?");
                params.push(SqlValue::Integer(limit as i64));

                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params_from_iter(params.iter()), row_to_message)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await
            .map_err(Into::into)
    }

    pub async fn unread_counts(
        &self,
        agent_id: Option<String>,
    ) -> Result<Vec<UnreadCount>, MessageStoreError> {
        self.db
            .call(move |conn| {
                let mut sql = String::from(
                    "SELECT recipient, COUNT(*) as count FROM messages WHERE delivery_status = ?1",
                );
                let mut params: Vec<SqlValue> = vec![SqlValue::Text(enum_to_sql(&DeliveryStatus::Unread))];
                if let Some(agent_id) = &agent_id {
                    sql.push_str(" AND recipient = ?");
                    params.push(SqlValue::Text(agent_id.clone()));
                }
                sql.push_str(" GROUP BY recipient");

                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params_from_iter(params.iter()), |row| {
                        Ok(UnreadCount {
                            agent_id: row.get("recipient")?,
                            count: row.get::<_, i64>("count")? as u64,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await
            .map_err(Into::into)
    }
}

fn row_to_message(row: &Row) -> rusqlite::Result<Message> {
    let id: String = row.get("id")?;
    let role: String = row.get("role")?;
    let delivery_status: String = row.get("delivery_status")?;
    let created_at: String = row.get("created_at")?;
    let metadata_json: Option<String> = row.get("metadata_json")?;
    let priority: Option<i64> = row.get("priority")?;

    Ok(Message {
        id: Uuid::parse_str(&id).unwrap_or_else(|_| Uuid::nil()),
        sender: row.get("sender")?,
        recipient: row.get("recipient")?,
        role: enum_from_sql(&role),
        body: row.get("body")?,
        thread_id: row.get("thread_id")?,
        delivery_status: Some(enum_from_sql(&delivery_status)),
        event_type: row.get("event_type")?,
        priority: priority.map(|p| p as u8),
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        metadata: metadata_json.and_then(|m| serde_json::from_str(&m).ok()),
    })
}
