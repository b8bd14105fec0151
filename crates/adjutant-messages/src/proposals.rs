use adjutant_core::cache::{enum_from_sql, enum_to_sql, SqliteDb};
use adjutant_core::types::{Proposal, ProposalStatus, ProposalType};
use chrono::{DateTime, Utc};
use rusqlite::Row;
use uuid::Uuid;

use crate::error::MessageStoreError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS proposals (
    id TEXT PRIMARY KEY,
    author TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    proposal_type TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_proposals_status ON proposals(status, created_at DESC);
";

/// Product/engineering proposal log, sharing the same database file and
/// connection discipline as [`crate::MessageStore`] but its own schema.
pub struct ProposalStore {
    db: SqliteDb,
}

impl ProposalStore {
    pub async fn open(path: impl AsRef<std::path::Path>) -> Result<Self, MessageStoreError> {
        let db = SqliteDb::open(path).await?;
        let store = Self { db };
        store.init_schema().await?;
        Ok(store)
    }

    pub async fn open_in_memory() -> Result<Self, MessageStoreError> {
        let db = SqliteDb::open_in_memory().await?;
        let store = Self { db };
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

    pub async fn create(
        &self,
        author: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        proposal_type: ProposalType,
    ) -> Result<Proposal, MessageStoreError> {
        let title = title.into();
        let description = description.into();
        if title.trim().is_empty() {
            return Err(MessageStoreError::Validation("title must not be empty".into()));
        }
        let proposal = Proposal::new(author, title, description, proposal_type);
        let row = proposal.clone();
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO proposals
                        (id, author, title, description, proposal_type, status, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    rusqlite::params![
                        row.id.to_string(),
                        row.author,
                        row.title,
                        row.description,
                        enum_to_sql(&row.proposal_type),
                        enum_to_sql(&row.status),
                        row.created_at.to_rfc3339(),
                        row.updated_at.to_rfc3339(),
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(proposal)
    }

    pub async fn get(&self, id: Uuid) -> Result<Proposal, MessageStoreError> {
        self.db
            .call(move |conn| {
                conn.query_row(
                    "SELECT * FROM proposals WHERE id = ?1",
                    [id.to_string()],
                    row_to_proposal,
                )
            })
            .await
            .map_err(|e| match e {
                tokio_rusqlite::Error::Rusqlite(rusqlite::Error::QueryReturnedNoRows) => {
                    MessageStoreError::NotFound(id.to_string())
                }
                other => other.into(),
            })
    }

    pub async fn list(
        &self,
        status: Option<ProposalStatus>,
    ) -> Result<Vec<Proposal>, MessageStoreError> {
        self.db
            .call(move |conn| {
                let rows = match status {
                    Some(status) => {
                        let mut stmt = conn.prepare(
                            "SELECT * FROM proposals WHERE status = ?1 ORDER BY created_at DESC",
                        )?;
                        stmt.query_map([enum_to_sql(&status)], row_to_proposal)?
                            .collect::<rusqlite::Result<Vec<_>>>()?
                    }
                    None => {
                        let mut stmt =
                            conn.prepare("SELECT * FROM proposals ORDER BY created_at DESC")?;
                        stmt.query_map([], row_to_proposal)?
                            .collect::<rusqlite::Result<Vec<_>>>()?
                    }
                };
                Ok(rows)
            })
            .await
            .map_err(Into::into)
    }

    /// Transition a proposal's status, enforcing the DAG in
    /// [`ProposalStatus::can_transition_to`].
    pub async fn update_status(
        &self,
        id: Uuid,
        target: ProposalStatus,
    ) -> Result<Proposal, MessageStoreError> {
        let current = self.get(id).await?;
        if !current.status.can_transition_to(target) {
            return Err(MessageStoreError::Validation(format!(
                "cannot transition proposal from {:?} to {:?}",
                current.status, target
            )));
        }

        let now = Utc::now();
        self.db
            .call(move |conn| {
                conn.execute(
                    "UPDATE proposals SET status = ?1, updated_at = ?2 WHERE id = ?3",
                    rusqlite::params![enum_to_sql(&target), now.to_rfc3339(), id.to_string()],
                )
            })
            .await?;

        Ok(Proposal { status: target, updated_at: now, ..current })
    }
}

fn row_to_proposal(row: &Row) -> rusqlite::Result<Proposal> {
    let id: String = row.get("id")?;
    let proposal_type: String = row.get("proposal_type")?;
    let status: String = row.get("status")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Proposal {
        id: Uuid::parse_str(&id).unwrap_or_else(|_| Uuid::nil()),
        author: row.get("author")?,
        title: row.get("title")?,
        description: row.get("description")?,
        proposal_type: enum_from_sql(&proposal_type),
        status: enum_from_sql(&status),
        created_at: parse_rfc3339(&created_at),
        updated_at: parse_rfc3339(&updated_at),
    })
}

fn parse_rfc3339(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
