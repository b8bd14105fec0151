//! Thin async SQLite connection wrapper shared by the store crates
//! (`adjutant-messages`' MessageStore, `adjutant-beads`' prefix-map cache).
//!
//! Each store owns its own schema; this module only owns connection setup
//! (WAL mode, busy timeout) and the enum<->TEXT column encoding so every
//! store speaks the same on-disk convention.

use std::path::Path;

/// Async SQLite connection configured the same way across every store:
/// WAL journaling and a busy-timeout so concurrent readers never starve a
/// writer, per the single-writer-many-readers discipline this system
/// depends on.
pub struct SqliteDb {
    conn: tokio_rusqlite::Connection,
}

impl SqliteDb {
    /// Open (or create) a database at the given file path.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, tokio_rusqlite::Error> {
        let conn = tokio_rusqlite::Connection::open(path.as_ref()).await?;
        let db = Self { conn };
        db.apply_pragmas().await?;
        Ok(db)
    }

    /// Create a purely in-memory database (tests, `new_in_memory`
    /// constructors in the owning store).
    pub async fn open_in_memory() -> Result<Self, tokio_rusqlite::Error> {
        let conn = tokio_rusqlite::Connection::open_in_memory().await?;
        let db = Self { conn };
        db.apply_pragmas().await?;
        Ok(db)
    }

    async fn apply_pragmas(&self) -> Result<(), tokio_rusqlite::Error> {
        self.conn
            .call(|conn| {
                conn.execute_batch(
                    "PRAGMA journal_mode=WAL;
                     PRAGMA synchronous=NORMAL;
                     PRAGMA busy_timeout=5000;",
                )?;
                Ok(())
            })
            .await
    }

    /// Run a closure against the underlying `rusqlite::Connection` on the
    /// connection's dedicated blocking thread.
    pub async fn call<F, T>(&self, f: F) -> Result<T, tokio_rusqlite::Error>
    where
        F: FnOnce(&mut rusqlite::Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.conn.call(f).await
    }
}

/// Encode a serde enum as the bare JSON string value (quotes stripped) for
/// storage in a SQLite TEXT column.
pub fn enum_to_sql<T: serde::Serialize>(val: &T) -> String {
    let s = serde_json::to_string(val).expect("serialize enum");
    s.trim_matches('"').to_string()
}

/// Decode a SQLite TEXT column back into a serde enum, inverse of
/// [`enum_to_sql`].
pub fn enum_from_sql<T: serde::de::DeserializeOwned>(raw: &str) -> T {
    let quoted = format!("\"{}\"", raw);
    serde_json::from_str(&quoted).expect("deserialize enum")
}
