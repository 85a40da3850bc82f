//! SQLite-backed storage.
//!
//! Provides persistent storage for:
//! - Key-value preferences (settings and JSON-encoded blocklists)
//! - A history of interventions issued by the blocking engine

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::events::{Category, InterventionAction};

use super::{data_dir, KvStore};

/// One row of the intervention history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterventionRecord {
    pub id: i64,
    pub at: DateTime<Utc>,
    pub category: Category,
    pub entry: String,
    pub action: InterventionAction,
}

/// SQLite database holding preferences and intervention history.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/focusguard.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let path = data_dir()?.join("focusguard.db");
        let conn = Connection::open(&path).map_err(|source| StoreError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS interventions (
                id       INTEGER PRIMARY KEY AUTOINCREMENT,
                at       TEXT NOT NULL,
                category TEXT NOT NULL,
                entry    TEXT NOT NULL,
                action   TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_interventions_at ON interventions(at);",
        )?;
        Ok(())
    }

    /// Append an intervention to the history.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_intervention(
        &self,
        at: DateTime<Utc>,
        category: Category,
        entry: &str,
        action: InterventionAction,
    ) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO interventions (at, category, entry, action)
             VALUES (?1, ?2, ?3, ?4)",
            params![timestamp(at), category.as_str(), entry, action.as_str()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent interventions first.
    pub fn recent_interventions(&self, limit: usize) -> Result<Vec<InterventionRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, at, category, entry, action FROM interventions
             ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, at, category, entry, action) = row?;
            // Rows written by a newer build may carry values this one does not know.
            let (Some(category), Some(action)) =
                (Category::parse(&category), InterventionAction::parse(&action))
            else {
                tracing::warn!("skipping unreadable intervention row {id}");
                continue;
            };
            let at = DateTime::parse_from_rfc3339(&at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_default();
            records.push(InterventionRecord {
                id,
                at,
                category,
                entry,
                action,
            });
        }
        Ok(records)
    }

    /// Number of interventions recorded since `since`.
    pub fn interventions_since(&self, since: DateTime<Utc>) -> Result<u64, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM interventions WHERE at >= ?1",
            params![timestamp(since)],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

/// Fixed-width RFC 3339 so stored timestamps compare correctly as text.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl KvStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}
