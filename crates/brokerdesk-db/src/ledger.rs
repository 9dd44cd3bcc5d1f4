use brokerdesk_common::{Error, Result};
use brokerdesk_security::IdentifierValidator;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use tracing::debug;

pub const DEFAULT_LEDGER_TABLE: &str = "schema_migrations";

/// A migration that has been committed against the target schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationRecord {
    pub id: i64,
    pub filename: String,
    pub executed_at: DateTime<Utc>,
}

/// The table recording which migration files have been applied.
///
/// Rows are only ever inserted, and only inside the transaction that applies
/// the corresponding script.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    table: String,
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self {
            table: DEFAULT_LEDGER_TABLE.to_string(),
        }
    }
}

impl LedgerStore {
    pub fn new(table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        IdentifierValidator::validate_identifier(&table)?;
        Ok(Self { table })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the ledger table if it is not there yet.
    pub fn ensure_table(&self, conn: &Connection) -> Result<()> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filename TEXT NOT NULL UNIQUE,
                executed_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
            self.table
        ))
        .map_err(|e| {
            Error::Infrastructure(format!(
                "failed to create ledger table {}: {e}",
                self.table
            ))
        })?;
        debug!("ledger table {} ready", self.table);
        Ok(())
    }

    pub fn exists(&self, conn: &Connection) -> Result<bool> {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![self.table],
                |row| row.get(0),
            )
            .map_err(|e| Error::Infrastructure(format!("failed to inspect schema: {e}")))?;
        Ok(count > 0)
    }

    pub fn is_applied(&self, conn: &Connection, filename: &str) -> Result<bool> {
        let found = conn
            .query_row(
                &format!("SELECT 1 FROM {} WHERE filename = ?1", self.table),
                params![filename],
                |_| Ok(()),
            )
            .optional()
            .map_err(|e| Error::Infrastructure(format!("failed to query ledger: {e}")))?;
        Ok(found.is_some())
    }

    /// All ledger rows in insertion order.
    pub fn applied(&self, conn: &Connection) -> Result<Vec<MigrationRecord>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT id, filename, executed_at FROM {} ORDER BY id ASC",
                self.table
            ))
            .map_err(|e| Error::Infrastructure(format!("failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|e| Error::Infrastructure(format!("failed to query ledger: {e}")))?;

        let mut records = Vec::new();
        for row in rows {
            let (id, filename, executed_at) = row
                .map_err(|e| Error::Infrastructure(format!("failed to read ledger row: {e}")))?;
            records.push(MigrationRecord {
                id,
                executed_at: parse_executed_at(&executed_at)?,
                filename,
            });
        }
        Ok(records)
    }

    /// Insert the ledger row for `filename`.
    ///
    /// Callers pass the open transaction so the row commits or rolls back
    /// together with the migration body.
    pub fn record(&self, conn: &Connection, filename: &str) -> Result<()> {
        conn.execute(
            &format!("INSERT INTO {} (filename) VALUES (?1)", self.table),
            params![filename],
        )
        .map_err(|e| Error::Infrastructure(format!("failed to record {filename}: {e}")))?;
        Ok(())
    }
}

fn parse_executed_at(s: &str) -> Result<DateTime<Utc>> {
    // datetime('now') produces "YYYY-MM-DD HH:MM:SS"; rows written by other
    // tools may carry RFC 3339 instead.
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Infrastructure(format!("invalid executed_at {s:?}: {e}")))
}
