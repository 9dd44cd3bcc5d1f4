use std::time::Duration;

use brokerdesk_common::{Error, Result};
use brokerdesk_config::DatabaseConfig;
use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info};

/// Owned handle to the target database.
///
/// The connection lives exactly as long as this value; dropping it closes the
/// connection on every exit path.
pub struct Database {
    conn: Connection,
    label: String,
}

impl Database {
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        info!("opening database at {}", config.path.display());

        let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if config.create_if_missing {
            flags |= OpenFlags::SQLITE_OPEN_CREATE;
        }

        let conn = Connection::open_with_flags(&config.path, flags).map_err(|e| {
            Error::Infrastructure(format!(
                "failed to open database {}: {e}",
                config.path.display()
            ))
        })?;

        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(|e| Error::Infrastructure(format!("failed to set busy timeout: {e}")))?;

        Self::prepare(conn, config.path.display().to_string())
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            Error::Infrastructure(format!("failed to open in-memory database: {e}"))
        })?;
        Self::prepare(conn, ":memory:".to_string())
    }

    fn prepare(conn: Connection, label: String) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::Infrastructure(format!("failed to set pragmas: {e}")))?;
        Ok(Self { conn, label })
    }

    /// Connectivity preflight: a trivial round-trip that must return 1.
    pub fn ping(&self) -> Result<()> {
        let one: i64 = self
            .conn
            .query_row("SELECT 1", [], |row| row.get(0))
            .map_err(|e| Error::Infrastructure(format!("database is not reachable: {e}")))?;
        if one != 1 {
            return Err(Error::Infrastructure(format!(
                "unexpected preflight result: {one}"
            )));
        }
        debug!("preflight ok for {}", self.label);
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        debug!("releasing database connection to {}", self.label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_database_answers_preflight() {
        let db = Database::in_memory().unwrap();
        db.ping().unwrap();
        assert_eq!(db.label(), ":memory:");
    }

    #[test]
    fn open_creates_file_when_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            path: dir.path().join("office.db"),
            ..Default::default()
        };

        let db = Database::open(&config).unwrap();
        db.ping().unwrap();
        assert!(config.path.exists());
    }

    #[test]
    fn open_fails_for_missing_file_without_create() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            path: dir.path().join("absent.db"),
            create_if_missing: false,
            ..Default::default()
        };

        let err = Database::open(&config).err().unwrap();
        assert!(matches!(err, Error::Infrastructure(_)));
        assert!(!config.path.exists());
    }

    #[test]
    fn foreign_keys_are_enabled() {
        let db = Database::in_memory().unwrap();
        let enabled: i64 = db
            .connection()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
