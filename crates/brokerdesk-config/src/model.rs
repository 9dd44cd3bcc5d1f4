use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration for the migrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub migrations: MigrationsConfig,
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,
    /// How long SQLite waits on a locked database before giving up.
    pub busy_timeout_ms: u64,
    /// Create the database file when it does not exist yet.
    pub create_if_missing: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("brokerdesk.db"),
            busy_timeout_ms: 5_000,
            create_if_missing: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MigrationsConfig {
    /// Directory holding the `.sql` migration files.
    pub dir: PathBuf,
    /// File extension (without the dot) that marks a file as a migration.
    pub extension: String,
    /// Name of the ledger table that records applied migrations.
    pub ledger_table: String,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("migrations"),
            extension: "sql".to_string(),
            ledger_table: "schema_migrations".to_string(),
        }
    }
}

impl AppConfig {
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }
}
