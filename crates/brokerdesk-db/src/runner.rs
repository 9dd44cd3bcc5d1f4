use std::collections::HashSet;

use brokerdesk_common::Result;
use brokerdesk_config::MigrationsConfig;
use rusqlite::Connection;
use tracing::{error, info, warn};

use crate::ledger::LedgerStore;
use crate::report::{
    EntryState, FileOutcome, FileStatus, RunEvent, RunReport, StatusEntry, StatusReport,
};
use crate::script::execute_script;
use crate::source::{MigrationFile, MigrationSource};

/// Applies pending migration files, one transaction per file, stopping at the
/// first failure.
///
/// The runner holds no connection of its own; callers pass one in for each
/// call and keep ownership of it.
#[derive(Debug, Clone)]
pub struct MigrationRunner {
    source: MigrationSource,
    ledger: LedgerStore,
}

impl MigrationRunner {
    pub fn new(source: MigrationSource, ledger: LedgerStore) -> Self {
        Self { source, ledger }
    }

    pub fn from_config(config: &MigrationsConfig) -> Result<Self> {
        Ok(Self::new(
            MigrationSource::new(&config.dir, &config.extension),
            LedgerStore::new(&config.ledger_table)?,
        ))
    }

    pub fn source(&self) -> &MigrationSource {
        &self.source
    }

    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    /// Bring the schema up to date.
    pub fn run(&self, conn: &mut Connection) -> Result<RunReport> {
        self.run_with(conn, |_| {})
    }

    /// Like [`run`](Self::run), reporting progress to `on_event`: the
    /// discovered file list first, then each file as it reaches its terminal
    /// state.
    ///
    /// `Err` is returned only for problems that prevent the run from starting
    /// (missing directory, ledger bootstrap). A failing script is reported as
    /// [`FileStatus::Failed`] in the returned report and halts the run.
    pub fn run_with<F>(&self, conn: &mut Connection, mut on_event: F) -> Result<RunReport>
    where
        F: FnMut(RunEvent<'_>),
    {
        // The directory is checked before the database is touched.
        let files = self.source.discover()?;
        self.ledger.ensure_table(conn)?;

        let mut report = RunReport {
            discovered: files.iter().map(|f| f.filename.clone()).collect(),
            outcomes: Vec::with_capacity(files.len()),
        };
        info!(
            "found {} migration file(s) in {}",
            files.len(),
            self.source.dir().display()
        );
        on_event(RunEvent::Discovered(&report.discovered));

        for file in &files {
            let status = if self.ledger.is_applied(conn, &file.filename)? {
                info!("skipping {} (already applied)", file.filename);
                FileStatus::Skipped
            } else {
                match self.apply(conn, file) {
                    Ok(()) => {
                        info!("applied {}", file.filename);
                        FileStatus::Applied
                    }
                    Err(message) => {
                        error!("migration {} failed: {}", file.filename, message);
                        FileStatus::Failed { message }
                    }
                }
            };

            let halt = matches!(status, FileStatus::Failed { .. });
            let outcome = FileOutcome {
                filename: file.filename.clone(),
                status,
            };
            on_event(RunEvent::Finished(&outcome));
            report.outcomes.push(outcome);

            if halt {
                warn!(
                    "halting run; {} later migration(s) not attempted",
                    report.not_attempted()
                );
                break;
            }
        }

        info!(
            "migration run finished: {} applied, {} skipped, {} failed",
            report.succeeded(),
            report.skipped(),
            report.failed()
        );
        Ok(report)
    }

    /// Execute one script and record it in the ledger inside one transaction.
    fn apply(
        &self,
        conn: &mut Connection,
        file: &MigrationFile,
    ) -> std::result::Result<(), String> {
        let sql = file
            .read_sql()
            .map_err(|e| format!("failed to read {}: {e}", file.path.display()))?;

        let tx = conn
            .transaction()
            .map_err(|e| format!("failed to begin transaction: {e}"))?;

        if let Err(e) = execute_script(&tx, &sql) {
            rollback(tx, &file.filename);
            return Err(e);
        }
        if tx.is_autocommit() {
            // Nothing may be recorded once the script has ended the transaction.
            return Err("script ended the migration transaction".to_string());
        }
        if let Err(e) = self.ledger.record(&tx, &file.filename) {
            rollback(tx, &file.filename);
            return Err(e.to_string());
        }

        // A failed commit drops the transaction, which rolls it back.
        tx.commit()
            .map_err(|e| format!("failed to commit transaction: {e}"))
    }

    /// Compare the directory with the ledger without changing anything.
    ///
    /// The ledger table is not created when it is missing; every file is then
    /// reported as pending.
    pub fn status(&self, conn: &Connection) -> Result<StatusReport> {
        let files = self.source.discover()?;
        let ledger_present = self.ledger.exists(conn)?;
        let records = if ledger_present {
            self.ledger.applied(conn)?
        } else {
            Vec::new()
        };

        let mut entries: Vec<StatusEntry> = files
            .iter()
            .map(|file| {
                let state = records
                    .iter()
                    .find(|r| r.filename == file.filename)
                    .map_or(EntryState::Pending, |r| EntryState::Applied {
                        executed_at: r.executed_at,
                    });
                StatusEntry {
                    filename: file.filename.clone(),
                    state,
                }
            })
            .collect();

        let on_disk: HashSet<&str> = files.iter().map(|f| f.filename.as_str()).collect();
        entries.extend(
            records
                .iter()
                .filter(|r| !on_disk.contains(r.filename.as_str()))
                .map(|r| StatusEntry {
                    filename: r.filename.clone(),
                    state: EntryState::Orphaned {
                        executed_at: r.executed_at,
                    },
                }),
        );

        Ok(StatusReport {
            ledger_present,
            entries,
        })
    }
}

fn rollback(tx: rusqlite::Transaction<'_>, filename: &str) {
    if let Err(e) = tx.rollback() {
        warn!("rollback of {filename} reported an error: {e}");
    }
}
