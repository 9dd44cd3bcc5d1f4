use brokerdesk_common::Error;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Terminal state of one migration file within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Applied,
    Skipped,
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub filename: String,
    #[serde(flatten)]
    pub status: FileStatus,
}

/// Progress notification emitted while a run is in flight.
#[derive(Debug, Clone, Copy)]
pub enum RunEvent<'a> {
    /// All migration files found, in execution order. Sent once, before any file runs.
    Discovered(&'a [String]),
    /// A file reached its terminal state.
    Finished(&'a FileOutcome),
}

/// Structured result of one run. Turning it into an exit code is left to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Every file found, in execution order.
    pub discovered: Vec<String>,
    /// Files actually visited; stops at the first failure.
    pub outcomes: Vec<FileOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Applied))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Failed { .. }))
    }

    /// Files never attempted because an earlier one failed.
    pub fn not_attempted(&self) -> usize {
        self.discovered.len() - self.outcomes.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }

    /// The failure that halted the run, if any.
    pub fn error(&self) -> Option<Error> {
        self.outcomes.iter().find_map(|o| match &o.status {
            FileStatus::Failed { message } => Some(Error::Migration {
                filename: o.filename.clone(),
                message: message.clone(),
            }),
            _ => None,
        })
    }

    fn count(&self, pred: impl Fn(&FileStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Where a file stands relative to the ledger, without running anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EntryState {
    Applied { executed_at: DateTime<Utc> },
    Pending,
    /// Recorded in the ledger but no longer present on disk.
    Orphaned { executed_at: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    pub filename: String,
    #[serde(flatten)]
    pub state: EntryState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub ledger_present: bool,
    pub entries: Vec<StatusEntry>,
}

impl StatusReport {
    pub fn applied(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.state, EntryState::Applied { .. }))
            .count()
    }

    pub fn pending(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.state, EntryState::Pending))
            .count()
    }

    pub fn orphaned(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.state, EntryState::Orphaned { .. }))
            .count()
    }
}
