pub mod database;
pub mod ledger;
pub mod report;
pub mod runner;
pub mod scaffold;
pub mod script;
pub mod source;

pub use database::Database;
pub use ledger::{DEFAULT_LEDGER_TABLE, LedgerStore, MigrationRecord};
pub use report::{
    EntryState, FileOutcome, FileStatus, RunEvent, RunReport, StatusEntry, StatusReport,
};
pub use runner::MigrationRunner;
pub use scaffold::{new_migration, next_sequence};
pub use source::{MigrationFile, MigrationSource, compare_filenames};
