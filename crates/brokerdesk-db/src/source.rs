use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use brokerdesk_common::{Error, Result};
use tracing::{debug, warn};

/// A migration script found on disk. The body is read only when it is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    pub filename: String,
    pub path: PathBuf,
}

impl MigrationFile {
    pub fn read_sql(&self) -> std::io::Result<String> {
        std::fs::read_to_string(&self.path)
    }
}

/// Execution order of migration files: plain byte-wise comparison of names.
///
/// This is the only ordering the runner uses. It is not numeric and not
/// locale-aware, so `10_x.sql` sorts before `2_x.sql`; numeric prefixes must
/// be zero-padded to a common width.
pub fn compare_filenames(a: &str, b: &str) -> Ordering {
    a.as_bytes().cmp(b.as_bytes())
}

/// A directory of migration files with a given extension.
#[derive(Debug, Clone)]
pub struct MigrationSource {
    dir: PathBuf,
    extension: String,
}

impl MigrationSource {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        let extension: String = extension.into();
        Self {
            dir: dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// List migration files in execution order.
    ///
    /// Fails with a configuration error when the directory is missing.
    /// Subdirectories and files with other extensions are ignored.
    pub fn discover(&self) -> Result<Vec<MigrationFile>> {
        if !self.dir.is_dir() {
            return Err(Error::Config(format!(
                "migrations directory not found: {}",
                self.dir.display()
            )));
        }

        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            Error::Config(format!(
                "failed to read migrations directory {}: {e}",
                self.dir.display()
            ))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
                continue;
            }
            let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
                warn!("skipping migration with non UTF-8 name: {}", path.display());
                continue;
            };
            files.push(MigrationFile {
                filename: filename.to_string(),
                path: path.clone(),
            });
        }

        files.sort_by(|a, b| compare_filenames(&a.filename, &b.filename));
        debug!(
            "discovered {} migration(s) in {}",
            files.len(),
            self.dir.display()
        );
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), "SELECT 1;").unwrap();
    }

    #[test]
    fn comparator_is_bytewise_not_numeric() {
        assert_eq!(
            compare_filenames("10_add_index.sql", "2_add_col.sql"),
            Ordering::Less
        );
        assert_eq!(
            compare_filenames("0002_add_col.sql", "0010_add_index.sql"),
            Ordering::Less
        );
        // uppercase sorts before lowercase in byte order
        assert_eq!(compare_filenames("B.sql", "a.sql"), Ordering::Less);
    }

    #[test]
    fn discover_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "2_add_col.sql");
        touch(dir.path(), "10_add_index.sql");
        touch(dir.path(), "README.md");
        touch(dir.path(), "notes.sql.bak");
        std::fs::create_dir(dir.path().join("archive.sql")).unwrap();

        let files = MigrationSource::new(dir.path(), "sql").discover().unwrap();
        let names: Vec<_> = files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["10_add_index.sql", "2_add_col.sql"]);
        assert_eq!(files[0].path, dir.path().join("10_add_index.sql"));
    }

    #[test]
    fn discover_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let files = MigrationSource::new(dir.path(), ".sql").discover().unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn discover_missing_directory_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = MigrationSource::new(dir.path().join("nope"), "sql")
            .discover()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn discover_rejects_plain_file_as_directory() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "0001_accounts.sql");
        let err = MigrationSource::new(dir.path().join("0001_accounts.sql"), "sql")
            .discover()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn custom_extension() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "0001_accounts.up.sql");
        touch(dir.path(), "0001_accounts.psql");

        let source = MigrationSource::new(dir.path(), "psql");
        assert_eq!(source.extension(), "psql");
        let files = source.discover().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "0001_accounts.psql");
    }
}
