use std::path::PathBuf;

use brokerdesk_common::{Error, Result};
use brokerdesk_security::IdentifierValidator;
use tracing::info;

use crate::source::MigrationSource;

/// Width of the numeric prefix. Zero padding keeps byte order equal to
/// numeric order up to 9999 migrations.
pub const SEQUENCE_WIDTH: usize = 4;

/// Next sequence number after the highest leading numeric prefix among `filenames`.
pub fn next_sequence<'a>(filenames: impl IntoIterator<Item = &'a str>) -> u32 {
    filenames
        .into_iter()
        .filter_map(|name| {
            let digits: String = name.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse::<u32>().ok()
        })
        .max()
        .map_or(1, |n| n + 1)
}

/// Create an empty, correctly numbered migration file and return its path.
///
/// The directory is created when missing. Existing files are never overwritten.
pub fn new_migration(source: &MigrationSource, description: &str) -> Result<PathBuf> {
    let slug = IdentifierValidator::slugify(description);
    if slug.is_empty() {
        return Err(Error::Config(format!(
            "migration description {description:?} has no usable characters"
        )));
    }

    std::fs::create_dir_all(source.dir())?;
    let existing = source.discover()?;
    let seq = next_sequence(existing.iter().map(|f| f.filename.as_str()));

    let filename = format!(
        "{seq:0width$}_{slug}.{ext}",
        width = SEQUENCE_WIDTH,
        ext = source.extension()
    );
    let path = source.dir().join(&filename);
    if path.exists() {
        return Err(Error::Config(format!(
            "migration file already exists: {}",
            path.display()
        )));
    }

    std::fs::write(&path, format!("-- {description}\n"))?;
    info!("created migration {}", path.display());
    Ok(path)
}
