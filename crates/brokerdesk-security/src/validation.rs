use std::sync::LazyLock;

use brokerdesk_common::{Error, Result};
use regex::Regex;

/// Longest identifier accepted; matches PostgreSQL's NAMEDATALEN - 1.
const MAX_IDENTIFIER_LEN: usize = 63;

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex is valid")
});

static NON_ALNUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("slug regex is valid"));

/// Validation for names that end up spliced into SQL text or file names.
pub struct IdentifierValidator;

impl IdentifierValidator {
    /// Validate a bare SQL identifier (e.g. the ledger table name).
    ///
    /// Table names cannot be bound as query parameters, so anything outside
    /// `[A-Za-z_][A-Za-z0-9_]*` is rejected before it reaches a statement.
    pub fn validate_identifier(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::Config("identifier cannot be empty".into()));
        }
        if name.len() > MAX_IDENTIFIER_LEN {
            return Err(Error::Config(format!(
                "identifier too long ({} > {MAX_IDENTIFIER_LEN}): {name}",
                name.len()
            )));
        }
        if !IDENTIFIER_RE.is_match(name) {
            return Err(Error::Config(format!(
                "identifier contains invalid characters: {name:?}"
            )));
        }
        Ok(())
    }

    /// Turn a free-form description into a file-name-safe slug.
    ///
    /// Lowercases, collapses every run of non-alphanumerics into a single `_`,
    /// and trims leading/trailing underscores. May return an empty string.
    pub fn slugify(input: &str) -> String {
        let lower = input.to_lowercase();
        NON_ALNUM_RE
            .replace_all(&lower, "_")
            .trim_matches('_')
            .to_string()
    }
}
