use rusqlite::{Batch, Connection};

/// Statements that open or close a transaction. The runner owns the
/// transaction around each file, so a script may not issue any of these.
const TRANSACTION_KEYWORDS: [&str; 4] = ["BEGIN", "COMMIT", "END", "ROLLBACK"];

/// Run every statement of a migration script on `conn`, one at a time.
///
/// Each statement is prepared only after the previous one has run, so later
/// statements may refer to objects created earlier in the same script. A
/// transaction control statement is rejected before it executes.
pub fn execute_script(conn: &Connection, sql: &str) -> Result<(), String> {
    let mut batch = Batch::new(conn, sql);
    while let Some(mut stmt) = batch.next().map_err(|e| e.to_string())? {
        let text = stmt.expanded_sql().unwrap_or_default();
        if let Some(keyword) = transaction_keyword(&text) {
            return Err(format!(
                "transaction control statement {keyword} is not allowed in a migration"
            ));
        }
        let mut rows = stmt.query([]).map_err(|e| e.to_string())?;
        while rows.next().map_err(|e| e.to_string())?.is_some() {}
    }
    Ok(())
}

/// The transaction keyword a statement starts with, if any.
fn transaction_keyword(sql: &str) -> Option<&'static str> {
    let word: String = skip_comments(sql)
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    TRANSACTION_KEYWORDS
        .into_iter()
        .find(|k| k.eq_ignore_ascii_case(&word))
}

/// Strip leading whitespace, `--` line comments and `/* */` block comments.
fn skip_comments(mut sql: &str) -> &str {
    loop {
        sql = sql.trim_start();
        if let Some(rest) = sql.strip_prefix("--") {
            sql = rest.split_once('\n').map_or("", |(_, after)| after);
        } else if let Some(rest) = sql.strip_prefix("/*") {
            sql = rest.split_once("*/").map_or("", |(_, after)| after);
        } else {
            return sql;
        }
    }
}
