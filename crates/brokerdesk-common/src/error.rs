use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Bad operator input: missing migrations directory, invalid table name,
    /// unreadable config file.
    #[error("configuration error: {0}")]
    Config(String),

    /// The database could not be reached or the ledger could not be prepared.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),

    /// A single migration script failed and was rolled back.
    #[error("migration {filename} failed: {message}")]
    Migration { filename: String, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short machine-friendly name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "configuration",
            Error::Infrastructure(_) => "infrastructure",
            Error::Migration { .. } => "migration",
            Error::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn error_display_includes_context() {
        let e = Error::Config("migrations directory not found: ./db".into());
        assert_eq!(
            e.to_string(),
            "configuration error: migrations directory not found: ./db"
        );

        let e = Error::Infrastructure("connection refused".into());
        assert_eq!(e.to_string(), "infrastructure error: connection refused");

        let e = Error::Migration {
            filename: "0002_clients.sql".into(),
            message: "near \"CREAT\": syntax error".into(),
        };
        assert_eq!(
            e.to_string(),
            "migration 0002_clients.sql failed: near \"CREAT\": syntax error"
        );
    }

    #[test]
    fn kind_names_error_class() {
        assert_eq!(Error::Config(String::new()).kind(), "configuration");
        assert_eq!(Error::Infrastructure(String::new()).kind(), "infrastructure");
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(Error::from(io).kind(), "io");
    }
}
