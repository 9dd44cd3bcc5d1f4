use std::path::{Path, PathBuf};

use brokerdesk_common::{Error, Result};
use tracing::{debug, info};

use crate::model::AppConfig;

pub const ENV_DATABASE: &str = "BROKERDESK_DATABASE";
pub const ENV_MIGRATIONS_DIR: &str = "BROKERDESK_MIGRATIONS_DIR";
pub const ENV_LEDGER_TABLE: &str = "BROKERDESK_LEDGER_TABLE";
pub const ENV_LOG_LEVEL: &str = "BROKERDESK_LOG_LEVEL";

/// Resolves and reads the config file, then layers environment overrides on top.
///
/// Precedence, lowest first: built-in defaults, the first config file found,
/// `BROKERDESK_*` environment variables (including those from `.env`).
/// Command-line flags are applied by the caller afterwards.
pub struct ConfigLoader {
    candidates: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Search `./brokerdesk.{yml,yaml,toml}` and then `~/.brokerdesk/config.yml`.
    pub fn new() -> Self {
        let mut candidates = vec![
            PathBuf::from("brokerdesk.yml"),
            PathBuf::from("brokerdesk.yaml"),
            PathBuf::from("brokerdesk.toml"),
        ];
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".brokerdesk").join("config.yml"));
        }
        Self { candidates }
    }

    pub fn with_candidates(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    /// Load configuration using the process environment.
    pub fn load(&self, explicit: Option<&Path>) -> Result<AppConfig> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("loaded environment from {}", path.display());
        }
        self.load_with_env(explicit, |key| std::env::var(key).ok())
    }

    /// Load configuration with a caller-supplied environment lookup.
    pub fn load_with_env<F>(&self, explicit: Option<&Path>, env: F) -> Result<AppConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match self.resolve_path(explicit)? {
            Some(path) => {
                let config = load_file(&path)?;
                info!("config loaded from {}", path.display());
                config
            }
            None => {
                debug!("no config file found, using defaults");
                AppConfig::default()
            }
        };
        apply_env_overrides(&mut config, env);
        Ok(config)
    }

    /// An explicit path must exist; otherwise the first existing candidate wins.
    pub fn resolve_path(&self, explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(Error::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            return Ok(Some(path.to_path_buf()));
        }
        Ok(self.candidates.iter().find(|p| p.is_file()).cloned())
    }
}

/// Parse a config file, choosing the format from its extension.
pub fn load_file(path: &Path) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("failed to read {}: {e}", path.display()))
    })?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "yml" | "yaml" => serde_yaml::from_str(&contents)
            .map_err(|e| Error::Config(format!("YAML parse error in {}: {e}", path.display()))),
        "toml" => toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("TOML parse error in {}: {e}", path.display()))),
        other => Err(Error::Config(format!(
            "unsupported config extension: {other}"
        ))),
    }
}

fn apply_env_overrides<F>(config: &mut AppConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(path) = non_empty(ENV_DATABASE) {
        config.database.path = PathBuf::from(path);
    }
    if let Some(dir) = non_empty(ENV_MIGRATIONS_DIR) {
        config.migrations.dir = PathBuf::from(dir);
    }
    if let Some(table) = non_empty(ENV_LEDGER_TABLE) {
        config.migrations.ledger_table = table;
    }
    if let Some(level) = non_empty(ENV_LOG_LEVEL) {
        config.log_level = Some(level);
    }
}
