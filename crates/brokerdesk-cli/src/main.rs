use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use brokerdesk_config::{AppConfig, ConfigLoader};
use brokerdesk_db::{Database, MigrationRunner, RunEvent, new_migration};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod summary;

/// BrokerDesk schema migrator.
#[derive(Parser, Debug)]
#[command(name = "brokerdesk", author, version, about)]
struct Cli {
    /// Config file (YAML or TOML). Defaults to ./brokerdesk.yml, then ~/.brokerdesk/config.yml.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file; overrides the config file.
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Migrations directory; overrides the config file.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Log output format (logs go to stderr).
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply every pending migration, stopping at the first failure.
    Migrate,
    /// Show which migrations are applied, pending, or missing from disk.
    Status {
        /// Print the status as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Create the next numbered migration file.
    New {
        /// Short description, turned into the file name.
        description: String,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(config.log_level(), cli.log_format);

    match run(cli.command, &config) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = ConfigLoader::new()
        .load(cli.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(database) = &cli.database {
        config.database.path = database.clone();
    }
    if let Some(dir) = &cli.dir {
        config.migrations.dir = dir.clone();
    }
    Ok(config)
}

fn init_tracing(default_level: &str, format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn run(command: Commands, config: &AppConfig) -> Result<ExitCode> {
    let runner = MigrationRunner::from_config(&config.migrations)
        .context("invalid migrations configuration")?;

    match command {
        Commands::Migrate => cmd_migrate(&runner, config),
        Commands::Status { json } => cmd_status(&runner, config, json),
        Commands::New { description } => {
            let path = new_migration(runner.source(), &description)
                .context("failed to create migration")?;
            println!("Created migration: {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Open the target and confirm it answers before anything else happens.
fn connect(config: &AppConfig) -> Result<Database> {
    let db = Database::open(&config.database).context("failed to connect to database")?;
    db.ping().context("database preflight failed")?;
    info!("connected to {}", db.label());
    Ok(db)
}

fn cmd_migrate(runner: &MigrationRunner, config: &AppConfig) -> Result<ExitCode> {
    let mut db = connect(config)?;
    summary::print_header(db.label(), &runner.source().dir().display().to_string());

    let report = runner
        .run_with(db.connection_mut(), |event| match event {
            RunEvent::Discovered(files) => summary::print_discovered(files),
            RunEvent::Finished(outcome) => summary::print_outcome(outcome),
        })
        .context("migration run aborted")?;

    summary::print_run_summary(&report);
    if let Some(err) = report.error() {
        error!(kind = err.kind(), "{err}");
        eprintln!("error: {err}");
    }
    Ok(ExitCode::from(report.exit_code() as u8))
}

fn cmd_status(runner: &MigrationRunner, config: &AppConfig, json: bool) -> Result<ExitCode> {
    let db = connect(config)?;
    let status = runner
        .status(db.connection())
        .context("failed to read migration status")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&status).context("failed to serialize status")?
        );
    } else {
        summary::print_status(&status, runner.ledger().table());
    }
    Ok(ExitCode::SUCCESS)
}
