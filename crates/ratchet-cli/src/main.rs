mod banner;
mod commands;
mod connect;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ratchet_config::{AppConfig, ConfigLoader, Driver};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "ratchet",
    version,
    about = "Move a database forward or backward through an ordered list of migrations"
)]
struct Cli {
    /// Config file (YAML or TOML). Defaults to <config_dir>/ratchet/config.yml.
    #[arg(long, global = true, env = "RATCHET_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

/// Flags that take precedence over the config file and `RATCHET_*` variables.
#[derive(Args, Debug, Default)]
struct Overrides {
    /// Migration YAML file.
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    /// SQLite path or PostgreSQL connection string.
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Database driver: sqlite or postgres.
    #[arg(long, global = true)]
    driver: Option<Driver>,

    /// PostgreSQL schema holding the version table.
    #[arg(long, global = true)]
    schema: Option<String>,

    /// Name of the version table.
    #[arg(long, global = true)]
    version_table: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run migrations up or down to the target version.
    Migrate {
        /// Target version, 0 to revert everything.
        #[arg(long)]
        target: Option<String>,

        /// Print what would run without touching the schema.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the stored version.
    Version,
    /// Show the stored, target, and latest versions.
    Status {
        #[arg(long)]
        target: Option<String>,

        #[arg(long)]
        json: bool,
    },
    /// List the migrations a run to the target would execute.
    Plan {
        #[arg(long)]
        target: Option<String>,

        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let loader = match &cli.config {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load().context("failed to load configuration")?;
    apply_overrides(&mut config, &cli.overrides);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Migrate { target, dry_run } => {
            set_target(&mut config, target);
            commands::migrate(&config, dry_run, &mut out)?;
        }
        Command::Version => commands::version(&config, &mut out)?,
        Command::Status { target, json } => {
            set_target(&mut config, target);
            commands::status(&config, json, &mut out)?;
        }
        Command::Plan { target, json } => {
            set_target(&mut config, target);
            commands::plan(&config, json, &mut out)?;
        }
    }

    out.flush()?;
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn apply_overrides(config: &mut AppConfig, overrides: &Overrides) {
    if let Some(file) = &overrides.file {
        config.migrations.file = Some(file.clone());
    }
    if let Some(url) = &overrides.database_url {
        config.database.url = Some(url.clone());
    }
    if let Some(driver) = overrides.driver {
        config.database.driver = driver;
    }
    if let Some(schema) = &overrides.schema {
        config.database.schema = Some(schema.clone());
    }
    if let Some(table) = &overrides.version_table {
        config.database.version_table = Some(table.clone());
    }
}

fn set_target(config: &mut AppConfig, target: Option<String>) {
    if target.is_some() {
        config.target = target;
    }
}
