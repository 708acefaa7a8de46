//! pagewatch CLI
//!
//! Runs one monitoring batch, validates configuration, or inspects the
//! stored snapshot.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use pagewatch::{
    error::Result,
    pipeline::{self, MonitorPaths, RunOptions, setup},
};

/// pagewatch - web page change monitor
#[derive(Parser, Debug)]
#[command(
    name = "pagewatch",
    version,
    about = "Watches pages for relevant content changes and alerts a webhook"
)]
struct Cli {
    /// Directory that relative file paths are resolved against
    /// [default: the executable's directory]
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// JSON file listing the items to monitor
    #[arg(long, default_value = setup::DEFAULT_REGISTRY_FILE)]
    urls_json: PathBuf,

    /// KEY=VALUE file with webhook credentials
    #[arg(long, default_value = setup::DEFAULT_CREDENTIALS_FILE)]
    discord_file: PathBuf,

    /// JSON file holding the last fingerprint per item
    #[arg(long, default_value = setup::DEFAULT_SNAPSHOT_FILE)]
    snapshot_file: PathBuf,

    /// Optional TOML settings file
    #[arg(long, default_value = setup::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Do not log [OK] lines for unchanged items
    #[arg(long)]
    quiet_ok: bool,

    /// Render with a visible browser window
    #[arg(long)]
    no_headless: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Check every item once and alert on changes (default)
    Run,

    /// Validate configuration files
    Validate,

    /// Show current snapshot info
    Info,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    fn filter(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Initialize logging; `RUST_LOG` still takes precedence.
fn init_logging(level: LogLevel) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.filter()))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let paths = MonitorPaths {
        registry: cli.urls_json,
        credentials: cli.discord_file,
        snapshot: cli.snapshot_file,
        config: cli.config,
    }
    .resolved(&cli.base_dir.unwrap_or_else(setup::executable_dir));

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            log::info!("pagewatch starting...");
            let options = RunOptions {
                quiet_ok: cli.quiet_ok,
                headless: !cli.no_headless,
            };
            pipeline::run_monitor(&paths, options).await?;
        }

        Command::Validate => {
            pipeline::run_validate(&paths)?;
        }

        Command::Info => {
            pipeline::run_info(&paths.registry, &paths.snapshot).await?;
        }
    }

    log::info!("Done!");

    Ok(())
}
