mod api;
mod escape;
mod fault;
mod render;
mod runner;

use anyhow::{anyhow, Context as _, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

use crate::api::TelegramApi;
use tether_config as config;
use tether_store::{paths, Store};

#[derive(Debug, Parser)]
#[command(name = "tether-bot", version, about = "tether Telegram bot")]
struct Cli {
    #[arg(long)]
    db_path: Option<PathBuf>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let app_config = config::load(cli.config).with_context(|| "load config")?;
    let token = app_config
        .telegram
        .token
        .clone()
        .ok_or_else(|| anyhow!("no telegram token configured: set [telegram] token in config"))?;

    let db_path = paths::resolve_db_path(cli.db_path).with_context(|| "resolve database path")?;
    debug!(path = %db_path.display(), "database path resolved");

    let store = Store::open(&db_path)
        .with_context(|| format!("open database {}", db_path.display()))?;
    store.migrate().with_context(|| "run migrations")?;

    let mut messenger = TelegramApi::new(
        &app_config.telegram.api_url,
        &token,
        app_config.telegram.poll_timeout_secs,
    )
    .with_context(|| "build telegram client")?;

    runner::run(&store, &app_config, &mut messenger).with_context(|| "bot loop")
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
