//! MemoCloud command-line entry point.
//!
//! # Responsibility
//! - Wire configuration, logging, the local cache and the WebDAV store into
//!   one memo repository per invocation.
//! - Keep stdout for results and stderr for warnings and errors.

mod cli;
mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::info;

use cli::Cli;
use commands::CliResult;
use memocloud_core::{
    default_log_level, init_logging, open_db, AppConfig, MemoRepository, SqliteLocalCache,
    WebDavStore,
};

const APP_DIR_NAME: &str = "memocloud";
const CACHE_DB_FILE: &str = "cache.sqlite3";
const LOG_DIR_NAME: &str = "logs";

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let data_dir = app_data_dir()?;
    let log_dir = cli.log_dir.unwrap_or_else(|| data_dir.join(LOG_DIR_NAME));
    let log_level = cli
        .log_level
        .unwrap_or_else(|| default_log_level().to_string());
    // Logging is best-effort; memo commands still run without it.
    if let Err(err) = init_logging(&log_level, &log_dir) {
        eprintln!("warning: logging disabled: {err}");
    }

    let cache_path = cli
        .cache_db
        .unwrap_or_else(|| data_dir.join(CACHE_DB_FILE));
    let conn = open_db(&cache_path)?;
    let cache = SqliteLocalCache::try_new(&conn)?;
    let config = AppConfig::from_env()?.with_cached_remote_credentials(&cache)?;
    let remote = WebDavStore::new(&config.remote)?;
    info!(
        "event=cli_start module=cli status=ok remote={} cache={}",
        remote.base_url(),
        cache_path.display()
    );

    let mut repo = MemoRepository::new(remote, cache, config);
    commands::execute(&mut repo, cli.command)
}

fn app_data_dir() -> CliResult<PathBuf> {
    let base = match dirs::data_dir() {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    Ok(base.join(APP_DIR_NAME))
}
