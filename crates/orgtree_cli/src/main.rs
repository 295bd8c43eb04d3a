//! `orgtree` command-line entry point.
//!
//! # Responsibility
//! - Resolve settings (defaults, `ORGTREE_*` env, flags) and start logging.
//! - Open the configured store and dispatch one command.
//! - Report failures as `error=<code> message=<text>` with a class-based
//!   exit code.

mod args;
mod commands;
mod error;

use args::Cli;
use clap::Parser;
use commands::execute_command;
use error::{CliError, CliResult};
use log::{error, info};
use orgtree_core::db::open_db;
use orgtree_core::{init_logging_from_settings, Settings};

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        if err.exit_code() != error::EXIT_REJECTED {
            error!(
                "event=cli_exit module=cli status=error error_code={}",
                err.code()
            );
        }
        eprintln!("error={} message={}", err.code(), err);
        std::process::exit(err.exit_code());
    }
}

fn run(cli: &Cli) -> CliResult<()> {
    let settings = Settings::load()
        .map_err(|err| CliError::startup("config", err.to_string()))?
        .with_overrides(cli.db.clone(), cli.log_level.clone(), cli.log_dir.clone());
    init_logging_from_settings(&settings).map_err(|err| CliError::startup("logging", err))?;

    let conn = open_db(&settings.db_path)
        .map_err(|err| CliError::startup(err.code(), err.to_string()))?;
    info!(
        "event=cli_start module=cli status=ok version={} db_path={}",
        orgtree_core::core_version(),
        settings.db_path.display()
    );
    execute_command(cli, &conn)
}
