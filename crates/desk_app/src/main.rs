mod cli;
mod commands;
mod config;
mod logging;
mod render;

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use desk_core::JobDraft;
use desk_logging::desk_error;

use cli::{Cli, Command};
use commands::Session;
use config::DeskConfig;

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => print!("{output}"),
        Err(err) => {
            desk_error!("{err:#}");
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<String> {
    let mut config = DeskConfig::load(cli.config.as_deref()).context("failed to load config")?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    let level = config
        .log_level_filter()
        .ok_or_else(|| anyhow!("unknown log level {:?}", config.log_level))?;
    logging::initialize(config.log_destination, level);

    let mut session = Session::start(&config)?;
    match cli.command {
        Command::Ask {
            text,
            kind,
            ticker,
            no_wait,
            timeout_secs,
        } => session.ask(
            JobDraft::new(text, kind, ticker),
            !no_wait,
            Duration::from_secs(timeout_secs),
        ),
        Command::History { page, search, sort } => session.history(page, search, sort),
        Command::Show { id } => session.show(id),
        Command::Delete { id, yes } => session.delete(id, yes),
        Command::Compare { tickers, period } => session.compare(tickers, period),
    }
}
