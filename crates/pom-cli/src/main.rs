use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;

use pom_cli::commands::{self, export, record, status};
use pom_cli::{Cli, Commands, Config, logging};
use pom_store::Ledger;

/// Open the ledger, creating the data directory if needed.
fn open_ledger(config: &Config) -> Result<Ledger> {
    Ledger::open(config.ledger_path())
        .with_context(|| format!("failed to open ledger {}", config.ledger_path().display()))
}

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = load_config(cli.config.as_deref())?;
    let _log_guard = logging::init(cli.verbose, &config.log_dir(), config.log_retention_days());

    let mut ledger = open_ledger(&config)?;
    let now = Local::now().naive_local();
    let mut stdout = io::stdout().lock();

    let result = match command {
        Commands::Start { task, minutes } => {
            record::start(&mut stdout, &mut ledger, &config, task, *minutes, now)
        }
        Commands::Pause {
            reason,
            seconds,
            extend,
        } => record::pause(&mut stdout, &mut ledger, reason, *seconds, *extend, now),
        Commands::Stop { reason } => record::stop(&mut stdout, &mut ledger, &config, reason, now),
        Commands::Finish => record::finish(&mut stdout, &mut ledger, &config, now),
        Commands::Status => status::run(&mut stdout, &mut ledger),
        Commands::Export(args) => export::run(&mut stdout, &mut ledger, &config, args, now.date()),
    };

    // Queued problems are shown even when the command itself failed.
    commands::report_queued_errors(&mut io::stderr().lock(), &mut ledger)?;
    result
}
