use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use evt_cli::commands::{events, participants, race, register, results, validate};
use evt_cli::{Cli, Commands, Config, ParticipantsAction, ResultsAction};
use evt_core::EventId;

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn runtime() -> Result<Runtime> {
    Runtime::new().context("failed to initialize tokio runtime")
}

const fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[expect(
    clippy::too_many_lines,
    reason = "CLI command dispatch is inherently verbose"
)]
fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let mut stdout = std::io::stdout();

    let Some(command) = cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Validate {
            form,
            restrictions,
            json,
        } => {
            // Offline: no config or network needed
            let valid = validate::run(
                &mut stdout,
                &form.to_form(),
                &restrictions.to_restrictions(),
                json,
            )?;
            return Ok(exit_code(valid));
        }
        Commands::Register { event, form } => {
            let config = load_config(cli.config.as_deref())?;
            let event = config.event(event.as_deref())?;
            let client = config.client()?;
            let accepted =
                runtime()?.block_on(register::run(&mut stdout, &client, event, &form.to_form()))?;
            return Ok(exit_code(accepted));
        }
        Commands::Events { json } => {
            let config = load_config(cli.config.as_deref())?;
            let client = config.client()?;
            runtime()?.block_on(events::run(&mut stdout, &client, json))?;
        }
        Commands::Participants(action) => {
            let config = load_config(cli.config.as_deref())?;
            let client = config.client()?;
            let rt = runtime()?;
            match action {
                ParticipantsAction::List { event, json } => {
                    let folder = config.event(event.as_deref())?;
                    rt.block_on(participants::list(&mut stdout, &client, folder, json))?;
                }
                ParticipantsAction::Delete { event, id } => {
                    let folder = config.event(event.as_deref())?;
                    rt.block_on(participants::delete(&mut stdout, &client, folder, &id))?;
                }
                ParticipantsAction::Update { event, id, changes } => {
                    let event = config.event(event.as_deref())?;
                    let updated = rt.block_on(participants::update(
                        &mut stdout,
                        &client,
                        event,
                        &id,
                        &changes,
                    ))?;
                    return Ok(exit_code(updated));
                }
            }
        }
        Commands::Results(action) => {
            let config = load_config(cli.config.as_deref())?;
            let client = config.client()?;
            let rt = runtime()?;
            match action {
                ResultsAction::List { event, json } => {
                    let event = EventId::new(config.event(event.as_deref())?)?;
                    rt.block_on(results::list(&mut stdout, &client, &event, &Local, json))?;
                }
                ResultsAction::Export {
                    event,
                    group,
                    format,
                    output,
                } => {
                    let event = EventId::new(config.event(event.as_deref())?)?;
                    rt.block_on(results::export(
                        &mut stdout,
                        &client,
                        &event,
                        &Local,
                        &group,
                        format,
                        output.as_deref(),
                    ))?;
                }
                ResultsAction::DeleteGroup { event, group } => {
                    let event = EventId::new(config.event(event.as_deref())?)?;
                    rt.block_on(results::delete_group(
                        &mut stdout,
                        &client,
                        &event,
                        &Local,
                        &group,
                    ))?;
                }
            }
        }
        Commands::Race { event } => {
            let config = load_config(cli.config.as_deref())?;
            let event = EventId::new(config.event(event.as_deref())?)?;
            let client = config.client()?;
            let mut console = race::RaceConsole::new(event, client);
            runtime()?.block_on(race::run(&mut console))?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
