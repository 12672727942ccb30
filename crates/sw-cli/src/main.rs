use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use sw_db::{Database, Handle};
use tracing_subscriber::EnvFilter;

use sw_cli::commands::util::{parse_date, parse_datetime};
use sw_cli::commands::{groups, history, report, slices, tasks, track};
use sw_cli::{Cli, Commands, Config, GroupAction, SliceAction, TaskAction};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(Handle, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let mut handle = Handle::new();
    handle
        .open(&config.database_path)
        .context("failed to open database")?;
    Ok((handle, config))
}

fn run_command<W: Write>(
    writer: &mut W,
    db: &mut Database,
    config: &Config,
    command: &Commands,
) -> Result<()> {
    match command {
        Commands::Group(action) => match action {
            GroupAction::Add { name } => groups::add(writer, db, name)?,
            GroupAction::List { json } => groups::list(writer, db, *json)?,
            GroupAction::Rename { id, name } => groups::rename(writer, db, *id, name)?,
        },
        Commands::Task(action) => match action {
            TaskAction::Add {
                group,
                name,
                cost_code,
            } => tasks::add(writer, db, *group, name, cost_code)?,
            TaskAction::List { group, json } => tasks::list(writer, db, *group, *json)?,
            TaskAction::Show { group, task } => tasks::show(writer, db, *group, *task)?,
            TaskAction::Update {
                group,
                task,
                name,
                cost_code,
            } => tasks::update(
                writer,
                db,
                *group,
                *task,
                name.as_deref(),
                cost_code.as_deref(),
            )?,
        },
        Commands::Start { group, task } => {
            track::start(writer, db, *group, *task, config.history_limit)?;
        }
        Commands::Stop { group, task } => track::stop(writer, db, *group, *task)?,
        Commands::Active { clear } => track::active(writer, db, *clear)?,
        Commands::Slices(action) => match action {
            SliceAction::List {
                group,
                task,
                start,
                end,
                json,
            } => {
                let start = start.as_deref().map(parse_datetime).transpose()?;
                let end = end.as_deref().map(parse_datetime).transpose()?;
                slices::list(writer, db, *group, *task, start, end, *json)?;
            }
            SliceAction::Set {
                group,
                task,
                start,
                end,
            } => {
                let start = parse_datetime(start)?;
                let end = parse_datetime(end)?;
                slices::set(writer, db, *group, *task, start, end)?;
            }
            SliceAction::Remove { group, task, start } => {
                slices::remove(writer, db, *group, *task, parse_datetime(start)?)?;
            }
        },
        Commands::History => history::run(writer, db)?,
        Commands::Report {
            group,
            start,
            end,
            utc,
            json,
        } => {
            let start = start.as_deref().map(parse_date).transpose()?;
            let end = end.as_deref().map(parse_date).transpose()?;
            report::run(writer, db, *group, start, end, *utc, *json)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
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

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    let (mut handle, config) = open_database(cli.config.as_deref())?;
    {
        let _guard = handle.begin()?;
        let mut stdout = std::io::stdout().lock();
        run_command(&mut stdout, handle.database_mut()?, &config, command)?;
    }
    handle.close().context("failed to close database")?;
    Ok(())
}
