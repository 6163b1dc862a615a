pub mod aggregation;
pub mod cli;
pub mod commands;
pub mod db;
pub mod models;
pub mod repository;
pub mod settings;
pub mod store;

use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use cli::{Args, Command};
use db::Database;
use repository::AggregateRepository;
use settings::Settings;

pub use models::{Consensus, ConsensusLookup, Observation};
pub use repository::{RepositoryError, SessionPolicy};
pub use store::{KeyValueStore, MemoryStore};

pub fn run() -> ExitCode {
    let args = Args::parse();

    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    log::debug!("shoppulse v{}", env!("CARGO_PKG_VERSION"));

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error: failed to start async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(dispatch(args)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(args: Args) -> Result<()> {
    if let Command::InitConfig = args.command {
        if args.settings.exists() {
            anyhow::bail!(
                "{} already exists; remove it first or edit it manually",
                args.settings.display()
            );
        }
        Settings::default().persist(&args.settings)?;
        println!("Created {} with default settings.", args.settings.display());
        return Ok(());
    }

    let settings = Settings::load(&args.settings)?;
    let db_path = args
        .database
        .clone()
        .unwrap_or_else(|| settings.database.path.clone());
    let database = Database::new(db_path).context("failed to open aggregate database")?;
    log::debug!("Aggregates stored in {}", database.path().display());
    let repository =
        AggregateRepository::new(database, settings.session.clone(), settings.display.clone());

    match args.command {
        Command::Record(record) => {
            commands::record(&repository, &settings.validation, record, Utc::now()).await?;
            println!("Observation recorded.");
        }
        Command::Consensus { location } => {
            println!("{}", commands::consensus_json(&repository, &location).await?);
        }
        Command::InitConfig => {}
    }

    Ok(())
}
