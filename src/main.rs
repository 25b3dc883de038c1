//! `trellis`: operator CLI for the hierarchy cache.

mod cli;
mod commands;
mod error;

use crate::cli::{Cli, Command, MappingCommand};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use serde::Serialize;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use trellis_cache::{CacheStore, Database, Maintainer};
use trellis_config::Config;

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).or_raise(|| ErrorKind::Output)?;
    println!("{json}");
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let db = Database::connect(&config.database.path).await.or_raise(|| ErrorKind::Database)?;
    if cli.dry_run {
        tracing::info!("Dry run: the cache will not be modified");
    }
    let store = CacheStore::from(&db).with_dry_run(cli.dry_run);
    let result = match cli.command {
        Command::Invalidate(args) => print_json(&commands::invalidate(&store, args).await?),
        Command::Cleanup(args) => {
            let policy = commands::cleanup_policy(&config, &args);
            let maintainer = Maintainer::from(&db).with_dry_run(cli.dry_run);
            print_json(&commands::cleanup(&maintainer, &policy).await?)
        },
        Command::Mapping {
            command:
                MappingCommand::Add {
                    route_type,
                    route_subtype,
                    folder_id,
                },
        } => print_json(&commands::add_mapping(&store, &route_type, &route_subtype, &folder_id).await?),
        Command::Resolve(args) => print_json(&commands::resolve(&config, &store, args).await?),
    };
    db.close().await;
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        },
    }
}
