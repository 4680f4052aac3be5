//! # libris
//!
//! Front-desk command line for the Libris lending engine.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         libris <command>                                │
//! │                                                                         │
//! │  Settings::load ──► telemetry::init ──► Database::new (migrations)     │
//! │                                               │                         │
//! │                                               ▼                         │
//! │                      commands::execute ◄── LendingService + SystemClock │
//! │                           │                                             │
//! │             Ok ──► JSON on stdout, exit 0                               │
//! │             Err ─► ApiError JSON on stderr, exit by error code          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cli;
mod commands;
mod config;
mod error;
mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

use libris_core::SystemClock;
use libris_db::{Database, DbConfig};

use crate::cli::Cli;
use crate::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings =
        Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    telemetry::init(&settings.log_level)?;

    let policies = settings.policy_table()?;
    for (class, profile) in policies.iter() {
        debug!(%class, ?profile, "Policy profile");
    }

    let db = Database::new(DbConfig::new(&settings.database_path))
        .await
        .with_context(|| {
            format!(
                "Failed to open database at {}",
                settings.database_path.display()
            )
        })?;
    info!(path = %settings.database_path.display(), "Database ready");

    let lending = db.lending(policies, Arc::new(SystemClock));
    let result = commands::execute(cli.command, &db, &lending).await;
    db.close().await;

    match result {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", serde_json::to_string_pretty(&err)?);
            std::process::exit(err.code.exit_status());
        }
    }
}
