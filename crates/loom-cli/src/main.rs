// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! loom — a concurrent agent-plan orchestrator.
//!
//! `loom <path>` launches the orchestrator loop against a working
//! directory; `loom init` scaffolds a project; `loom audit` queries the
//! audit log from outside a running process.

mod color;
mod commands;
mod output;
mod table;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{audit, init, run};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "loom",
    version,
    about = "Drive concurrent AI coding agents across a portfolio of plans"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Working directory to launch the orchestrator against
    #[arg(default_value = ".")]
    path: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold `.loom/` (signal directory, durable state) in a project
    Init(init::InitArgs),
    /// Query the audit log from outside a running process
    Audit(audit::AuditArgs),
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Init(args)) => init::run(args),
        Some(Commands::Audit(args)) => audit::run(args),
        None => run::run(cli.path).await,
    }
}
