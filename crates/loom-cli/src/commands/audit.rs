// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `loom audit` — query the audit log from outside a running orchestrator.

use anyhow::{Context, Result};
use clap::Args;
use loom_core::{AuditFilter, AuditKind};
use loom_storage::{AuditLog, Store};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

use crate::commands::init::loom_dir;
use crate::output::{format_time_ago, OutputFormat};
use crate::table::{Column, Table};

#[derive(Args)]
pub struct AuditArgs {
    /// Project root to read `.loom/store` from (default: current directory)
    #[arg(short = 'C', long = "directory", default_value = ".")]
    pub directory: PathBuf,

    /// Restrict to a project name
    #[arg(long)]
    pub project: Option<String>,

    /// Restrict to one or more audit kinds (repeatable), e.g. `plan_transition`
    #[arg(long = "kind")]
    pub kinds: Vec<String>,

    /// Only rows at or after this many milliseconds since the epoch
    #[arg(long)]
    pub since_ms: Option<u64>,

    /// Only rows at or before this many milliseconds since the epoch
    #[arg(long)]
    pub until_ms: Option<u64>,

    /// Maximum number of rows to show (newest first)
    #[arg(long, short = 'n', default_value = "50")]
    pub limit: usize,

    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t)]
    pub output: OutputFormat,
}

pub fn run(args: AuditArgs) -> Result<()> {
    let root = std::fs::canonicalize(&args.directory)
        .with_context(|| format!("cannot resolve {}", args.directory.display()))?;
    let store_dir = loom_dir(&root).join("store");
    if !store_dir.exists() {
        anyhow::bail!(
            "no loom state found at {} — run `loom init` first",
            store_dir.display()
        );
    }

    let store = Store::open(&store_dir)
        .with_context(|| format!("failed to open store at {}", store_dir.display()))?;
    let audit = AuditLog::new(Arc::new(Mutex::new(store)));

    let mut kinds = Vec::with_capacity(args.kinds.len());
    for raw in &args.kinds {
        kinds.push(parse_kind(raw)?);
    }

    let filter = AuditFilter {
        project: args.project.clone(),
        kinds,
        since_ms: args.since_ms,
        until_ms: args.until_ms,
        limit: Some(args.limit),
    };

    let rows = audit.query(&filter);

    match args.output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("no audit events found");
                return Ok(());
            }
            let mut table = Table::new(vec![
                Column::left("AGE"),
                Column::left("LEVEL"),
                Column::left("KIND"),
                Column::left("PLAN"),
                Column::left("MESSAGE").with_max(80),
            ]);
            for row in &rows {
                table.row(vec![
                    format_time_ago(row.timestamp_ms),
                    format!("{:?}", row.level).to_lowercase(),
                    row.kind.to_string(),
                    row.plan_file.as_ref().map(|p| p.as_str().to_string()).unwrap_or_default(),
                    row.message.clone(),
                ]);
            }
            table.render(&mut std::io::stdout());
        }
    }

    Ok(())
}

fn parse_kind(raw: &str) -> Result<AuditKind> {
    // `AuditKind` serializes as snake_case; accept the same spelling from
    // the CLI rather than introducing a second parser.
    let json = format!("\"{raw}\"");
    serde_json::from_str(&json).with_context(|| format!("unknown audit kind: {raw}"))
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
