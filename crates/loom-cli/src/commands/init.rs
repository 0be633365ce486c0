// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `loom init` — scaffold `.loom/` (signal directory, durable state
//! directory) and a default `loom.toml` in a project.

use anyhow::{Context, Result};
use clap::Args;
use loom_engine::Config;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

pub fn run(args: InitArgs) -> Result<()> {
    std::fs::create_dir_all(&args.path)
        .with_context(|| format!("cannot create {}", args.path.display()))?;
    let root = std::fs::canonicalize(&args.path)
        .with_context(|| format!("cannot resolve {}", args.path.display()))?;

    let loom_dir = root.join(".loom");
    std::fs::create_dir_all(loom_dir.join(".signals").join("rejected"))
        .context("failed to create .loom/.signals")?;
    std::fs::create_dir_all(loom_dir.join("store")).context("failed to create .loom/store")?;

    let config = Config::default();
    let config_path = root.join("loom.toml");
    if config_path.exists() {
        println!("{} already exists, leaving it untouched", config_path.display());
    } else {
        std::fs::write(&config_path, render_config(&config))
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        println!("wrote {}", config_path.display());
    }

    let plans_dir = root.join(&config.plans_dir);
    std::fs::create_dir_all(&plans_dir)
        .with_context(|| format!("failed to create {}", plans_dir.display()))?;

    println!("initialized loom project at {}", root.display());
    Ok(())
}

fn render_config(config: &Config) -> String {
    format!(
        "# Loom orchestrator configuration.\n\
         program = \"{}\"\n\
         plans_dir = \"{}\"\n\
         metadata_tick_ms = {}\n",
        config.program, config.plans_dir, config.metadata_tick_ms
    )
}

/// `<repo_root>/.loom`, the project's signal/state directory.
pub fn loom_dir(repo_root: &Path) -> PathBuf {
    repo_root.join(".loom")
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
