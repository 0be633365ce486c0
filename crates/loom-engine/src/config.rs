// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `loom.toml` / `~/.config/loom/config.toml` layered configuration. The
//! project file overrides the user file; both are optional.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("malformed config at {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
}

/// Resolved, defaulted configuration for one orchestrator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub program: String,
    pub plans_dir: String,
    pub metadata_tick_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            program: "claude".to_string(),
            plans_dir: "plans".to_string(),
            metadata_tick_ms: 500,
        }
    }
}

/// Mirrors `Config` with every field optional, for partial TOML files.
#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    program: Option<String>,
    plans_dir: Option<String>,
    metadata_tick_ms: Option<u64>,
}

impl PartialConfig {
    fn merge_into(self, config: &mut Config) {
        if let Some(program) = self.program {
            config.program = program;
        }
        if let Some(plans_dir) = self.plans_dir {
            config.plans_dir = plans_dir;
        }
        if let Some(ms) = self.metadata_tick_ms {
            config.metadata_tick_ms = ms;
        }
    }
}

fn load_partial(path: &Path) -> Result<Option<PartialConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let partial: PartialConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(partial))
}

/// `<config_dir>/loom/config.toml`, e.g. `~/.config/loom/config.toml`.
pub fn default_user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("loom").join("config.toml"))
}

/// Load defaults, then the user config, then `<repo_root>/loom.toml`
/// (later layers win).
pub fn load(repo_root: &Path) -> Result<Config, ConfigError> {
    let mut config = Config::default();
    if let Some(user_path) = default_user_config_path() {
        if let Some(partial) = load_partial(&user_path)? {
            partial.merge_into(&mut config);
        }
    }
    if let Some(partial) = load_partial(&repo_root.join("loom.toml"))? {
        partial.merge_into(&mut config);
    }
    Ok(config)
}

/// `<repo_root>/<plans_dir>/<plan_file>.md`, the on-disk location of a
/// plan's markdown body.
pub fn plan_markdown_path(repo_root: &Path, plans_dir: &str, plan_file: &str) -> PathBuf {
    repo_root.join(plans_dir).join(format!("{plan_file}.md"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
