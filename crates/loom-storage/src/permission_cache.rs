// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Permission Cache: remembered "allow always" decisions, persisted to a
//! single JSON file in the user config directory — not the project-scoped
//! Plan Store/Audit Log WAL, since the cache is process-local and spans
//! projects.

use loom_core::CacheKey;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PermissionCacheError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedKeys {
    #[serde(default)]
    keys: Vec<CacheKey>,
}

/// Point-in-time lookups over a set of remembered permission keys. Loaded
/// once at startup; `remember` both mutates the in-memory set and
/// schedules nothing implicitly — call `save()` to flush explicitly.
pub struct PermissionCache {
    path: PathBuf,
    keys: HashSet<CacheKey>,
}

impl PermissionCache {
    /// Load the cache from `path`, treating a missing file as empty.
    pub fn load(path: PathBuf) -> Result<Self, PermissionCacheError> {
        let keys = if path.exists() {
            let data = fs::read_to_string(&path)?;
            let persisted: PersistedKeys = serde_json::from_str(&data)?;
            persisted.keys.into_iter().collect()
        } else {
            HashSet::new()
        };
        Ok(Self { path, keys })
    }

    /// Remember `key` as "allow always" and persist immediately.
    pub fn remember(&mut self, key: CacheKey) -> Result<(), PermissionCacheError> {
        self.keys.insert(key);
        self.save()
    }

    pub fn is_allowed_always(&self, key: &CacheKey) -> bool {
        self.keys.contains(key)
    }

    /// Atomically rewrite the backing file (write-temp-then-rename).
    pub fn save(&self) -> Result<(), PermissionCacheError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let persisted = PersistedKeys {
            keys: self.keys.iter().cloned().collect(),
        };
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, serde_json::to_vec_pretty(&persisted)?)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

/// Default location: `<config_dir>/permissions.json`.
pub fn default_path(config_dir: &Path) -> PathBuf {
    config_dir.join("permissions.json")
}

#[cfg(test)]
#[path = "permission_cache_tests.rs"]
mod tests;
