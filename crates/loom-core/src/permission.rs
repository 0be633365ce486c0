// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Permission cache key. The cache itself (`Remember`, `IsAllowedAlways`,
//! `Save`) is implemented in `loom-storage::permission_cache`; this module
//! only defines how a key is derived.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A remembered "allow always" decision. `pattern` is the primary
/// discriminator (e.g. a glob like `/opt/*`); `description_digest` guards
/// against two different prompts sharing the same pattern by coincidence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub pattern: String,
    pub description_digest: u64,
}

impl CacheKey {
    pub fn new(pattern: impl Into<String>, description: &str) -> Self {
        Self {
            pattern: pattern.into(),
            description_digest: digest(description),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:x}", self.pattern, self.description_digest)
    }
}

fn digest(s: &str) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
#[path = "permission_tests.rs"]
mod tests;
