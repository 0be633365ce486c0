// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pane-content pattern matching for the metadata tick: detecting a
//! permission prompt and detecting an idle user-input prompt. Pure text
//! parsing, no I/O.

use loom_core::PermissionPromptMatch;
use regex::Regex;
use std::sync::OnceLock;

#[allow(clippy::expect_used)]
fn prompt_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*(?:Do you want to (?:allow|proceed with)|Allow)\s+(.+?)\??\s*$")
            .expect("static permission prompt regex is valid")
    })
}

#[allow(clippy::expect_used)]
fn pattern_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[`(]([^`)]+)[`)]").expect("static pattern-extraction regex is valid"))
}

#[allow(clippy::expect_used)]
fn idle_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*>\s*$").expect("static idle-prompt regex is valid"))
}

/// Scan pane output for a permission prompt. Returns the full description
/// plus a narrower `pattern` (e.g. the command or path named inside
/// backticks/parens) used to key the Permission Cache.
pub fn detect_permission_prompt(pane_content: &str) -> Option<PermissionPromptMatch> {
    let description = prompt_regex()
        .captures(pane_content)?
        .get(1)?
        .as_str()
        .trim()
        .to_string();
    let pattern = pattern_regex()
        .captures(&description)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| description.clone());
    Some(PermissionPromptMatch { pattern, description })
}

/// True when the pane is sitting at an idle user-input prompt with no
/// pending question.
pub fn detect_idle_prompt(pane_content: &str) -> bool {
    idle_regex().is_match(pane_content)
}

#[cfg(test)]
#[path = "permission_match_tests.rs"]
mod tests;
