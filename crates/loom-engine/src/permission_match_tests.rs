// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn detects_allow_prompt_with_backticked_command() {
    let pane = "Some output\nDo you want to allow `rm -rf /opt/tmp`?\n(y/n)";
    let found = detect_permission_prompt(pane).unwrap();
    assert_eq!(found.pattern, "rm -rf /opt/tmp");
    assert!(found.description.contains("rm -rf /opt/tmp"));
}

#[test]
fn falls_back_to_full_description_without_delimiters() {
    let pane = "Allow writing to disk?\n";
    let found = detect_permission_prompt(pane).unwrap();
    assert_eq!(found.pattern, "writing to disk");
}

#[test]
fn no_prompt_returns_none() {
    let pane = "Implementing task 1...\nWriting file src/lib.rs\n";
    assert!(detect_permission_prompt(pane).is_none());
}

#[test]
fn idle_prompt_detects_bare_caret() {
    assert!(detect_idle_prompt("done.\n>\n"));
    assert!(!detect_idle_prompt("still working on it\n"));
}
