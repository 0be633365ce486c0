use super::*;
use crate::worktree::NoOpWorktreeAdapter;

#[test]
fn generate_pr_body_includes_description_and_waves() {
    let adapter = NoOpWorktreeAdapter;
    let body = adapter.generate_pr_body(
        "Add authentication",
        &["Wave 1: scaffolding".to_string(), "Wave 2: tests".to_string()],
    );
    assert!(body.contains("Add authentication"));
    assert!(body.contains("Wave 1: scaffolding"));
    assert!(body.contains("Wave 2: tests"));
}

#[test]
fn generate_pr_body_omits_waves_section_when_empty() {
    let adapter = NoOpWorktreeAdapter;
    let body = adapter.generate_pr_body("Add authentication", &[]);
    assert!(body.contains("Add authentication"));
    assert!(!body.contains("## Waves"));
}
