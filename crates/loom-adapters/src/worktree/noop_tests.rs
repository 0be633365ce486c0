use super::*;
use std::path::Path;

#[tokio::test]
async fn ensure_worktree_returns_a_path_without_touching_disk() {
    let adapter = NoOpWorktreeAdapter;
    let path = adapter
        .ensure_worktree(Path::new("/repo"), "feature-x")
        .await
        .unwrap();
    assert_eq!(path, Path::new("/repo/feature-x"));
}

#[tokio::test]
async fn is_branch_checked_out_is_always_false() {
    let adapter = NoOpWorktreeAdapter;
    assert!(!adapter
        .is_branch_checked_out(Path::new("/repo"), "feature-x")
        .await
        .unwrap());
}

#[tokio::test]
async fn create_pr_returns_a_stub_url() {
    let adapter = NoOpWorktreeAdapter;
    let pr = adapter
        .create_pr(Path::new("/repo/feature-x"), "title", "body", "commit")
        .await
        .unwrap();
    assert_eq!(pr.url, "noop://pr");
}
