use super::*;
use std::path::Path;

#[test]
fn worktree_path_sanitizes_branch_and_derives_sibling_dir() {
    let adapter = GitWorktreeAdapter::new();
    let path = adapter.worktree_path(Path::new("/home/user/myrepo"), "plan/2026-01-01-auth");
    assert_eq!(
        path,
        Path::new("/home/user/myrepo.worktrees/plan-2026-01-01-auth")
    );
}

#[test]
fn worktree_path_is_deterministic() {
    let adapter = GitWorktreeAdapter::new();
    let a = adapter.worktree_path(Path::new("/repo"), "feature-x");
    let b = adapter.worktree_path(Path::new("/repo"), "feature-x");
    assert_eq!(a, b);
}
