// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git worktree adapters: allocate/remove the per-plan worktree, push a
//! branch, and open a pull request.

mod git;
mod noop;

pub use git::GitWorktreeAdapter;
pub use noop::NoOpWorktreeAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeWorktreeAdapter, WorktreeCall};

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from worktree operations
#[derive(Debug, Error)]
pub enum WorktreeError {
    #[error("git command failed: {0}")]
    CommandFailed(String),
    #[error("branch already checked out elsewhere: {0}")]
    BranchInUse(String),
    #[error("pr creation failed: {0}")]
    PrFailed(String),
}

/// Result of `create_pr`: the URL of the opened pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrHandle {
    pub url: String,
}

/// Adapter for the git-worktree plumbing underneath a plan's isolated
/// checkout. Branch naming and worktree placement are the caller's
/// (`loom-engine::instance_supervisor`) responsibility; this trait only
/// shells out.
#[async_trait]
pub trait WorktreeAdapter: Clone + Send + Sync + 'static {
    /// Compute (without allocating) the on-disk path a worktree for
    /// `branch` would live at, relative to `repo_root`.
    fn worktree_path(&self, repo_root: &Path, branch: &str) -> PathBuf;

    /// True if `branch` is already checked out in some worktree of this
    /// repository (including the main checkout).
    async fn is_branch_checked_out(
        &self,
        repo_root: &Path,
        branch: &str,
    ) -> Result<bool, WorktreeError>;

    /// `git worktree add` the branch if its worktree doesn't already
    /// exist; idempotent. Backs `Start(first=true)`'s worktree allocation.
    async fn ensure_worktree(
        &self,
        repo_root: &Path,
        branch: &str,
    ) -> Result<PathBuf, WorktreeError>;

    /// `git worktree remove` the branch's worktree. Backs `Abort`.
    async fn remove_worktree(&self, repo_root: &Path, branch: &str) -> Result<(), WorktreeError>;

    /// Commit (if dirty) and push the worktree's branch.
    async fn push_changes(
        &self,
        worktree_path: &Path,
        message: &str,
        force: bool,
    ) -> Result<(), WorktreeError>;

    /// Open a pull request from the worktree's branch.
    async fn create_pr(
        &self,
        worktree_path: &Path,
        title: &str,
        body: &str,
        commit_msg: &str,
    ) -> Result<PrHandle, WorktreeError>;

    /// Render the markdown body for `create_pr` from plan context. Pure.
    fn generate_pr_body(&self, plan_description: &str, wave_summaries: &[String]) -> String {
        let mut body = format!("{}\n", plan_description);
        if !wave_summaries.is_empty() {
            body.push_str("\n## Waves\n");
            for summary in wave_summaries {
                body.push_str(&format!("- {}\n", summary));
            }
        }
        body
    }

    /// Discard local changes on `branch` and reset it to the repo's
    /// default branch. Backs `StartOver`.
    async fn reset_plan_branch(&self, repo_root: &Path, branch: &str) -> Result<(), WorktreeError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
