// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op worktree adapter, for headless contexts with no git plumbing
//! available. Mirrors `session::NoOpSessionAdapter`.

use super::{PrHandle, WorktreeAdapter, WorktreeError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpWorktreeAdapter;

#[async_trait]
impl WorktreeAdapter for NoOpWorktreeAdapter {
    fn worktree_path(&self, repo_root: &Path, branch: &str) -> PathBuf {
        repo_root.join(branch)
    }

    async fn is_branch_checked_out(
        &self,
        _repo_root: &Path,
        _branch: &str,
    ) -> Result<bool, WorktreeError> {
        Ok(false)
    }

    async fn ensure_worktree(
        &self,
        repo_root: &Path,
        branch: &str,
    ) -> Result<PathBuf, WorktreeError> {
        Ok(self.worktree_path(repo_root, branch))
    }

    async fn remove_worktree(&self, _repo_root: &Path, _branch: &str) -> Result<(), WorktreeError> {
        Ok(())
    }

    async fn push_changes(
        &self,
        _worktree_path: &Path,
        _message: &str,
        _force: bool,
    ) -> Result<(), WorktreeError> {
        Ok(())
    }

    async fn create_pr(
        &self,
        _worktree_path: &Path,
        _title: &str,
        _body: &str,
        _commit_msg: &str,
    ) -> Result<PrHandle, WorktreeError> {
        Ok(PrHandle {
            url: "noop://pr".to_string(),
        })
    }

    async fn reset_plan_branch(
        &self,
        _repo_root: &Path,
        _branch: &str,
    ) -> Result<(), WorktreeError> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "noop_tests.rs"]
mod tests;
